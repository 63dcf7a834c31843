//! Compile detected regions into a blur-and-overlay graph.
//!
//! For N regions the graph is:
//!
//! ```text
//! split=N[blur0]..[blur{N-1}]
//! [blur{i}]boxblur=5:1[cropped{i}]
//! [cropped{i}]crop=w+10:h+10:x:y[blurred{i}]
//! [0:v][blurred0]overlay=x:y[bg0]
//! [bg{i-1}][blurred{i}]overlay=x:y[bg{i}]     (last overlay is unlabelled)
//! ```
//!
//! Each region gets its own blurred copy of the whole frame, cropped to the
//! padded box and laid back over the source at the box origin.

use std::fmt;
use std::path::{Path, PathBuf};

use super::error::FilterGraphError;
use super::graph::{Filter, FilterGraph, Label, Stage};
use crate::models::Rect;
use crate::tools::ToolInvocation;

pub const BLUR_RADIUS: u32 = 5;
pub const BLUR_POWER: u32 = 1;
/// Added to both crop dimensions so the blur covers glyph edges.
pub const CROP_PADDING: u32 = 10;

/// Build the graph for `regions`.
pub fn compile_graph(regions: &[Rect]) -> Result<FilterGraph, FilterGraphError> {
    if regions.is_empty() {
        return Err(FilterGraphError::NoRegions);
    }
    let n = regions.len();
    let mut stages = Vec::with_capacity(1 + 3 * n);

    stages.push(Stage::new(
        Vec::new(),
        Filter::Split(n),
        (0..n).map(Label::Blur).collect(),
    ));

    for (i, rect) in regions.iter().enumerate() {
        let padded = rect.padded(CROP_PADDING);
        stages.push(Stage::new(
            vec![Label::Blur(i)],
            Filter::BoxBlur {
                radius: BLUR_RADIUS,
                power: BLUR_POWER,
            },
            vec![Label::Cropped(i)],
        ));
        stages.push(Stage::new(
            vec![Label::Cropped(i)],
            Filter::Crop {
                width: padded.width(),
                height: padded.height(),
                x: rect.x1(),
                y: rect.y1(),
            },
            vec![Label::Blurred(i)],
        ));
    }

    for (i, rect) in regions.iter().enumerate() {
        let base = if i == 0 {
            Label::Source
        } else {
            Label::Background(i - 1)
        };
        let outputs = if i + 1 == n {
            Vec::new()
        } else {
            vec![Label::Background(i)]
        };
        stages.push(Stage::new(
            vec![base, Label::Blurred(i)],
            Filter::Overlay {
                x: rect.x1(),
                y: rect.y1(),
            },
            outputs,
        ));
    }

    Ok(FilterGraph::new(stages))
}

/// A complete single-image blur command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskCommand {
    pub graph: FilterGraph,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl MaskCommand {
    /// ffmpeg arguments, one element per argv entry.
    pub fn arguments(&self) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            self.input.to_string_lossy().to_string(),
            "-filter_complex".to_string(),
            self.graph.to_string(),
            self.output.to_string_lossy().to_string(),
        ]
    }

    pub fn invocation(&self, ffmpeg: &str) -> ToolInvocation {
        ToolInvocation::new(ffmpeg).args(self.arguments())
    }
}

impl fmt::Display for MaskCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "-hide_banner -loglevel error -i {} -filter_complex \"{}\" {}",
            self.input.display(),
            self.graph,
            self.output.display()
        )
    }
}

/// Compile `regions` into the command blurring them in `input`.
pub fn compile(
    regions: &[Rect],
    input: &Path,
    output: &Path,
) -> Result<MaskCommand, FilterGraphError> {
    Ok(MaskCommand {
        graph: compile_graph(regions)?,
        input: input.to_path_buf(),
        output: output.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: u32, y: u32, w: u32, h: u32) -> Rect {
        Rect::new(x, y, w, h).unwrap()
    }

    #[test]
    fn single_region_matches_reference_command() {
        let cmd = compile(&[rect(10, 20, 30, 15)], Path::new("f.png"), Path::new("o.png")).unwrap();
        assert_eq!(
            cmd.to_string(),
            "-hide_banner -loglevel error -i f.png -filter_complex \"split=1[blur0];[blur0]boxblur=5:1[cropped0];[cropped0]crop=40:25:10:20[blurred0];[0:v][blurred0]overlay=10:20\" o.png"
        );
        assert!(!cmd.graph.to_string().contains("bg0"));
        cmd.graph.validate().unwrap();
    }

    #[test]
    fn empty_regions_are_rejected() {
        assert_eq!(compile_graph(&[]), Err(FilterGraphError::NoRegions));
    }

    #[test]
    fn compile_is_pure() {
        let regions = [rect(1, 2, 3, 4), rect(50, 60, 70, 80)];
        let a = compile(&regions, Path::new("a.png"), Path::new("b.png")).unwrap();
        let b = compile(&regions, Path::new("a.png"), Path::new("b.png")).unwrap();
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn stage_counts_scale_with_regions() {
        for n in 1..=6u32 {
            let regions: Vec<Rect> = (0..n).map(|i| rect(i * 20, i * 5, 10 + i, 8)).collect();
            let graph = compile_graph(&regions).unwrap();
            let n = n as usize;

            assert_eq!(graph.count_of(|f| matches!(f, Filter::Split(k) if *k == n)), 1);
            assert_eq!(graph.count_of(|f| matches!(f, Filter::BoxBlur { .. })), n);
            assert_eq!(graph.count_of(|f| matches!(f, Filter::Crop { .. })), n);
            assert_eq!(graph.count_of(|f| matches!(f, Filter::Overlay { .. })), n);

            let backgrounds = graph
                .produced_labels()
                .into_iter()
                .filter(|l| matches!(l, Label::Background(_)))
                .count();
            assert_eq!(backgrounds, n - 1);
            graph.validate().unwrap();
        }
    }

    #[test]
    fn crops_are_padded_and_overlays_at_origin() {
        let graph = compile_graph(&[rect(3, 4, 50, 20), rect(100, 200, 5, 6)]).unwrap();
        let text = graph.to_string();
        assert!(text.contains("[cropped0]crop=60:30:3:4[blurred0]"));
        assert!(text.contains("[cropped1]crop=15:16:100:200[blurred1]"));
        assert!(text.contains("[0:v][blurred0]overlay=3:4[bg0]"));
        assert!(text.ends_with("[bg0][blurred1]overlay=100:200"));
    }

    #[test]
    fn overlapping_regions_still_form_valid_graph() {
        let regions = [rect(0, 0, 50, 50), rect(10, 10, 50, 50), rect(10, 10, 50, 50)];
        assert!(regions[0].intersects(&regions[1]));
        let graph = compile_graph(&regions).unwrap();
        graph.validate().unwrap();
        // bg labels thread strictly upward
        let text = graph.to_string();
        assert!(text.contains("[bg0][blurred1]overlay=10:10[bg1]"));
        assert!(text.ends_with("[bg1][blurred2]overlay=10:10"));
    }

    #[test]
    fn arguments_keep_graph_as_one_entry() {
        let cmd = compile(
            &[rect(1, 1, 2, 2)],
            Path::new("in dir/f.png"),
            Path::new("o.png"),
        )
        .unwrap();
        let args = cmd.arguments();
        assert_eq!(args.len(), 8);
        assert_eq!(args[4], "in dir/f.png");
        assert_eq!(args[6], cmd.graph.to_string());
        assert_eq!(cmd.invocation("ffmpeg").program(), "ffmpeg");
    }
}
