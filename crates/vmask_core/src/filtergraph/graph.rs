//! Filter graph intermediate representation.
//!
//! A graph is an ordered list of stages. Each stage reads labelled pads,
//! applies one filter and writes labelled pads. Rendering happens only in
//! the `Display` impls, in ffmpeg `-filter_complex` syntax.

use std::collections::HashSet;
use std::fmt;

use super::error::FilterGraphError;

/// A pad label. `Source` is the decoder output of the first input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Source,
    Blur(usize),
    Cropped(usize),
    Blurred(usize),
    Background(usize),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Source => write!(f, "0:v"),
            Label::Blur(i) => write!(f, "blur{}", i),
            Label::Cropped(i) => write!(f, "cropped{}", i),
            Label::Blurred(i) => write!(f, "blurred{}", i),
            Label::Background(i) => write!(f, "bg{}", i),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Duplicate the input into `n` outputs.
    Split(usize),
    BoxBlur { radius: u32, power: u32 },
    Crop { width: u32, height: u32, x: u32, y: u32 },
    Overlay { x: u32, y: u32 },
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Split(n) => write!(f, "split={}", n),
            Filter::BoxBlur { radius, power } => write!(f, "boxblur={}:{}", radius, power),
            Filter::Crop {
                width,
                height,
                x,
                y,
            } => write!(f, "crop={}:{}:{}:{}", width, height, x, y),
            Filter::Overlay { x, y } => write!(f, "overlay={}:{}", x, y),
        }
    }
}

/// One filter application with its input and output pads.
///
/// A stage without inputs reads the graph's default input; a stage without
/// outputs is the graph terminal and feeds the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub inputs: Vec<Label>,
    pub filter: Filter,
    pub outputs: Vec<Label>,
}

impl Stage {
    pub fn new(inputs: Vec<Label>, filter: Filter, outputs: Vec<Label>) -> Self {
        Self {
            inputs,
            filter,
            outputs,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.inputs {
            write!(f, "[{}]", label)?;
        }
        write!(f, "{}", self.filter)?;
        for label in &self.outputs {
            write!(f, "[{}]", label)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterGraph {
    stages: Vec<Stage>,
}

impl FilterGraph {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of stages whose filter satisfies `matches`.
    pub fn count_of(&self, matches: impl Fn(&Filter) -> bool) -> usize {
        self.stages.iter().filter(|s| matches(&s.filter)).count()
    }

    /// Every label produced anywhere in the graph.
    pub fn produced_labels(&self) -> Vec<Label> {
        self.stages
            .iter()
            .flat_map(|s| s.outputs.iter().copied())
            .collect()
    }

    /// Check the graph is a well-formed single-output DAG.
    ///
    /// - intermediate labels are produced once, before being consumed once
    /// - `Source` may be read any number of times but never produced
    /// - only split stages may omit inputs
    /// - exactly one stage is terminal
    pub fn validate(&self) -> Result<(), FilterGraphError> {
        let mut produced: HashSet<Label> = HashSet::new();
        let mut consumed: HashSet<Label> = HashSet::new();

        for (idx, stage) in self.stages.iter().enumerate() {
            if stage.inputs.is_empty() && !matches!(stage.filter, Filter::Split(_)) {
                return Err(FilterGraphError::MissingInput { stage: idx });
            }

            for label in &stage.inputs {
                if *label == Label::Source {
                    continue;
                }
                if !produced.contains(label) {
                    return Err(FilterGraphError::UnproducedLabel {
                        stage: idx,
                        label: label.to_string(),
                    });
                }
                if !consumed.insert(*label) {
                    return Err(FilterGraphError::ReusedLabel {
                        label: label.to_string(),
                    });
                }
            }

            for label in &stage.outputs {
                if *label == Label::Source || !produced.insert(*label) {
                    return Err(FilterGraphError::DuplicateLabel {
                        label: label.to_string(),
                    });
                }
            }
        }

        if let Some(label) = self
            .produced_labels()
            .into_iter()
            .find(|l| !consumed.contains(l))
        {
            return Err(FilterGraphError::DanglingLabel {
                label: label.to_string(),
            });
        }

        let terminals = self.stages.iter().filter(|s| s.is_terminal()).count();
        if terminals != 1 {
            return Err(FilterGraphError::TerminalCount { count: terminals });
        }

        Ok(())
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, stage) in self.stages.iter().enumerate() {
            if idx > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_labels_and_filters() {
        assert_eq!(Label::Source.to_string(), "0:v");
        assert_eq!(Label::Background(3).to_string(), "bg3");
        let stage = Stage::new(
            vec![Label::Cropped(0)],
            Filter::Crop {
                width: 40,
                height: 25,
                x: 10,
                y: 20,
            },
            vec![Label::Blurred(0)],
        );
        assert_eq!(stage.to_string(), "[cropped0]crop=40:25:10:20[blurred0]");
    }

    #[test]
    fn rejects_consuming_unknown_label() {
        let graph = FilterGraph::new(vec![Stage::new(
            vec![Label::Source, Label::Blurred(0)],
            Filter::Overlay { x: 0, y: 0 },
            vec![],
        )]);
        assert!(matches!(
            graph.validate(),
            Err(FilterGraphError::UnproducedLabel { stage: 0, .. })
        ));
    }

    #[test]
    fn rejects_dangling_output() {
        let graph = FilterGraph::new(vec![
            Stage::new(vec![], Filter::Split(2), vec![Label::Blur(0), Label::Blur(1)]),
            Stage::new(
                vec![Label::Blur(0)],
                Filter::BoxBlur { radius: 5, power: 1 },
                vec![],
            ),
        ]);
        assert_eq!(
            graph.validate(),
            Err(FilterGraphError::DanglingLabel {
                label: "blur1".to_string()
            })
        );
    }

    #[test]
    fn rejects_double_consumption_and_missing_terminal() {
        let reuse = FilterGraph::new(vec![
            Stage::new(vec![], Filter::Split(1), vec![Label::Blur(0)]),
            Stage::new(
                vec![Label::Blur(0)],
                Filter::BoxBlur { radius: 5, power: 1 },
                vec![Label::Cropped(0)],
            ),
            Stage::new(
                vec![Label::Blur(0)],
                Filter::BoxBlur { radius: 5, power: 1 },
                vec![],
            ),
        ]);
        assert!(matches!(
            reuse.validate(),
            Err(FilterGraphError::ReusedLabel { .. })
        ));

        assert_eq!(
            FilterGraph::default().validate(),
            Err(FilterGraphError::TerminalCount { count: 0 })
        );
    }
}
