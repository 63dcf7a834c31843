//! Tesseract command-line backend.
//!
//! Each `recognize` call spawns one `tesseract <image> stdout ... tsv`
//! process and parses its TSV report. Rows with level 5 are words.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::engine::{OcrEngine, OcrWord};
use super::error::OcrError;
use crate::config::{OcrSettings, ToolSettings};
use crate::tools::{ToolExecutor, ToolInvocation};

/// TSV `level` value for word rows.
const WORD_LEVEL: &str = "5";

pub struct TesseractEngine {
    executor: Arc<dyn ToolExecutor>,
    binary: String,
    language: String,
    dpi: u32,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractEngine {
    pub fn new(executor: Arc<dyn ToolExecutor>, binary: impl Into<String>) -> Self {
        Self {
            executor,
            binary: binary.into(),
            language: "eng".to_string(),
            dpi: 131,
            tessdata_dir: None,
        }
    }

    /// Build from the `[ocr]` and `[tools]` settings sections.
    pub fn from_settings(
        executor: Arc<dyn ToolExecutor>,
        ocr: &OcrSettings,
        tools: &ToolSettings,
    ) -> Self {
        let mut engine = Self::new(executor, tools.tesseract_path.clone())
            .with_language(ocr.language.clone())
            .with_dpi(ocr.dpi);
        if !ocr.tessdata_dir.is_empty() {
            engine = engine.with_tessdata_dir(&ocr.tessdata_dir);
        }
        engine
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }

    /// Command used to recognize `image`.
    pub fn invocation(&self, image: &Path) -> ToolInvocation {
        let dpi = self.dpi.to_string();
        let mut inv = ToolInvocation::new(self.binary.as_str())
            .path_arg(image)
            .arg("stdout")
            .args(["-l", self.language.as_str(), "--dpi", dpi.as_str()]);
        if let Some(ref dir) = self.tessdata_dir {
            inv = inv.arg("--tessdata-dir").path_arg(dir);
        }
        inv.arg("tsv")
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn warm_up(&self) -> Result<String, OcrError> {
        let inv = ToolInvocation::new(self.binary.as_str()).arg("--version");
        let output = self.executor.execute(&inv)?;
        Ok(output.banner().to_string())
    }

    fn recognize(&self, image: &Path) -> Result<Vec<OcrWord>, OcrError> {
        if !image.is_file() {
            return Err(OcrError::ImageNotFound(image.to_path_buf()));
        }
        let output = self.executor.execute(&self.invocation(image))?;
        parse_tsv(&output.stdout)
    }
}

struct Columns {
    level: usize,
    left: usize,
    top: usize,
    width: usize,
    height: usize,
    conf: usize,
    text: usize,
}

impl Columns {
    fn from_header(header: &str) -> Result<Self, OcrError> {
        let names: Vec<&str> = header.split('\t').map(str::trim).collect();
        let find = |name: &str| {
            names
                .iter()
                .position(|n| *n == name)
                .ok_or_else(|| OcrError::parse(1, format!("missing column '{}'", name)))
        };
        Ok(Self {
            level: find("level")?,
            left: find("left")?,
            top: find("top")?,
            width: find("width")?,
            height: find("height")?,
            conf: find("conf")?,
            text: find("text")?,
        })
    }
}

/// Parse tesseract's TSV report into word tokens.
///
/// Word rows with blank text are skipped. An empty report yields no words.
pub fn parse_tsv(tsv: &str) -> Result<Vec<OcrWord>, OcrError> {
    let mut lines = tsv.lines().enumerate();
    let Some((_, header)) = lines.find(|(_, l)| !l.trim().is_empty()) else {
        return Ok(Vec::new());
    };
    let cols = Columns::from_header(header)?;

    let mut words = Vec::new();
    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let line_no = idx + 1;
        if fields.get(cols.level).map(|s| s.trim()) != Some(WORD_LEVEL) {
            continue;
        }

        let text = fields.get(cols.text).map(|s| s.trim()).unwrap_or("");
        if text.is_empty() {
            continue;
        }

        let int = |col: usize, name: &str| -> Result<i64, OcrError> {
            fields
                .get(col)
                .and_then(|s| s.trim().parse::<i64>().ok())
                .ok_or_else(|| OcrError::parse(line_no, format!("bad {} value", name)))
        };

        let mut word = OcrWord::new(
            text,
            int(cols.left, "left")?,
            int(cols.top, "top")?,
            int(cols.width, "width")?,
            int(cols.height, "height")?,
        );
        if let Some(conf) = fields.get(cols.conf).and_then(|s| s.trim().parse::<f32>().ok()) {
            if conf >= 0.0 {
                word = word.with_confidence(conf);
            }
        }
        words.push(word);
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fake::FakeExecutor;
    use crate::tools::{ToolError, ToolOutput};
    use tempfile::tempdir;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn sample() -> String {
        [
            HEADER,
            "1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t",
            "4\t1\t1\t1\t1\t0\t10\t20\t200\t15\t-1\t",
            "5\t1\t1\t1\t1\t1\t10\t20\t30\t15\t96.5\tUser:",
            "5\t1\t1\t1\t1\t2\t45\t20\t60\t15\t91\thello",
            "5\t1\t1\t1\t1\t3\t110\t20\t5\t15\t95\t ",
        ]
        .join("\n")
    }

    #[test]
    fn parses_word_rows_only() {
        let words = parse_tsv(&sample()).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "User:");
        assert_eq!(words[0].bounds(), crate::models::Rect::new(10, 20, 30, 15));
        assert_eq!(words[0].confidence, Some(96.5));
        assert_eq!(words[1].text, "hello");
    }

    #[test]
    fn empty_report_has_no_words() {
        assert!(parse_tsv("").unwrap().is_empty());
        assert!(parse_tsv(HEADER).unwrap().is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_tsv("not a tsv report"),
            Err(OcrError::Parse { line: 1, .. })
        ));
        let bad = format!("{}\n5\t1\t1\t1\t1\t1\tx\t20\t30\t15\t90\tUser", HEADER);
        assert!(matches!(parse_tsv(&bad), Err(OcrError::Parse { line: 2, .. })));
    }

    #[test]
    fn builds_tesseract_command() {
        let engine = TesseractEngine::new(Arc::new(FakeExecutor::ffmpeg(0)), "tesseract")
            .with_tessdata_dir("/opt/tessdata");
        let inv = engine.invocation(Path::new("frame_0001.png"));
        assert_eq!(
            inv.command_line(),
            "tesseract frame_0001.png stdout -l eng --dpi 131 --tessdata-dir /opt/tessdata tsv"
        );
    }

    #[test]
    fn recognizes_through_executor() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("frame_0001.png");
        std::fs::write(&image, b"png").unwrap();

        let report = sample();
        let executor =
            Arc::new(FakeExecutor::new(move |_| Ok(ToolOutput::success(report.clone()))));
        let engine = TesseractEngine::new(executor.clone(), "tesseract");

        let words = engine.recognize(&image).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(executor.calls().len(), 1);
    }

    #[test]
    fn missing_image_and_tool_failure_are_errors() {
        let dir = tempdir().unwrap();
        let executor = Arc::new(FakeExecutor::new(|inv| {
            Err(ToolError::Launch {
                tool: inv.tool_name(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no tesseract"),
            })
        }));
        let engine = TesseractEngine::new(executor, "tesseract");

        let missing = dir.path().join("nope.png");
        assert!(matches!(engine.recognize(&missing), Err(OcrError::ImageNotFound(_))));

        let image = dir.path().join("frame_0001.png");
        std::fs::write(&image, b"png").unwrap();
        assert!(matches!(engine.recognize(&image), Err(OcrError::Tool(_))));
    }

    #[test]
    fn warm_up_reads_banner() {
        let executor = Arc::new(FakeExecutor::new(|_| {
            Ok(ToolOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: "tesseract 5.3.0\n leptonica-1.82.0".to_string(),
            })
        }));
        let engine = TesseractEngine::new(executor, "tesseract");
        assert_eq!(engine.warm_up().unwrap(), "tesseract 5.3.0");
    }
}
