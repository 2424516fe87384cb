//! Local OCR through the `tesseract` command line tool.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::engine::{OcrEngine, OcrError, OcrInput, OcrOutput};
use crate::region::{BoundingBox, TextRegion};

/// Default language set: Korean first, English as fallback.
pub const DEFAULT_LANGUAGE: &str = "kor+eng";

/// TSV row level for single words.
const WORD_LEVEL: &str = "5";

pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
}

impl TesseractEngine {
    pub fn new(language: &str) -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: language.to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Checks that the binary can be launched.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn recognize(&self, input: &OcrInput) -> Result<OcrOutput, OcrError> {
        let (source, stdin_data): (OsString, Option<&[u8]>) = match input {
            OcrInput::FilePath(path) => (path.as_os_str().to_owned(), None),
            OcrInput::Bytes(data) => ("stdin".into(), Some(data.as_slice())),
        };

        let mut child = Command::new(&self.binary)
            .arg(&source)
            .arg("stdout")
            .args(["-l", &self.language, "--psm", "3", "tsv"])
            .stdin(if stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| OcrError::EngineError(format!("failed to run tesseract: {e}")))?;

        if let (Some(data), Some(mut stdin)) = (stdin_data, child.stdin.take()) {
            stdin
                .write_all(data)
                .await
                .map_err(|e| OcrError::EngineError(format!("failed to pipe image: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrError::EngineError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::EngineError(format!(
                "tesseract failed: {}",
                stderr.trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let regions = parse_tsv(&tsv);
        debug!(regions = regions.len(), "tesseract finished");

        Ok(OcrOutput::from_regions(regions))
    }
}

/// Extracts word rows from tesseract TSV output, keeping output order.
fn parse_tsv(tsv: &str) -> Vec<TextRegion> {
    tsv.lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 || cols[0] != WORD_LEVEL {
                return None;
            }
            let text = cols[11].trim();
            if text.is_empty() {
                return None;
            }

            let mut region = TextRegion::text(text);
            if let Ok(conf) = cols[10].parse::<f32>() {
                if conf >= 0.0 {
                    region = region.with_confidence(conf / 100.0);
                }
            }
            let dims: Vec<f32> = cols[6..10]
                .iter()
                .filter_map(|v| v.parse::<f32>().ok())
                .collect();
            if let &[x, y, width, height] = dims.as_slice() {
                region = region.with_box(BoundingBox {
                    x,
                    y,
                    width,
                    height,
                });
            }
            Some(region)
        })
        .collect()
}
