//! Tesseract OCR backend
//!
//! Runs the `tesseract` executable as a child process: once for plain text and
//! once for TSV word data, both on the same temporary PNG.

use image::DynamicImage;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use super::ocr::{EngineOutput, OcrEngine, OcrError, RawToken};
use crate::config::OcrSettings;
use crate::geometry::Rect;

/// TSV column count of a Tesseract data row
const TSV_COLUMNS: usize = 12;
/// TSV `level` value of word rows
const WORD_LEVEL: &str = "5";

/// Output flavor requested from Tesseract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputKind {
    Text,
    Tsv,
}

/// Tesseract engine wrapper
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: PathBuf,
    language: String,
    psm: Option<u32>,
}

impl TesseractEngine {
    pub fn new(settings: &OcrSettings) -> Self {
        info!(
            "Using tesseract at {:?} (language: {})",
            settings.tesseract_cmd, settings.language
        );
        Self {
            command: settings.tesseract_cmd.clone(),
            language: settings.language.clone(),
            psm: settings.psm,
        }
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    fn args(&self, image: &Path, kind: OutputKind) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            image.as_os_str().to_owned(),
            "stdout".into(),
            "-l".into(),
            self.language.clone().into(),
        ];
        if let Some(psm) = self.psm {
            args.push("--psm".into());
            args.push(psm.to_string().into());
        }
        if kind == OutputKind::Tsv {
            args.push("tsv".into());
        }
        args
    }

    fn run(&self, image: &Path, kind: OutputKind) -> Result<String, OcrError> {
        let output = Command::new(&self.command)
            .args(self.args(image, kind))
            .output()
            .map_err(|source| OcrError::Launch {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<EngineOutput, OcrError> {
        let mut tmp = tempfile::Builder::new()
            .prefix("text-scanner-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Input(e.to_string()))?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .map_err(|e| OcrError::Input(e.to_string()))?;
        tmp.flush().map_err(|e| OcrError::Input(e.to_string()))?;

        debug!(
            "Tesseract: processing {}x{} image",
            image.width(),
            image.height()
        );

        let text = self.run(tmp.path(), OutputKind::Text)?;
        let tsv = self.run(tmp.path(), OutputKind::Tsv)?;
        let tokens = parse_tsv(&tsv);

        debug!("Tesseract: {} words", tokens.len());
        Ok(EngineOutput { text, tokens })
    }
}

/// Parse word rows out of Tesseract TSV output
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Header and malformed rows are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<RawToken> {
    tsv.lines()
        .skip(1)
        .filter_map(|row| {
            let cols: Vec<&str> = row.splitn(TSV_COLUMNS, '\t').collect();
            if cols.len() < TSV_COLUMNS || cols[0] != WORD_LEVEL {
                return None;
            }
            let left = cols[6].parse().ok()?;
            let top = cols[7].parse().ok()?;
            let width = cols[8].parse().ok()?;
            let height = cols[9].parse().ok()?;
            Some(RawToken {
                text: cols[11].to_string(),
                confidence: cols[10].to_string(),
                rect: Rect::new(left, top, width, height),
            })
        })
        .collect()
}
