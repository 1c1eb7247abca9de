//! Application Configuration
//!
//! Scanner settings stored in TOML format. One `AppConfig` is built at startup
//! and handed to the recognition pipeline, the frame source and the window.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `ocr.tesseract_cmd`
pub const TESSERACT_ENV: &str = "TEXT_SCANNER_TESSERACT";

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// OCR engine settings
    pub ocr: OcrSettings,
    /// Preview settings
    pub display: DisplaySettings,
    /// Camera settings
    pub camera: CameraSettings,
    /// Text dump settings
    pub output: OutputSettings,
    /// Overlay drawing settings
    pub overlay: OverlaySettings,
}

/// OCR engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract executable, either a bare name looked up on PATH or a full path
    pub tesseract_cmd: PathBuf,
    /// Tesseract language code(s), e.g. "eng" or "eng+deu"
    pub language: String,
    /// Page segmentation mode; Tesseract's own default when unset
    pub psm: Option<u32>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            psm: None,
        }
    }
}

/// Preview settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Initial preview width in points
    pub width: u32,
    /// Initial preview height in points
    pub height: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Camera settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Capture device opened by Start Camera
    pub device_index: u32,
    /// Interval between frame polls
    pub poll_interval_ms: u64,
    /// Requested frame width
    pub frame_width: u32,
    /// Requested frame height
    pub frame_height: u32,
    /// Requested frame rate
    pub fps: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            poll_interval_ms: 30,
            frame_width: 640,
            frame_height: 480,
            fps: 30,
        }
    }
}

/// Text dump settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Write the recognized text to `text_file` after every run
    pub save_text: bool,
    /// File overwritten with the recognized text
    pub text_file: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            save_text: false,
            text_file: PathBuf::from("extracted_text.txt"),
        }
    }
}

/// Overlay drawing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    /// Label text height in pixels
    pub label_size: f32,
    /// Box outline thickness in pixels
    pub stroke_width: u32,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            label_size: 16.0,
            stroke_width: 2,
        }
    }
}

impl AppConfig {
    /// Apply environment overrides on top of file settings
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(cmd) = std::env::var_os(TESSERACT_ENV) {
            if !cmd.is_empty() {
                self.ocr.tesseract_cmd = PathBuf::from(cmd);
            }
        }
        self
    }
}

/// Get the configuration directory
pub fn config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "textscanner", "TextScanner")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.ocr.tesseract_cmd, PathBuf::from("tesseract"));
        assert_eq!(config.ocr.language, "eng");
        assert!(config.ocr.psm.is_none());

        assert_eq!(config.display.width, 800);
        assert_eq!(config.display.height, 600);

        assert_eq!(config.camera.poll_interval_ms, 30);
        assert_eq!(config.camera.frame_width, 640);
        assert_eq!(config.camera.frame_height, 480);
        assert_eq!(config.camera.fps, 30);

        assert!(!config.output.save_text);
        assert_eq!(config.output.text_file, PathBuf::from("extracted_text.txt"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AppConfig::default();
        config.ocr.psm = Some(6);
        config.camera.device_index = 2;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [ocr]
            language = "deu"

            [output]
            save_text = true
            "#,
        )
        .unwrap();

        assert_eq!(parsed.ocr.language, "deu");
        assert_eq!(parsed.ocr.tesseract_cmd, PathBuf::from("tesseract"));
        assert!(parsed.output.save_text);
        assert_eq!(parsed.output.text_file, PathBuf::from("extracted_text.txt"));
        assert_eq!(parsed.camera, CameraSettings::default());
    }

    #[test]
    fn test_preprocessing_section_is_ignored() {
        // Binarization is not configurable; older files may still carry the flags
        let parsed: AppConfig = toml::from_str(
            r#"
            [preprocessing]
            grayscale = false
            threshold = false
            "#,
        )
        .unwrap();

        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AppConfig::default();
        config.ocr.tesseract_cmd = PathBuf::from("/opt/tesseract/bin/tesseract");

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
