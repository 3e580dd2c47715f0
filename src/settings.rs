use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use crate::codec::{Charset, CsvForm};
use crate::error::{DtalgebraError, Result};

pub const DEFAULT_SETTINGS_FILE: &str = "dtalgebra.toml";

/// Settings for the converter, read from an optional TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub charset: Option<String>,
    pub csv_form: String,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            charset: None,
            csv_form: String::from("standard"),
            log_level: String::from("info"),
        }
    }
}

impl Settings {
    /// Loads settings from `path`. A missing file leaves every setting at its default.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .build()?
            .try_deserialize()?;
        // validated up front so a bad file fails before any conversion starts
        settings.charset()?;
        settings.csv_form()?;
        Ok(settings)
    }
    pub fn charset(&self) -> Result<Charset> {
        match &self.charset {
            None => Ok(Charset::platform_default()),
            Some(name) => Charset::from_name(name).map_err(|e| DtalgebraError::Config(e.to_string())),
        }
    }
    pub fn csv_form(&self) -> Result<CsvForm> {
        match self.csv_form.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(CsvForm::Standard),
            "table" => Ok(CsvForm::Table),
            other => Err(DtalgebraError::Config(format!("unknown csv form '{}'", other))),
        }
    }
}
