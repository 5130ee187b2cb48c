//! TOML-backed run configuration.
//!
//! All paths have working-directory defaults matching the layout the
//! audit team already uses; an optional `care-audit.toml` overrides
//! them, and CLI flags override both.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = "care-audit.toml";

/// Directory and ledger locations for one run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct Config {
    /// Directory of PDF statements to process.
    pub input_dir: PathBuf,
    /// Directory of per-provider tables.
    pub output_dir: PathBuf,
    /// Root directory for analysis reports.
    pub analyzed_dir: PathBuf,
    /// Attendance ledger CSV.
    pub ledger_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            analyzed_dir: PathBuf::from("Analyzed Results"),
            ledger_path: PathBuf::from("attendance_data").join("attendance_report.csv"),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, from [`CONFIG_FILE`] if present,
    /// or falls back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file cannot be read or
    /// parsed. A missing default file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = match path {
            Some(path) => path,
            None if Path::new(CONFIG_FILE).exists() => Path::new(CONFIG_FILE),
            None => return Ok(Self::default()),
        };
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Attendance comparison reports directory.
    #[must_use]
    pub fn attendance_dir(&self) -> PathBuf {
        self.analyzed_dir.join("Attendance_comparison")
    }

    /// Branch name reports directory.
    #[must_use]
    pub fn branch_dir(&self) -> PathBuf {
        self.analyzed_dir.join("Branch_Names")
    }

    /// Branch-filtered case reports directory.
    #[must_use]
    pub fn filter_dir(&self) -> PathBuf {
        self.analyzed_dir.join("Filter_Cases_with_Branch_names")
    }

    /// Missing case reports directory.
    #[must_use]
    pub fn missing_dir(&self) -> PathBuf {
        self.analyzed_dir.join("Missing_cases")
    }

    /// Overpaid case reports directory.
    #[must_use]
    pub fn overpaid_dir(&self) -> PathBuf {
        self.analyzed_dir.join("Less_Paid")
    }
}
