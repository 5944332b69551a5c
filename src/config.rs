use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Everything the dashboard reads from its optional JSON config file.
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub normalize: NormalizeConfig,
    /// Number of equal-width bins in the balance histogram.
    pub histogram_bins: usize,
    /// Suffix of the average-balance KPI.
    pub currency: String,
    /// How many terms the remarks word cloud keeps.
    pub word_cloud_terms: usize,
    /// Write log records here instead of stderr.
    pub log_file: Option<PathBuf>,
}

/// Column rules applied while loading a CSV.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub dropped_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub date_columns: Vec<String>,
    /// Replacement for missing values in text columns.
    pub text_sentinel: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            dropped_columns: vec![
                "accumulative_absent_percent_80_percent".into(),
                "current_week_absent_percent".into(),
            ],
            numeric_columns: vec![
                "no_of_semester".into(),
                "balance".into(),
                "no_of_follow_up".into(),
                "sr_number".into(),
                "week".into(),
            ],
            date_columns: vec!["follow_up_date".into(), "date".into()],
            text_sentinel: "N/A".into(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeConfig::default(),
            histogram_bins: 20,
            currency: "PKR".into(),
            word_cloud_terms: 100,
            log_file: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing dashboard config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Load `path` if given, otherwise fall back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
