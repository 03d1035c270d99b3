//! Run configuration.
//!
//! A run's mode and output location travel as one immutable value through
//! every call. Nothing in the engine reads ambient state; the only
//! environment fallback is the project identifier recorded in the run
//! descriptor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serialization mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Plain values, optimized for human inspection. Lossy: references
    /// and timestamps flatten into ordinary strings.
    Readable,
    /// Marker-tagged values (`__type`), lossless and machine-reconstructible.
    Typed,
}

impl ExportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportMode::Readable => "readable",
            ExportMode::Typed => "typed",
        }
    }
}

impl Default for ExportMode {
    fn default() -> Self {
        ExportMode::Readable
    }
}

impl std::fmt::Display for ExportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "readable" | "human" => Ok(ExportMode::Readable),
            "typed" | "lossless" => Ok(ExportMode::Typed),
            _ => Err(format!(
                "Invalid export mode '{}'. Use 'readable' or 'typed'",
                s
            )),
        }
    }
}

/// Configuration for one export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Serialization mode. `readable` and `typed` trees live side by side
    /// under the same root without collision.
    pub mode: ExportMode,
    /// Root output directory; files land under `<output_root>/<mode>`.
    pub output_root: PathBuf,
    /// Project identifier recorded in the run descriptor.
    pub project_id: Option<String>,
}

impl ExportConfig {
    pub fn new(mode: ExportMode, output_root: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            output_root: output_root.into(),
            project_id: None,
        }
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// The directory this run actually writes into.
    pub fn resolved_output(&self) -> PathBuf {
        self.output_root.join(self.mode.as_str())
    }

    /// Project identifier for the descriptor: configured value, else the
    /// `GOOGLE_CLOUD_PROJECT` environment variable, else `"unknown"`.
    pub fn resolved_project_id(&self) -> String {
        self.project_id
            .clone()
            .or_else(|| std::env::var("GOOGLE_CLOUD_PROJECT").ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }
}
