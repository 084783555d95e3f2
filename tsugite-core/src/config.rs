//! Generator configuration.
//!
//! All knobs have serde defaults so an empty JSON object (or no config file
//! at all) yields the stock behavior. The tool is stateless: configuration
//! only shapes a single run, nothing is persisted.

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Suffix appended to the source file stem for the generated sibling
    /// file (`foo.rs` -> `foo_gen.rs`). Files carrying the suffix are never
    /// loaded as package sources.
    #[serde(default = "default_gen_suffix")]
    pub gen_suffix: String,

    /// Run the assembled output through the formatter before writing.
    #[serde(default = "default_true")]
    pub format_output: bool,

    /// Full paths of cancellation-handle types. A provider whose first
    /// parameter matches one of these (by final segment) receives the
    /// injector's handle instead of a graph dependency.
    #[serde(default = "default_cancel_types")]
    pub cancel_types: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            gen_suffix: default_gen_suffix(),
            format_output: default_true(),
            cancel_types: default_cancel_types(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// File name of the generated sibling for `source`, or `None` when the
    /// source itself already carries the generated suffix.
    pub fn generated_name(&self, source: &Path) -> Option<String> {
        let stem = source.file_stem()?.to_str()?;
        if stem.ends_with(&self.gen_suffix) {
            return None;
        }
        Some(format!("{}{}.rs", stem, self.gen_suffix))
    }
}

fn default_gen_suffix() -> String {
    "_gen".to_string()
}

fn default_true() -> bool {
    true
}

fn default_cancel_types() -> Vec<String> {
    vec!["tokio_util::sync::CancellationToken".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: GeneratorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.gen_suffix, "_gen");
        assert!(config.format_output);
        assert_eq!(
            config.cancel_types,
            vec!["tokio_util::sync::CancellationToken".to_string()]
        );
    }

    #[test]
    fn generated_name_skips_generated_sources() {
        let config = GeneratorConfig::default();
        assert_eq!(
            config.generated_name(Path::new("src/app.rs")),
            Some("app_gen.rs".to_string())
        );
        assert_eq!(config.generated_name(Path::new("src/app_gen.rs")), None);
    }
}
