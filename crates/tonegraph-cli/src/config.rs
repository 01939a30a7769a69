//! Runtime configuration for the command-line tool.

use std::path::{Path, PathBuf};

use tonegraph_core::StyleVariant;

/// Default directory holding model artifacts.
const DEFAULT_MODEL_DIR: &str = "assets/models";
/// Default tracing filter.
const DEFAULT_LOG_FILTER: &str = "info";

/// Settings resolved from the environment, then overridden by flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory artifacts are written to and read from by default.
    pub model_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive string.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_dir: std::env::var_os("TONEGRAPH_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR)),
            log_filter: std::env::var("TONEGRAPH_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

impl AppConfig {
    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, model_dir: Option<&Path>, log_filter: Option<&str>) -> Self {
        if let Some(dir) = model_dir {
            self.model_dir = dir.to_path_buf();
        }
        if let Some(filter) = log_filter {
            self.log_filter = filter.to_string();
        }
        self
    }

    /// Where `variant`'s artifact lives unless a path is given explicitly.
    pub fn artifact_path(&self, variant: StyleVariant) -> PathBuf {
        self.model_dir.join(variant.default_file_name())
    }

    /// Artifact checked by `verify` and `inspect` when no path is given.
    pub fn default_artifact(&self) -> PathBuf {
        self.artifact_path(StyleVariant::SepiaMatrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> AppConfig {
        AppConfig {
            model_dir: PathBuf::from("models"),
            log_filter: "warn".into(),
        }
    }

    #[test]
    fn test_artifact_paths_use_variant_file_names() {
        let config = fixed();
        assert_eq!(
            config.artifact_path(StyleVariant::ChannelGain),
            PathBuf::from("models/simple_style.tflite")
        );
        assert_eq!(
            config.default_artifact(),
            PathBuf::from("models/style_transfer_quant.tflite")
        );
    }

    #[test]
    fn test_overrides_replace_environment_values() {
        let config = fixed().with_overrides(Some(Path::new("/tmp/out")), Some("debug"));
        assert_eq!(config.model_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.log_filter, "debug");

        let untouched = fixed().with_overrides(None, None);
        assert_eq!(untouched, fixed());
    }
}
