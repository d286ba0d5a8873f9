use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ExtractConfig, Limits, PipelineConfig, ValidatorConfigBuilder};

/// Environment variable overriding `[limits] max_input_bytes`.
pub const ENV_MAX_INPUT_BYTES: &str = "PDFSIFT_MAX_INPUT_BYTES";
/// Environment variable overriding `[pipeline] strategy_timeout_secs`.
pub const ENV_STRATEGY_TIMEOUT: &str = "PDFSIFT_STRATEGY_TIMEOUT";

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub limits: Option<LimitsSection>,
    pub validator: Option<ValidatorSection>,
    pub extract: Option<ExtractSection>,
    pub pipeline: Option<PipelineSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitsSection {
    pub max_input_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSection {
    pub min_chars: Option<usize>,
    pub min_printable_ratio: Option<f64>,
    pub min_words: Option<usize>,
    pub min_avg_word_len: Option<f64>,
    pub max_avg_word_len: Option<f64>,
    pub min_alpha_word_len: Option<usize>,
    /// Replaces the built-in artifact patterns entirely.
    pub artifact_patterns: Option<Vec<String>>,
    /// Appended to the built-in artifact patterns.
    pub extra_artifact_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractSection {
    pub page_cap: Option<usize>,
    pub tj_word_gap: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSection {
    pub strategy_timeout_secs: Option<u64>,
}

/// Platform config directory path: `<config_dir>/pdfsift/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pdfsift").join("config.toml"))
}

/// Load config by cascading CWD `.pdfsift.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".pdfsift.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    match read_config(path) {
        Ok(config) => Some(config),
        Err(ConfigError::Io(_)) => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
            None
        }
    }
}

/// Read a config the user pointed at explicitly; errors are surfaced.
pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let limits = match (base.limits, overlay.limits) {
        (b, None) => b,
        (None, o) => o,
        (Some(b), Some(o)) => Some(LimitsSection {
            max_input_bytes: o.max_input_bytes.or(b.max_input_bytes),
        }),
    };
    let validator = match (base.validator, overlay.validator) {
        (b, None) => b,
        (None, o) => o,
        (Some(b), Some(o)) => Some(ValidatorSection {
            min_chars: o.min_chars.or(b.min_chars),
            min_printable_ratio: o.min_printable_ratio.or(b.min_printable_ratio),
            min_words: o.min_words.or(b.min_words),
            min_avg_word_len: o.min_avg_word_len.or(b.min_avg_word_len),
            max_avg_word_len: o.max_avg_word_len.or(b.max_avg_word_len),
            min_alpha_word_len: o.min_alpha_word_len.or(b.min_alpha_word_len),
            artifact_patterns: o.artifact_patterns.or(b.artifact_patterns),
            extra_artifact_patterns: o.extra_artifact_patterns.or(b.extra_artifact_patterns),
        }),
    };
    let extract = match (base.extract, overlay.extract) {
        (b, None) => b,
        (None, o) => o,
        (Some(b), Some(o)) => Some(ExtractSection {
            page_cap: o.page_cap.or(b.page_cap),
            tj_word_gap: o.tj_word_gap.or(b.tj_word_gap),
        }),
    };
    let pipeline = match (base.pipeline, overlay.pipeline) {
        (b, None) => b,
        (None, o) => o,
        (Some(b), Some(o)) => Some(PipelineSection {
            strategy_timeout_secs: o.strategy_timeout_secs.or(b.strategy_timeout_secs),
        }),
    };
    ConfigFile {
        limits,
        validator,
        extract,
        pipeline,
    }
}

impl ConfigFile {
    /// Overlay values from `PDFSIFT_*` environment variables. Unparseable
    /// values are logged and ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_MAX_INPUT_BYTES) {
            match raw.trim().parse::<usize>() {
                Ok(v) => {
                    self.limits.get_or_insert_with(Default::default).max_input_bytes = Some(v)
                }
                Err(e) => tracing::warn!(var = ENV_MAX_INPUT_BYTES, value = %raw, error = %e, "ignoring"),
            }
        }
        if let Some(raw) = lookup(ENV_STRATEGY_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(v) => {
                    self.pipeline
                        .get_or_insert_with(Default::default)
                        .strategy_timeout_secs = Some(v)
                }
                Err(e) => tracing::warn!(var = ENV_STRATEGY_TIMEOUT, value = %raw, error = %e, "ignoring"),
            }
        }
        self
    }

    /// Resolve against built-in defaults into a runnable [`PipelineConfig`].
    pub fn into_pipeline_config(self) -> Result<PipelineConfig, ConfigError> {
        let defaults = PipelineConfig::default();

        let limits = Limits {
            max_input_bytes: self
                .limits
                .and_then(|l| l.max_input_bytes)
                .unwrap_or(defaults.limits.max_input_bytes),
        };

        let mut builder = ValidatorConfigBuilder::new();
        if let Some(v) = self.validator {
            if let Some(n) = v.min_chars {
                builder = builder.min_chars(n);
            }
            if let Some(r) = v.min_printable_ratio {
                builder = builder.min_printable_ratio(r);
            }
            if let Some(n) = v.min_words {
                builder = builder.min_words(n);
            }
            if v.min_avg_word_len.is_some() || v.max_avg_word_len.is_some() {
                builder = builder.avg_word_len_range(
                    v.min_avg_word_len
                        .unwrap_or(crate::config::DEFAULT_MIN_AVG_WORD_LEN),
                    v.max_avg_word_len
                        .unwrap_or(crate::config::DEFAULT_MAX_AVG_WORD_LEN),
                );
            }
            if let Some(n) = v.min_alpha_word_len {
                builder = builder.min_alpha_word_len(n);
            }
            if let Some(patterns) = v.artifact_patterns {
                builder = builder.set_artifact_patterns(patterns);
            }
            for pattern in v.extra_artifact_patterns.unwrap_or_default() {
                builder = builder.add_artifact_pattern(pattern);
            }
        }
        let validator = builder.build()?;

        let extract = ExtractConfig {
            page_cap: self
                .extract
                .as_ref()
                .and_then(|e| e.page_cap)
                .unwrap_or(defaults.extract.page_cap),
            tj_word_gap: self
                .extract
                .as_ref()
                .and_then(|e| e.tj_word_gap)
                .unwrap_or(defaults.extract.tj_word_gap),
        };

        let strategy_timeout = self
            .pipeline
            .and_then(|p| p.strategy_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.strategy_timeout);

        let config = PipelineConfig {
            limits,
            validator,
            extract,
            strategy_timeout,
        };
        config.check()?;
        Ok(config)
    }
}
