use std::fmt;

use serde::de::DeserializeOwned;

/// Non-fatal findings produced while loading an `arbiter.toml`.
///
/// Callers always get an `ArbiterConfig` when deserialization succeeds; these describe input that
/// was ignored or replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys present in the input that the schema does not know, as dotted paths
    /// (`resolver.cache.enabeld`).
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty()
    }

    pub(crate) fn log(&self, source: &str) {
        for key in &self.unknown_keys {
            tracing::warn!(target: "arbiter.config", source, key = %key, "unknown config key ignored");
        }
        for warning in &self.warnings {
            tracing::warn!(target: "arbiter.config", source, "{warning}");
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    InvalidValue { toml_path: String, message: String },
    LoggingLevelInvalid { value: String },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::InvalidValue { toml_path, message } => {
                write!(f, "{toml_path}: {message}")
            }
            ConfigWarning::LoggingLevelInvalid { .. } => {
                f.write_str("logging.level is not a valid filter; using \"info\"")
            }
        }
    }
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(normalize_serde_ignored_path(path));
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

fn normalize_serde_ignored_path(path: serde_ignored::Path) -> String {
    // `serde_ignored` renders root paths with a leading `.`.
    path.to_string().trim_start_matches('.').to_owned()
}
