//! Configuration for the Arbiter resolution engine: resolver policy flags, logging, TOML loading
//! and tracing initialisation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once, OnceLock};

use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

mod diagnostics;
mod schema;

pub use diagnostics::{ConfigDiagnostics, ConfigWarning};
pub use schema::json_schema;

/// Top-level `arbiter.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct ArbiterConfig {
    /// Overload-resolution policy.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Global logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which parameter types are erased when checking two methods for a name clash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClashErasure {
    /// Erase the inherited member's parameters after substituting the supertype's arguments
    /// (`AA<T>.test(T)` inherited through `AA<N>` erases to `test(N)`).
    #[default]
    Member,
    /// Erase the declaration as written (`AA<T>.test(T)` always erases to `test(Object)`).
    Declared,
}

/// How a generic candidate is compared during most-specific selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenericSpecificity {
    /// Compare the formals as instantiated for the call site.
    #[default]
    Instantiated,
    /// Infer the other candidate's type arguments from this candidate's formals.
    Inferred,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct CacheConfig {
    /// Memoise resolution results per call site.
    #[serde(default = "CacheConfig::default_enabled")]
    pub enabled: bool,

    /// Number of independently locked shards.
    #[serde(default = "CacheConfig::default_shards")]
    #[schemars(range(min = 1))]
    pub shards: usize,
}

impl CacheConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_shards() -> usize {
        16
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            shards: Self::default_shards(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct ResolverConfig {
    /// When several equally specific candidates remain, keep the one declared in the most derived
    /// type.
    #[serde(default = "ResolverConfig::default_prefer_most_derived")]
    pub prefer_most_derived: bool,

    #[serde(default)]
    pub clash_erasure: ClashErasure,

    #[serde(default)]
    pub generic_specificity: GenericSpecificity,

    /// Nesting depth at which least-upper-bound computation stops expanding type arguments.
    #[serde(default = "ResolverConfig::default_lub_depth")]
    pub lub_depth: usize,

    /// Worker threads used by batch resolution. Unset uses the global rayon pool.
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub parallelism: Option<usize>,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl ResolverConfig {
    fn default_prefer_most_derived() -> bool {
        true
    }

    fn default_lub_depth() -> usize {
        2
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            prefer_most_derived: Self::default_prefer_most_derived(),
            clash_erasure: ClashErasure::default(),
            generic_specificity: GenericSpecificity::default(),
            lub_depth: Self::default_lub_depth(),
            parallelism: None,
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level for all Arbiter crates.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file path. If the file cannot be opened, file logging is disabled
    /// while stderr logging stays active.
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is treated as an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective `EnvFilter`.
    ///
    /// `level` may be a simple level (`info`, `debug`, ...) or a full `EnvFilter` directive
    /// string such as `info,arbiter.resolve=trace`. A non-empty `RUST_LOG` is merged in after the
    /// configured directives.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

/// Strip user-provided scalar values from a TOML/serde error message.
///
/// `toml::de::Error::message()` still embeds values (`invalid type: string "x", expected a
/// boolean`) and user-written keys (`unknown variant `x``); both are replaced with `<redacted>`.
fn sanitize_toml_error_message(message: &str) -> String {
    static QUOTED_STRING_RE: OnceLock<regex::Regex> = OnceLock::new();
    static SINGLE_QUOTED_STRING_RE: OnceLock<regex::Regex> = OnceLock::new();
    static BACKTICKED_VALUE_RE: OnceLock<regex::Regex> = OnceLock::new();

    // Escaped quotes (`\"`) may appear inside the quoted value.
    let re = QUOTED_STRING_RE.get_or_init(|| {
        regex::Regex::new(r#""(?:\\.|[^"\\])*""#).expect("quoted-string regex should compile")
    });
    let mut out = re.replace_all(message, r#""<redacted>""#).into_owned();

    let re_single = SINGLE_QUOTED_STRING_RE.get_or_init(|| {
        regex::Regex::new(r#"'(?:\\.|[^'\\])*'"#)
            .expect("single-quoted-string regex should compile")
    });
    out = re_single.replace_all(&out, "'<redacted>'").into_owned();

    // `missing field `foo`` names a schema field and is kept; the backticked segment right after
    // `unknown field`/`unknown variant`/`invalid type: <kind>`/`invalid value: <kind>` is user input.
    let re_backticked = BACKTICKED_VALUE_RE.get_or_init(|| {
        regex::Regex::new(
            r"(unknown field |unknown variant |invalid (?:type|value): [a-z ]+ )`[^`]*`",
        )
        .expect("backticked-value regex should compile")
    });
    re_backticked
        .replace_all(&out, "${1}`<redacted>`")
        .into_owned()
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` includes a snippet of the source text; keep only the message.
        ConfigError::Toml(sanitize_toml_error_message(err.message()))
    }
}

impl ArbiterConfig {
    /// Load a config file from TOML. Unknown keys are logged as warnings.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let (config, diagnostics) = Self::load_from_path_with_diagnostics(path)?;
        diagnostics.log(&path.display().to_string());
        Ok(config)
    }

    /// Load a config file from TOML and return diagnostics (unknown keys, recoverable values).
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str_with_diagnostics(&text)
    }

    /// Load a config from a TOML string. Unknown keys are logged as warnings.
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let (config, diagnostics) = Self::load_from_str_with_diagnostics(text)?;
        diagnostics.log("<string>");
        Ok(config)
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (mut config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<ArbiterConfig>(text)?;

        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        diagnostics.warnings.extend(config.normalize());

        Ok((config, diagnostics))
    }

    /// Replace values that cannot be honoured with their nearest valid setting.
    fn normalize(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.resolver.cache.shards == 0 {
            warnings.push(ConfigWarning::InvalidValue {
                toml_path: "resolver.cache.shards".to_owned(),
                message: "must be >= 1; using 1".to_owned(),
            });
            self.resolver.cache.shards = 1;
        }

        if self.resolver.parallelism == Some(0) {
            warnings.push(ConfigWarning::InvalidValue {
                toml_path: "resolver.parallelism".to_owned(),
                message: "must be >= 1; using the global thread pool".to_owned(),
            });
            self.resolver.parallelism = None;
        }

        let normalized = LoggingConfig::normalize_level_directives(&self.logging.level);
        if tracing_subscriber::EnvFilter::try_new(&normalized).is_err() {
            warnings.push(ConfigWarning::LoggingLevelInvalid {
                value: self.logging.level.clone(),
            });
            self.logging.level = LoggingConfig::default_level();
        }

        warnings
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

static TRACING_INIT: Once = Once::new();

/// Install a global `tracing` subscriber configured from `config`.
///
/// Only the first call has an effect; later calls (and calls after another subscriber was set)
/// are no-ops, so tests and embedders may call it freely.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        let mut make_writer = if config.stderr {
            // `TestWriter` keeps `cargo test` output capture working in debug builds.
            if cfg!(debug_assertions) {
                BoxMakeWriter::new(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
            } else {
                BoxMakeWriter::new(std::io::stderr)
            }
        } else {
            BoxMakeWriter::new(std::io::sink)
        };

        let file = config
            .file
            .as_ref()
            .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok());
        let file_open_failed = config.file.is_some() && file.is_none();
        if let Some(file) = file {
            make_writer = BoxMakeWriter::new(make_writer.and(Mutex::new(file)));
        }

        let result = if config.json {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(make_writer)
                .with_ansi(false)
                .try_init()
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(make_writer)
                .with_ansi(false)
                .try_init()
        };

        if result.is_ok() && file_open_failed {
            if let Some(path) = config.file.as_ref() {
                tracing::warn!(
                    target: "arbiter.config",
                    path = %path.display(),
                    "failed to open log file; file logging disabled"
                );
            }
        }
    });
}
