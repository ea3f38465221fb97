use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["reviewdesk.toml", "config/reviewdesk.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    pub fetch_url: String,
    pub decision_url: String,
    pub timeout_secs: u64,
    pub auth_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub fetch_url: Option<String>,
    pub decision_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub session_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig {
                fetch_url: String::new(),
                decision_url: String::new(),
                timeout_secs: 30,
                auth_token: None,
            },
            session: SessionConfig { path: PathBuf::from(".reviewdesk/session.toml") },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(upstream) = patch.upstream {
            if let Some(fetch_url) = upstream.fetch_url {
                self.upstream.fetch_url = fetch_url;
            }
            if let Some(decision_url) = upstream.decision_url {
                self.upstream.decision_url = decision_url;
            }
            if let Some(timeout_secs) = upstream.timeout_secs {
                self.upstream.timeout_secs = timeout_secs;
            }
            if let Some(auth_token) = upstream.auth_token {
                self.upstream.auth_token = Some(auth_token.into());
            }
        }

        if let Some(session) = patch.session {
            if let Some(path) = session.path {
                self.session.path = path;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("REVIEWDESK_UPSTREAM_FETCH_URL") {
            self.upstream.fetch_url = value;
        }
        if let Some(value) = read_env("REVIEWDESK_UPSTREAM_DECISION_URL") {
            self.upstream.decision_url = value;
        }
        if let Some(value) = read_env("REVIEWDESK_UPSTREAM_TIMEOUT_SECS") {
            self.upstream.timeout_secs = parse_u64("REVIEWDESK_UPSTREAM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("REVIEWDESK_UPSTREAM_AUTH_TOKEN") {
            self.upstream.auth_token = Some(value.into());
        }

        if let Some(value) = read_env("REVIEWDESK_SESSION_PATH") {
            self.session.path = PathBuf::from(value);
        }

        let log_level =
            read_env("REVIEWDESK_LOGGING_LEVEL").or_else(|| read_env("REVIEWDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("REVIEWDESK_LOGGING_FORMAT").or_else(|| read_env("REVIEWDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(fetch_url) = overrides.fetch_url {
            self.upstream.fetch_url = fetch_url;
        }
        if let Some(decision_url) = overrides.decision_url {
            self.upstream.decision_url = decision_url;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.upstream.timeout_secs = timeout_secs;
        }
        if let Some(session_path) = overrides.session_path {
            self.session.path = session_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_upstream(&self.upstream)?;
        validate_session(&self.session)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_upstream(upstream: &UpstreamConfig) -> Result<(), ConfigError> {
    validate_url("upstream.fetch_url", &upstream.fetch_url)?;
    validate_url("upstream.decision_url", &upstream.decision_url)?;

    if upstream.timeout_secs == 0 || upstream.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "upstream.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    let blank_token = upstream
        .auth_token
        .as_ref()
        .is_some_and(|token| token.expose_secret().trim().is_empty());
    if blank_token {
        return Err(ConfigError::Validation(
            "upstream.auth_token must not be blank when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{key} is required (set it in reviewdesk.toml or via REVIEWDESK_{})",
            key.replace('.', "_").to_ascii_uppercase()
        )));
    }
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    if session.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("session.path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    upstream: Option<UpstreamPatch>,
    session: Option<SessionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamPatch {
    fetch_url: Option<String>,
    decision_url: Option<String>,
    timeout_secs: Option<u64>,
    auth_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const MANAGED_VARS: [&str; 10] = [
        "REVIEWDESK_UPSTREAM_FETCH_URL",
        "REVIEWDESK_UPSTREAM_DECISION_URL",
        "REVIEWDESK_UPSTREAM_TIMEOUT_SECS",
        "REVIEWDESK_UPSTREAM_AUTH_TOKEN",
        "REVIEWDESK_SESSION_PATH",
        "REVIEWDESK_LOGGING_LEVEL",
        "REVIEWDESK_LOGGING_FORMAT",
        "REVIEWDESK_LOG_LEVEL",
        "REVIEWDESK_LOG_FORMAT",
        "TEST_REVIEWDESK_TOKEN",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in MANAGED_VARS {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn set_valid_urls() {
        env::set_var("REVIEWDESK_UPSTREAM_FETCH_URL", "https://flows.example.test/fetch");
        env::set_var("REVIEWDESK_UPSTREAM_DECISION_URL", "https://flows.example.test/decide");
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("TEST_REVIEWDESK_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("reviewdesk.toml");
            fs::write(
                &path,
                r#"
[upstream]
fetch_url = "https://flows.example.test/fetch"
decision_url = "https://flows.example.test/decide"
auth_token = "${TEST_REVIEWDESK_TOKEN}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.upstream.auth_token.as_ref().map(|token| token.expose_secret())
                    == Some("token-from-env"),
                "auth token should be interpolated from environment",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        set_valid_urls();
        env::set_var("REVIEWDESK_LOG_LEVEL", "warn");
        env::set_var("REVIEWDESK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn primary_logging_env_names_win_over_aliases() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        set_valid_urls();
        env::set_var("REVIEWDESK_LOGGING_LEVEL", "debug");
        env::set_var("REVIEWDESK_LOG_LEVEL", "warn");
        env::set_var("REVIEWDESK_LOGGING_FORMAT", "json");
        env::set_var("REVIEWDESK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "debug", "logging level env var should win")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "logging format env var should win",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("REVIEWDESK_UPSTREAM_DECISION_URL", "https://env.example.test/decide");
        env::set_var("REVIEWDESK_UPSTREAM_TIMEOUT_SECS", "12");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("reviewdesk.toml");
            fs::write(
                &path,
                r#"
[upstream]
fetch_url = "https://file.example.test/fetch"
decision_url = "https://file.example.test/decide"
timeout_secs = 45

[session]
path = "from-file/session.toml"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    fetch_url: Some("https://override.example.test/fetch".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.upstream.fetch_url == "https://override.example.test/fetch",
                "override fetch url should win",
            )?;
            ensure(
                config.upstream.decision_url == "https://env.example.test/decide",
                "env decision url should win over file",
            )?;
            ensure(config.upstream.timeout_secs == 12, "env timeout should win over file")?;
            ensure(
                config.session.path == PathBuf::from("from-file/session.toml"),
                "file session path should win over default",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")
        })();

        clear_vars();
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("REVIEWDESK_UPSTREAM_FETCH_URL", "ftp://flows.example.test/fetch");
        env::set_var("REVIEWDESK_UPSTREAM_DECISION_URL", "https://flows.example.test/decide");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("upstream.fetch_url")
            );
            ensure(has_message, "validation failure should mention upstream.fetch_url")
        })();

        clear_vars();
        result
    }

    #[test]
    fn missing_urls_name_the_env_variable() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let message = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure".to_string()),
            Err(error) => error.to_string(),
        };
        ensure(
            message.contains("REVIEWDESK_UPSTREAM_FETCH_URL"),
            "missing url error should name the env variable",
        )
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        set_valid_urls();
        env::set_var("REVIEWDESK_UPSTREAM_TIMEOUT_SECS", "soon");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => ensure(
                key == "REVIEWDESK_UPSTREAM_TIMEOUT_SECS",
                "error should name the offending key",
            ),
            other => Err(format!("expected invalid env override, got {other:?}")),
        };

        clear_vars();
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        set_valid_urls();
        env::set_var("REVIEWDESK_UPSTREAM_AUTH_TOKEN", "super-secret-token");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("super-secret-token"), "debug output should not contain token")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars();
        result
    }
}
