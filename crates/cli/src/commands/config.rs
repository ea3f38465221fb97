use std::env;
use std::fs;
use std::path::Path;

use reviewdesk_core::config::{resolve_config_path, AppConfig, LoadOptions};
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigLine {
    key: &'static str,
    value: String,
    source: String,
}

struct Sources {
    doc: Option<Value>,
    path: Option<String>,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_path = resolve_config_path(options.config_path.as_deref());
    let sources = Sources {
        doc: load_config_file_doc(config_path.as_deref()),
        path: config_path.map(|path| path.display().to_string()),
    };
    let lines = effective_lines(&config, options, &sources);

    match serde_json::to_value(&lines) {
        Ok(data) => CommandResult::success_with_data(
            "config",
            "effective config (source precedence: override > env > file > default)",
            Some(data),
        ),
        Err(error) => CommandResult::failure("config", "serialization", error.to_string(), 1),
    }
}

fn effective_lines(
    config: &AppConfig,
    options: &LoadOptions,
    sources: &Sources,
) -> Vec<ConfigLine> {
    let overrides = &options.overrides;
    let auth_token = if config.upstream.auth_token.is_some() { "<redacted>" } else { "<unset>" };

    vec![
        line(
            "upstream.fetch_url",
            config.upstream.fetch_url.clone(),
            sources.attribute(
                "upstream.fetch_url",
                overrides.fetch_url.is_some(),
                &["REVIEWDESK_UPSTREAM_FETCH_URL"],
            ),
        ),
        line(
            "upstream.decision_url",
            config.upstream.decision_url.clone(),
            sources.attribute(
                "upstream.decision_url",
                overrides.decision_url.is_some(),
                &["REVIEWDESK_UPSTREAM_DECISION_URL"],
            ),
        ),
        line(
            "upstream.timeout_secs",
            config.upstream.timeout_secs.to_string(),
            sources.attribute(
                "upstream.timeout_secs",
                overrides.timeout_secs.is_some(),
                &["REVIEWDESK_UPSTREAM_TIMEOUT_SECS"],
            ),
        ),
        line(
            "upstream.auth_token",
            auth_token.to_string(),
            sources.attribute("upstream.auth_token", false, &["REVIEWDESK_UPSTREAM_AUTH_TOKEN"]),
        ),
        line(
            "session.path",
            config.session.path.display().to_string(),
            sources.attribute(
                "session.path",
                overrides.session_path.is_some(),
                &["REVIEWDESK_SESSION_PATH"],
            ),
        ),
        line(
            "logging.level",
            config.logging.level.clone(),
            sources.attribute(
                "logging.level",
                overrides.log_level.is_some(),
                &["REVIEWDESK_LOGGING_LEVEL", "REVIEWDESK_LOG_LEVEL"],
            ),
        ),
        line(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            sources.attribute(
                "logging.format",
                false,
                &["REVIEWDESK_LOGGING_FORMAT", "REVIEWDESK_LOG_FORMAT"],
            ),
        ),
    ]
}

fn line(key: &'static str, value: String, source: String) -> ConfigLine {
    ConfigLine { key, value, source }
}

impl Sources {
    fn attribute(&self, key_path: &str, overridden: bool, env_keys: &[&str]) -> String {
        if overridden {
            return "override (command line)".to_string();
        }

        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self.path.as_deref().unwrap_or("config file");
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
