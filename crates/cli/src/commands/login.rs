use reviewdesk_core::config::LoadOptions;
use reviewdesk_core::SessionStore;
use serde_json::json;
use tracing::info;

use crate::commands::{load_config, session_failure, CommandResult};

pub fn run(options: &LoadOptions, username: &str) -> CommandResult {
    let config = match load_config("login", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let store = SessionStore::new(&config.session.path);

    match store.login(username) {
        Ok(session) => {
            info!(
                event_name = "session.login",
                correlation_id = "cli",
                admin = session.username(),
                "admin session started"
            );
            CommandResult::success_with_data(
                "login",
                format!("logged in as `{}`", session.username()),
                Some(json!({
                    "username": session.username(),
                    "session_path": store.path().display().to_string(),
                })),
            )
        }
        Err(error) => session_failure("login", &error),
    }
}

pub fn logout(options: &LoadOptions) -> CommandResult {
    let config = match load_config("logout", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    match SessionStore::new(&config.session.path).logout() {
        Ok(true) => {
            info!(event_name = "session.logout", correlation_id = "cli", "admin session ended");
            CommandResult::success("logout", "logged out")
        }
        Ok(false) => CommandResult::success("logout", "no active session"),
        Err(error) => session_failure("logout", &error),
    }
}
