pub mod config;
pub mod decide;
pub mod doctor;
pub mod login;
pub mod requests;
pub mod tat;

use std::future::Future;

use anyhow::Context;
use reviewdesk_core::config::{AppConfig, LoadOptions};
use reviewdesk_core::{
    ApplicationError, CommandId, FeedError, GatewayError, InterfaceError, Session, SessionError,
    SessionStore,
};
use reviewdesk_upstream::HttpUpstream;
use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_SESSION: u8 = 3;
pub const EXIT_UPSTREAM: u8 = 4;
pub const EXIT_REJECTED: u8 = 5;
pub const EXIT_INVALID_INPUT: u8 = 6;
const EXIT_RUNTIME: u8 = 1;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            user_message: None,
            correlation_id: None,
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            user_message: None,
            correlation_id: None,
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure carrying the interface layer's user-safe text and correlation
    /// id next to the operator detail in `message`.
    pub fn interface_failure(
        command: &str,
        error_class: &str,
        detail: impl Into<String>,
        exit_code: u8,
        error: &InterfaceError,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: detail.into(),
            user_message: Some(error.user_message().to_string()),
            correlation_id: Some(error.correlation_id().to_string()),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// Correlation id for failures raised before any decision command exists.
pub fn invocation_id() -> String {
    CommandId::generate().to_string()
}

/// Configuration, session and upstream client shared by the commands that
/// talk to the backend.
pub struct CommandContext {
    pub config: AppConfig,
    pub session: Session,
    pub upstream: HttpUpstream,
}

pub fn load_config(command: &str, options: &LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| {
        let detail = error.to_string();
        let interface =
            ApplicationError::Configuration(detail.clone()).into_interface(invocation_id());
        CommandResult::interface_failure(
            command,
            "config_validation",
            detail,
            EXIT_CONFIG,
            &interface,
        )
    })
}

pub fn connect(command: &str, options: &LoadOptions) -> Result<CommandContext, CommandResult> {
    let config = load_config(command, options)?;
    let session = SessionStore::new(&config.session.path)
        .require()
        .map_err(|error| session_failure(command, &error))?;
    let upstream = HttpUpstream::from_config(&config.upstream).map_err(|error| {
        let detail = error.to_string();
        let interface =
            ApplicationError::Configuration(detail.clone()).into_interface(invocation_id());
        CommandResult::interface_failure(
            command,
            "upstream_client",
            detail,
            EXIT_UPSTREAM,
            &interface,
        )
    })?;

    Ok(CommandContext { config, session, upstream })
}

pub fn session_failure(command: &str, error: &SessionError) -> CommandResult {
    let (error_class, exit_code) = match error {
        SessionError::BlankUsername => ("invalid_input", EXIT_INVALID_INPUT),
        _ => ("session", EXIT_SESSION),
    };
    let detail = error.to_string();
    let interface = ApplicationError::Session(detail.clone()).into_interface(invocation_id());
    CommandResult::interface_failure(command, error_class, detail, exit_code, &interface)
}

pub fn feed_failure(command: &str, error: &FeedError) -> CommandResult {
    let (error_class, exit_code) = match error {
        FeedError::Rejected { .. } => ("backend_rejected", EXIT_REJECTED),
        FeedError::Gateway(gateway) => gateway_class(gateway),
        FeedError::MissingData { .. } | FeedError::MalformedShape(_) => {
            ("upstream_failure", EXIT_UPSTREAM)
        }
    };
    let interface = ApplicationError::Upstream(error.to_string()).into_interface(invocation_id());
    CommandResult::interface_failure(command, error_class, error.notice(), exit_code, &interface)
}

pub fn gateway_class(error: &GatewayError) -> (&'static str, u8) {
    match error {
        GatewayError::Network(_) => ("upstream_unreachable", EXIT_UPSTREAM),
        GatewayError::Malformed(_) => ("upstream_failure", EXIT_UPSTREAM),
        GatewayError::Rejected { .. } | GatewayError::Status { .. } => {
            ("backend_rejected", EXIT_REJECTED)
        }
    }
}

/// Drives one async operation on a dedicated current-thread runtime.
pub fn block_on<F: Future>(command: &str, future: F) -> Result<F::Output, CommandResult> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize async runtime")
        .map(|runtime| runtime.block_on(future))
        .map_err(|error| {
            CommandResult::failure(command, "runtime", format!("{error:#}"), EXIT_RUNTIME)
        })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
