//! `approve`, `reject` and `modify`: load the current snapshot, then send one
//! decision through the dispatcher.

use std::sync::Arc;

use reviewdesk_core::config::LoadOptions;
use reviewdesk_core::{
    load_snapshot, ActionDispatcher, ApplicationError, DispatchError, DomainError, RequestId,
    RequestViewModel, ReviewConsole, SystemClock,
};
use reviewdesk_upstream::HttpUpstream;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::commands::{
    block_on, connect, feed_failure, gateway_class, invocation_id, CommandResult,
    EXIT_INVALID_INPUT,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { reason: String },
    Modify { discount_type: String, discount_value: Option<Decimal> },
}

impl Decision {
    fn command(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject { .. } => "reject",
            Self::Modify { .. } => "modify",
        }
    }
}

pub fn run(options: &LoadOptions, raw_id: &str, decision: Decision) -> CommandResult {
    let command = decision.command();
    let request_id = match RequestId::parse(raw_id) {
        Ok(request_id) => request_id,
        Err(error) => return dispatch_failure(command, DispatchError::Domain(error)),
    };
    let context = match connect(command, options) {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let outcome = block_on(command, async move {
        let snapshot = load_snapshot(&context.upstream, &context.session)
            .await
            .map_err(|error| feed_failure(command, &error))?;
        let console = Arc::new(RwLock::new(ReviewConsole::from_snapshot(snapshot)));
        let dispatcher =
            ActionDispatcher::new(console, context.upstream, context.session, SystemClock);
        Ok::<_, CommandResult>(send(&dispatcher, &request_id, &decision).await)
    });

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(failure)) | Err(failure) => return failure,
    };

    match result {
        Ok(updated) => {
            let message = format!(
                "{command} confirmed for {}; status is now {}",
                updated.id.display_label(),
                updated.status
            );
            match serde_json::to_value(&updated) {
                Ok(data) => CommandResult::success_with_data(command, message, Some(data)),
                Err(_) => CommandResult::success(command, message),
            }
        }
        Err(error) => dispatch_failure(command, error),
    }
}

async fn send(
    dispatcher: &ActionDispatcher<HttpUpstream, SystemClock>,
    request_id: &RequestId,
    decision: &Decision,
) -> Result<RequestViewModel, DispatchError> {
    match decision {
        Decision::Approve => dispatcher.approve(request_id).await,
        Decision::Reject { reason } => dispatcher.reject(request_id, reason).await,
        Decision::Modify { discount_type, discount_value } => {
            dispatcher.modify_with_scheme(request_id, discount_type, *discount_value).await
        }
    }
}

/// Gateway failures keep the dispatched command's id as their correlation id.
fn dispatch_failure(command: &str, error: DispatchError) -> CommandResult {
    let (error_class, exit_code, correlation_id) = match &error {
        DispatchError::Domain(domain) => {
            (domain_class(domain), EXIT_INVALID_INPUT, invocation_id())
        }
        DispatchError::Gateway { command_id, source } => {
            let (error_class, exit_code) = gateway_class(source);
            (error_class, exit_code, command_id.to_string())
        }
    };
    let detail = error.notice();
    let interface = ApplicationError::from(error).into_interface(correlation_id);
    CommandResult::interface_failure(command, error_class, detail, exit_code, &interface)
}

fn domain_class(error: &DomainError) -> &'static str {
    match error {
        DomainError::InvalidInput(_) => "invalid_input",
        DomainError::UnknownRequest(_) => "unknown_request",
        DomainError::AlreadyActed(_) | DomainError::DispatchPending(_) => "not_actionable",
        DomainError::InvariantViolation(_) => "invariant_violation",
    }
}
