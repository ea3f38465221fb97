//! Sends admin decisions to the backend and reconciles the console with the
//! outcome.
//!
//! The console lock is held only to begin and to settle a command, never
//! across the network call, and each settlement applies to whatever the
//! console holds at that moment.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::clock::{ActionStamp, Clock, SystemClock};
use crate::command_log::CommandId;
use crate::console::ReviewConsole;
use crate::domain::action::{AdminAction, ModifyProposal};
use crate::domain::view::{RequestId, RequestViewModel};
use crate::errors::{ApplicationError, DomainError};
use crate::gateway::{DecisionGateway, DecisionPayload, GatewayError};
use crate::session::Session;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("decision {command_id} was not applied: {source}")]
    Gateway { command_id: CommandId, source: GatewayError },
}

impl DispatchError {
    /// Operator-facing notification text.
    pub fn notice(&self) -> String {
        match self {
            Self::Domain(error) => error.to_string(),
            Self::Gateway { source, .. } => source.notice(),
        }
    }
}

impl From<DispatchError> for ApplicationError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Domain(error) => Self::Domain(error),
            DispatchError::Gateway { source, .. } => Self::Upstream(source.to_string()),
        }
    }
}

pub struct ActionDispatcher<G, C = SystemClock> {
    console: Arc<RwLock<ReviewConsole>>,
    gateway: G,
    session: Session,
    clock: C,
}

impl<G, C> ActionDispatcher<G, C>
where
    G: DecisionGateway,
    C: Clock,
{
    pub fn new(
        console: Arc<RwLock<ReviewConsole>>,
        gateway: G,
        session: Session,
        clock: C,
    ) -> Self {
        Self { console, gateway, session, clock }
    }

    pub fn console(&self) -> &Arc<RwLock<ReviewConsole>> {
        &self.console
    }

    pub async fn approve(&self, request_id: &RequestId) -> Result<RequestViewModel, DispatchError> {
        self.dispatch(request_id, AdminAction::Approve).await
    }

    pub async fn reject(
        &self,
        request_id: &RequestId,
        reason: &str,
    ) -> Result<RequestViewModel, DispatchError> {
        let action = AdminAction::reject(reason)?;
        self.dispatch(request_id, action).await
    }

    pub async fn modify(
        &self,
        request_id: &RequestId,
        discount_type: &str,
        discount_value: Decimal,
    ) -> Result<RequestViewModel, DispatchError> {
        let action = AdminAction::modify(discount_type, discount_value)?;
        self.dispatch(request_id, action).await
    }

    /// Resolves one of the offered discount schemes against the request's
    /// current terms before dispatching.
    pub async fn modify_with_scheme(
        &self,
        request_id: &RequestId,
        scheme_label: &str,
        custom_value: Option<Decimal>,
    ) -> Result<RequestViewModel, DispatchError> {
        let terms = {
            let console = self.console.read().await;
            console
                .get(request_id)
                .map(|request| request.terms.clone())
                .ok_or_else(|| DomainError::UnknownRequest(request_id.clone()))?
        };
        let action = ModifyProposal::resolve(&terms, scheme_label, custom_value)?.into_action()?;
        self.dispatch(request_id, action).await
    }

    pub async fn dispatch(
        &self,
        request_id: &RequestId,
        action: AdminAction,
    ) -> Result<RequestViewModel, DispatchError> {
        let now = self.clock.now();
        let stamp = ActionStamp::at(now);
        let payload = DecisionPayload::new(request_id, self.session.username(), &stamp, &action)?;

        let ticket = self.console.write().await.begin(request_id, action, now)?;
        info!(
            event_name = "review.action.dispatched",
            correlation_id = %ticket.command_id,
            request_id = %request_id,
            action = ticket.action.label(),
            admin = self.session.username(),
            "admin decision dispatched"
        );

        match self.gateway.submit(&payload).await {
            Ok(ack) => {
                let updated = self.console.write().await.confirm(
                    &ticket,
                    self.session.username(),
                    &stamp,
                    self.clock.now(),
                )?;
                info!(
                    event_name = "review.action.confirmed",
                    correlation_id = %ticket.command_id,
                    request_id = %request_id,
                    status = updated.status.as_str(),
                    backend_message = ack.message.as_deref().unwrap_or(""),
                    "admin decision confirmed"
                );
                Ok(updated)
            }
            Err(source) => {
                warn!(
                    event_name = "review.action.failed",
                    correlation_id = %ticket.command_id,
                    request_id = %request_id,
                    connectivity = source.is_connectivity(),
                    error = %source,
                    "admin decision failed"
                );
                self.console.write().await.fail(&ticket, source.to_string(), self.clock.now())?;
                Err(DispatchError::Gateway { command_id: ticket.command_id, source })
            }
        }
    }
}
