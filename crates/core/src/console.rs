//! In-memory console state: the request list, the acted set and the command
//! log. All mutation goes through [`ReviewConsole::begin`],
//! [`ReviewConsole::confirm`] and [`ReviewConsole::fail`], which always work on
//! the current list rather than a captured copy.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::clock::ActionStamp;
use crate::command_log::{CommandEntry, CommandId, CommandLog, CommandState};
use crate::domain::action::AdminAction;
use crate::domain::filter::RequestFilter;
use crate::domain::view::{RequestId, RequestViewModel};
use crate::errors::DomainError;
use crate::feed::FeedSnapshot;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandTicket {
    pub command_id: CommandId,
    pub request_id: RequestId,
    pub action: AdminAction,
}

#[derive(Clone, Debug, Default)]
pub struct ReviewConsole {
    requests: Vec<RequestViewModel>,
    acted: HashSet<RequestId>,
    log: CommandLog,
}

impl ReviewConsole {
    /// Requests that already carry an admin status start out acted.
    pub fn new(requests: Vec<RequestViewModel>) -> Self {
        let acted = requests
            .iter()
            .filter(|request| request.has_admin_action())
            .map(|request| request.id.clone())
            .collect();
        Self { requests, acted, log: CommandLog::default() }
    }

    pub fn from_snapshot(snapshot: FeedSnapshot) -> Self {
        Self::new(snapshot.requests)
    }

    pub fn requests(&self) -> &[RequestViewModel] {
        &self.requests
    }

    pub fn get(&self, request_id: &RequestId) -> Option<&RequestViewModel> {
        self.requests.iter().find(|request| &request.id == request_id)
    }

    pub fn filter(&self, filter: &RequestFilter) -> Vec<&RequestViewModel> {
        filter.apply(&self.requests)
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn is_acted(&self, request_id: &RequestId) -> bool {
        self.acted.contains(request_id)
    }

    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.log.has_pending(request_id)
    }

    /// Whether accept/reject/modify controls should be offered.
    pub fn is_actionable(&self, request_id: &RequestId) -> bool {
        self.get(request_id).is_some() && !self.is_acted(request_id) && !self.is_pending(request_id)
    }

    pub fn begin(
        &mut self,
        request_id: &RequestId,
        action: AdminAction,
        issued_at: DateTime<Utc>,
    ) -> Result<CommandTicket, DomainError> {
        let prior = self
            .get(request_id)
            .cloned()
            .ok_or_else(|| DomainError::UnknownRequest(request_id.clone()))?;
        if self.is_acted(request_id) {
            return Err(DomainError::AlreadyActed(request_id.clone()));
        }
        if self.is_pending(request_id) {
            return Err(DomainError::DispatchPending(request_id.clone()));
        }

        let ticket = CommandTicket {
            command_id: CommandId::generate(),
            request_id: request_id.clone(),
            action,
        };
        self.log.record(CommandEntry {
            command_id: ticket.command_id.clone(),
            request_id: ticket.request_id.clone(),
            action: ticket.action.clone(),
            state: CommandState::Pending,
            issued_at,
            settled_at: None,
            prior,
        });

        Ok(ticket)
    }

    /// Applies a decision the backend accepted and marks the request acted.
    pub fn confirm(
        &mut self,
        ticket: &CommandTicket,
        admin_username: &str,
        stamp: &ActionStamp,
        settled_at: DateTime<Utc>,
    ) -> Result<RequestViewModel, DomainError> {
        self.log.settle(&ticket.command_id, CommandState::Confirmed, settled_at).ok_or_else(
            || not_pending(ticket),
        )?;

        let request = self
            .requests
            .iter_mut()
            .find(|request| request.id == ticket.request_id)
            .ok_or_else(|| DomainError::UnknownRequest(ticket.request_id.clone()))?;
        request.record_admin_action(
            &ticket.action,
            admin_username,
            &stamp.reviewed_at,
            &stamp.acted_at,
        );
        let updated = request.clone();

        self.acted.insert(ticket.request_id.clone());
        Ok(updated)
    }

    /// Records a failed dispatch and restores the last confirmed view of the
    /// request, leaving it actionable again.
    pub fn fail(
        &mut self,
        ticket: &CommandTicket,
        reason: impl Into<String>,
        settled_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let prior = self
            .log
            .settle(&ticket.command_id, CommandState::Failed { reason: reason.into() }, settled_at)
            .map(|entry| entry.prior.clone())
            .ok_or_else(|| not_pending(ticket))?;

        if let Some(request) =
            self.requests.iter_mut().find(|request| request.id == ticket.request_id)
        {
            *request = prior;
        }
        Ok(())
    }
}

fn not_pending(ticket: &CommandTicket) -> DomainError {
    DomainError::InvariantViolation(format!(
        "command `{}` for request `{}` is not pending",
        ticket.command_id, ticket.request_id
    ))
}
