//! Local record of every decision the console has dispatched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::action::AdminAction;
use crate::domain::view::{RequestId, RequestViewModel};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

impl CommandId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CommandState {
    Pending,
    Confirmed,
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandEntry {
    pub command_id: CommandId,
    pub request_id: RequestId,
    pub action: AdminAction,
    pub state: CommandState,
    pub issued_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    /// Last confirmed view of the request before this command was issued.
    #[serde(skip)]
    pub prior: RequestViewModel,
}

impl CommandEntry {
    pub fn is_pending(&self) -> bool {
        self.state == CommandState::Pending
    }
}

#[derive(Clone, Debug, Default)]
pub struct CommandLog {
    entries: Vec<CommandEntry>,
}

impl CommandLog {
    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn get(&self, command_id: &CommandId) -> Option<&CommandEntry> {
        self.entries.iter().find(|entry| &entry.command_id == command_id)
    }

    pub fn has_pending(&self, request_id: &RequestId) -> bool {
        self.entries.iter().any(|entry| &entry.request_id == request_id && entry.is_pending())
    }

    pub fn for_request<'a>(
        &'a self,
        request_id: &'a RequestId,
    ) -> impl Iterator<Item = &'a CommandEntry> + 'a {
        self.entries.iter().filter(move |entry| &entry.request_id == request_id)
    }

    pub(crate) fn record(&mut self, entry: CommandEntry) {
        self.entries.push(entry);
    }

    /// Moves a pending entry to its final state. Returns the entry only if it
    /// was still pending.
    pub(crate) fn settle(
        &mut self,
        command_id: &CommandId,
        state: CommandState,
        settled_at: DateTime<Utc>,
    ) -> Option<&CommandEntry> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| &entry.command_id == command_id && entry.is_pending())?;
        entry.state = state;
        entry.settled_at = Some(settled_at);
        Some(entry)
    }
}
