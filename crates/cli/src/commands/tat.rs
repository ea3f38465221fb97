use reviewdesk_core::{DisplayStamp, Turnaround};
use serde_json::json;

use crate::commands::CommandResult;

/// Turnaround between two raw upstream timestamps. Unparseable input yields
/// the same placeholder text the console shows, not a failure.
pub fn run(created_at: &str, reviewed_at: &str) -> CommandResult {
    let tat = Turnaround::between(created_at, reviewed_at);
    let created = DisplayStamp::from_raw(created_at);

    CommandResult::success_with_data(
        "tat",
        tat.to_string(),
        Some(json!({
            "created_at": created_at,
            "reviewed_at": reviewed_at,
            "created_date": created.date,
            "created_time": created.time,
            "tat": tat,
            "is_duration": tat.is_duration(),
        })),
    )
}
