use reviewdesk_core::config::LoadOptions;
use reviewdesk_core::{
    load_snapshot, DomainError, Priority, RequestFilter, RequestViewModel, ReviewConsole,
    ReviewStatus,
};
use serde::Serialize;
use serde_json::json;

use crate::commands::{block_on, connect, feed_failure, CommandResult, EXIT_INVALID_INPUT};

#[derive(Clone, Debug, Default)]
pub struct ListArgs {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
    /// Emit full view models instead of summary rows.
    pub detailed: bool,
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    id: String,
    title: &'a str,
    requester: &'a str,
    created: String,
    status: ReviewStatus,
    priority: Priority,
    discount: String,
    tat: Option<String>,
    actionable: bool,
}

#[derive(Debug, Serialize)]
struct DetailedRow<'a> {
    #[serde(flatten)]
    request: &'a RequestViewModel,
    actionable: bool,
}

pub fn run(options: &LoadOptions, args: &ListArgs) -> CommandResult {
    let filter = match build_filter(args) {
        Ok(filter) => filter,
        Err(error) => {
            return CommandResult::failure(
                "requests",
                "invalid_input",
                error.to_string(),
                EXIT_INVALID_INPUT,
            );
        }
    };
    let context = match connect("requests", options) {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let snapshot = match block_on("requests", load_snapshot(&context.upstream, &context.session)) {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(error)) => return feed_failure("requests", &error),
        Err(failure) => return failure,
    };
    let skipped = snapshot.skipped.len();
    let console = ReviewConsole::from_snapshot(snapshot);
    let visible = console.filter(&filter);

    let rows = if args.detailed {
        serde_json::to_value(
            visible
                .iter()
                .map(|request| DetailedRow {
                    request,
                    actionable: console.is_actionable(&request.id),
                })
                .collect::<Vec<_>>(),
        )
    } else {
        serde_json::to_value(
            visible
                .iter()
                .map(|request| summarize(request, console.is_actionable(&request.id)))
                .collect::<Vec<_>>(),
        )
    };
    let rows = match rows {
        Ok(rows) => rows,
        Err(error) => {
            return CommandResult::failure("requests", "serialization", error.to_string(), 1);
        }
    };

    let mut message =
        format!("{} of {} requests shown", visible.len(), console.requests().len());
    if skipped > 0 {
        message.push_str(&format!(" ({skipped} malformed records skipped)"));
    }

    CommandResult::success_with_data(
        "requests",
        message,
        Some(json!({ "total": console.requests().len(), "skipped": skipped, "requests": rows })),
    )
}

fn build_filter(args: &ListArgs) -> Result<RequestFilter, DomainError> {
    Ok(RequestFilter {
        search: args.search.clone().filter(|search| !search.trim().is_empty()),
        status: args.status.as_deref().map(str::parse::<ReviewStatus>).transpose()?,
        priority: args.priority.as_deref().map(str::parse::<Priority>).transpose()?,
        limit: args.limit,
    })
}

fn summarize(request: &RequestViewModel, actionable: bool) -> SummaryRow<'_> {
    let discount_type = request.terms.discount_type.as_deref().unwrap_or("Unspecified");
    SummaryRow {
        id: request.id.display_label(),
        title: &request.title,
        requester: &request.requester,
        created: format!("{} {}", request.created_date, request.created_time),
        status: request.status,
        priority: request.priority,
        discount: format!("{discount_type}: {}", request.terms.discount_value.normalize()),
        tat: request.tat.map(|tat| tat.to_string()),
        actionable,
    }
}

#[cfg(test)]
mod tests {
    use reviewdesk_core::{Priority, ReviewStatus};

    use super::{build_filter, ListArgs};

    #[test]
    fn filter_arguments_are_parsed_case_insensitively() {
        let filter = build_filter(&ListArgs {
            status: Some("Pending".to_string()),
            priority: Some("HIGH".to_string()),
            search: Some("  ".to_string()),
            limit: Some(5),
            detailed: false,
        })
        .expect("filter");

        assert_eq!(filter.status, Some(ReviewStatus::Pending));
        assert_eq!(filter.priority, Some(Priority::High));
        assert_eq!(filter.search, None);
        assert_eq!(filter.limit, Some(5));
    }

    #[test]
    fn unknown_status_is_invalid_input() {
        let args = ListArgs { status: Some("archived".to_string()), ..ListArgs::default() };
        assert!(build_filter(&args).is_err());
    }
}
