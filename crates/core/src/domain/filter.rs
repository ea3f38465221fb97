use crate::domain::status::ReviewStatus;
use crate::domain::view::{Priority, RequestViewModel};

/// Listing filter. Empty fields match everything; upstream order is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub search: Option<String>,
    pub status: Option<ReviewStatus>,
    pub priority: Option<Priority>,
    pub limit: Option<usize>,
}

impl RequestFilter {
    pub fn matches(&self, request: &RequestViewModel) -> bool {
        let search_ok =
            self.search.as_deref().map_or(true, |needle| request.matches_search(needle));
        let status_ok = self.status.map_or(true, |status| request.status == status);
        let priority_ok = self.priority.map_or(true, |priority| request.priority == priority);

        search_ok && status_ok && priority_ok
    }

    pub fn apply<'a>(&self, requests: &'a [RequestViewModel]) -> Vec<&'a RequestViewModel> {
        let matching = requests.iter().filter(|request| self.matches(request));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}
