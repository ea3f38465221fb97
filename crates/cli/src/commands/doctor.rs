use reviewdesk_core::config::{AppConfig, LoadOptions};
use reviewdesk_core::gateway::RequestFeed;
use reviewdesk_core::{normalize_feed, Session, SessionStore};
use reviewdesk_upstream::HttpUpstream;
use serde::Serialize;

use crate::commands::{block_on, CommandResult, EXIT_CONFIG, EXIT_SESSION, EXIT_UPSTREAM};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
    #[serde(skip)]
    exit_code: u8,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = report
        .checks
        .iter()
        .find(|check| check.status == CheckStatus::Fail)
        .map_or(0, |check| check.exit_code);

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(pass("config_validation", "configuration loaded and validated"));
            match check_session(&config) {
                Ok((check, session)) => {
                    checks.push(check);
                    checks.push(check_upstream(&config, &session));
                }
                Err(check) => {
                    checks.push(check);
                    checks.push(skipped("upstream_reachability", "no active session"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
                exit_code: EXIT_CONFIG,
            });
            checks.push(skipped("session_presence", "configuration did not load"));
            checks.push(skipped("upstream_reachability", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_session(config: &AppConfig) -> Result<(DoctorCheck, Session), DoctorCheck> {
    let store = SessionStore::new(&config.session.path);
    match store.require() {
        Ok(session) => {
            let details = format!(
                "logged in as `{}` ({})",
                session.username(),
                store.path().display()
            );
            Ok((pass("session_presence", details), session))
        }
        Err(error) => Err(DoctorCheck {
            name: "session_presence",
            status: CheckStatus::Fail,
            details: error.to_string(),
            exit_code: EXIT_SESSION,
        }),
    }
}

fn check_upstream(config: &AppConfig, session: &Session) -> DoctorCheck {
    let upstream = match HttpUpstream::from_config(&config.upstream) {
        Ok(upstream) => upstream,
        Err(error) => return upstream_failure(error.to_string()),
    };

    let outcome = block_on("doctor", async { upstream.fetch(session.username()).await });
    match outcome {
        Ok(Ok(raw)) => match normalize_feed(&raw) {
            Ok(snapshot) => pass(
                "upstream_reachability",
                format!(
                    "fetched {} requests from `{}`",
                    snapshot.requests.len(),
                    upstream.fetch_url()
                ),
            ),
            Err(error) => upstream_failure(error.notice()),
        },
        Ok(Err(error)) => upstream_failure(error.to_string()),
        Err(_) => upstream_failure("failed to initialize async runtime".to_string()),
    }
}

fn pass(name: &'static str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Pass, details: details.into(), exit_code: 0 }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: format!("skipped because {reason}"),
        exit_code: 0,
    }
}

fn upstream_failure(details: String) -> DoctorCheck {
    DoctorCheck {
        name: "upstream_reachability",
        status: CheckStatus::Fail,
        details,
        exit_code: EXIT_UPSTREAM,
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
