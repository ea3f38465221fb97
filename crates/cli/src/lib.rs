pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reviewdesk_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig};
use rust_decimal::Decimal;

use crate::commands::decide::Decision;
use crate::commands::requests::ListArgs;

#[derive(Debug, Parser)]
#[command(
    name = "reviewdesk",
    about = "Discount approval review console",
    long_about = "Review discount approval requests from the workflow backend and send admin decisions.",
    after_help = "Examples:\n  reviewdesk login --username ops.admin\n  reviewdesk requests --status pending --priority high\n  reviewdesk approve REQ-1042\n  reviewdesk modify 1042 --discount-type \"Rs 0.75 per kg\"\n  reviewdesk doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a reviewdesk.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the log level (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an admin session for the given username")]
    Login {
        #[arg(long)]
        username: String,
    },
    #[command(about = "End the current admin session")]
    Logout,
    #[command(about = "Fetch and list approval requests for the logged-in admin")]
    Requests {
        #[arg(long, help = "pending|approved|rejected|escalated|accepted")]
        status: Option<String>,
        #[arg(long, help = "low|medium|high")]
        priority: Option<String>,
        #[arg(long, help = "Case-insensitive match on id, title, requester and description")]
        search: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, help = "Emit full request records instead of summary rows")]
        json: bool,
    },
    #[command(about = "Accept a request as submitted")]
    Approve { id: String },
    #[command(about = "Reject a request with a reason")]
    Reject {
        id: String,
        #[arg(long)]
        reason: String,
    },
    #[command(about = "Accept a request with a changed discount scheme")]
    Modify {
        id: String,
        #[arg(long, help = "Re 1 per kg | Rs 0.75 per kg | Custom")]
        discount_type: String,
        #[arg(long, help = "Discount value, required for Custom")]
        discount_value: Option<Decimal>,
    },
    #[command(about = "Compute the turnaround between two upstream timestamps")]
    Tat { created: String, reviewed: String },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, session presence and upstream reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides { log_level: self.log_level.clone(), ..Default::default() },
        }
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logging(logging: &LoggingConfig) {
    use tracing::Level;

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::WARN);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config.logging);
    }

    let result = match cli.command {
        Command::Login { username } => commands::login::run(&options, &username),
        Command::Logout => commands::login::logout(&options),
        Command::Requests { status, priority, search, limit, json } => commands::requests::run(
            &options,
            &ListArgs { status, priority, search, limit, detailed: json },
        ),
        Command::Approve { id } => commands::decide::run(&options, &id, Decision::Approve),
        Command::Reject { id, reason } => {
            commands::decide::run(&options, &id, Decision::Reject { reason })
        }
        Command::Modify { id, discount_type, discount_value } => commands::decide::run(
            &options,
            &id,
            Decision::Modify { discount_type, discount_value },
        ),
        Command::Tat { created, reviewed } => commands::tat::run(&created, &reviewed),
        Command::Config => commands::config::run(&options),
        Command::Doctor { json } => commands::doctor::run(&options, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
