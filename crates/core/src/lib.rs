pub mod clock;
pub mod command_log;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod feed;
pub mod gateway;
pub mod session;

pub use clock::{ActionStamp, Clock, FixedClock, SystemClock};
pub use command_log::{CommandEntry, CommandId, CommandLog, CommandState};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use console::{CommandTicket, ReviewConsole};
pub use dispatch::{ActionDispatcher, DispatchError};
pub use domain::action::{AdminAction, DiscountScheme, ModifyProposal};
pub use domain::filter::RequestFilter;
pub use domain::status::{AdminDecision, ReviewStatus};
pub use domain::tat::Turnaround;
pub use domain::terms::{EffectiveTerms, TermSource};
pub use domain::timestamp::{DisplayStamp, LiteralTimestamp};
pub use domain::upstream::UpstreamRequest;
pub use domain::view::{Priority, RequestId, RequestViewModel};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use feed::{load_snapshot, normalize_feed, FeedError, FeedSnapshot, SkippedRecord};
pub use gateway::{DecisionAck, DecisionGateway, DecisionPayload, GatewayError, RequestFeed};
pub use session::{Session, SessionError, SessionStore};
