pub mod action;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod webhook;

pub use config::DeployConfig;
pub use dispatch::{DeployRequest, Dispatcher};
pub use error::{DeployError, ErrorKind};
pub use webhook::{DeployEvent, EventEnvelope, PullRequestEvent, QueryParams};
