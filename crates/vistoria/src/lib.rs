pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod model;
pub mod processing;
pub mod sanitize;
pub mod secrets;
pub mod telemetry;
pub mod worker;

pub use ai::{AiClient, HttpObjectDetector};
pub use config::{load_config, load_config_from_str, Config};
pub use db::{Database, DatabaseError};
pub use error::{
    AiError, ConfigError, DomainError, ProcessError, Result, VistoriaError, WorkerError,
};
pub use extract::DocumentTextExtractor;
pub use processing::{Collaborators, JobRunner, ProcessingContext, ProcessingSettings};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use telemetry::{init_logging, LogFormat};
pub use worker::{BatchDispatcher, JobKind, JobProgressBroadcaster, JobStatusView, WorkerPool};
