use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VistoriaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to process image: {0}")]
    ImageProcessing(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job '{0}' has not finished yet")]
    JobNotFinished(String),

    #[error("Invalid job payload for '{id}': {reason}")]
    InvalidPayload { id: String, reason: String },
}

/// Errors raised by domain rules (status vocabularies, lifecycle).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid {kind} value '{value}'")]
    InvalidStatus { kind: &'static str, value: String },

    #[error("Invalid inspection status transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("Inspection {0} not found")]
    InspectionNotFound(i64),

    #[error("No checklist template for '{0}'")]
    TemplateNotFound(String),
}

/// Errors from external AI collaborators.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Failed to resolve API key: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ProcessError),
}

pub type Result<T> = std::result::Result<T, VistoriaError>;
