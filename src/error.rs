use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Service boundary errors
// ---------------------------------------------------------------------------

/// The dataset file could not be read. Callers fall back to an empty dataset.
#[derive(Debug, Error)]
#[error("failed to load dataset from {}: {source:#}", path.display())]
pub struct DataLoadError {
    pub path: PathBuf,
    #[source]
    pub source: anyhow::Error,
}

/// Cleaning, fitting or persisting the price model failed.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("dataset is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("need at least {needed} complete rows to train, found {found}")]
    InsufficientRows { needed: usize, found: usize },

    #[error("failed to write model artifact to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read model artifact from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact could not be (de)serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A geocoding lookup failed. Never shown to the user; the fallback chain
/// absorbs it.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("geocoder request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("geocoder returned HTTP {0}")]
    Status(u16),

    #[error("geocoder returned no results")]
    NoResults,

    #[error("geocoder returned an unusable coordinate: {0}")]
    BadCoordinate(String),
}

/// Talking to the chat completion endpoint failed.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("chat is not configured: set {0}")]
    NotConfigured(&'static str),

    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion response was malformed: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = TrainingError::MissingColumn("price");
        assert_eq!(err.to_string(), "dataset is missing required column 'price'");

        let err = TrainingError::InsufficientRows { needed: 2, found: 1 };
        assert!(err.to_string().contains("found 1"));

        let err = CompletionError::Status {
            status: 401,
            body: "unauthorized".into(),
        };
        assert_eq!(err.to_string(), "completion API error 401: unauthorized");
    }

    #[test]
    fn data_load_error_includes_path() {
        let err = DataLoadError {
            path: PathBuf::from("missing.csv"),
            source: anyhow::anyhow!("no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("missing.csv"));
        assert!(msg.contains("no such file"));
    }
}
