use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The progress stream dropped or sent something unreadable before a terminal event.
    #[error("{0}")]
    Stream(String),
    /// The server reported that the analysis job itself failed.
    #[error("{0}")]
    Job(String),
    /// The job succeeded but the result document could not be retrieved.
    #[error("Analysis finished but the results could not be retrieved: {0}")]
    ResultFetch(String),
    #[error("Analysis result has no statistics block")]
    MissingStatistics,
    #[error("Invalid analysis result: {0}")]
    InvalidResult(String),
    #[error("Reading view failed to render: {0}")]
    Render(String),
    #[error("No analysis session found")]
    NoSession,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Preferences error: {0}")]
    Preferences(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// True for failures that end the current job and must be shown to the user.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClientError::Stream(_)
                | ClientError::Job(_)
                | ClientError::ResultFetch(_)
                | ClientError::MissingStatistics
                | ClientError::InvalidResult(_)
        )
    }
}

impl Serialize for ClientError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_message_passes_through_verbatim() {
        let err = ClientError::Job("File is empty".to_string());
        assert_eq!(err.to_string(), "File is empty");
        assert_eq!(serde_json::to_string(&err).unwrap(), "\"File is empty\"");
    }

    #[test]
    fn test_fetch_failure_is_distinct_from_job_failure() {
        let err = ClientError::ResultFetch("HTTP 500".to_string());
        assert!(err.to_string().starts_with("Analysis finished"));
        assert!(err.is_terminal());
        assert!(!ClientError::Preferences("x".into()).is_terminal());
    }
}
