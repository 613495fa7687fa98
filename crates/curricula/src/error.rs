#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    /// The model provider could not be reached or returned something unusable.
    #[error("External call failed: {0}")]
    ExternalCall(String),

    #[error("Model call timed out after {0} ms")]
    Timeout(u64),
}

impl Error {
    /// Whether the error came from the outbound model call, which is recovered by
    /// serving sample data.
    pub fn is_external_call(&self) -> bool {
        matches!(self, Error::ExternalCall(_) | Error::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_external_call() {
        assert!(Error::ExternalCall("connection refused".to_string()).is_external_call());
        assert!(Error::Timeout(500).is_external_call());
        assert!(!Error::Generic("bad".to_string()).is_external_call());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::Timeout(1500).to_string(),
            "Model call timed out after 1500 ms"
        );
        assert_eq!(
            Error::ExternalCall("status 502".to_string()).to_string(),
            "External call failed: status 502"
        );
    }
}
