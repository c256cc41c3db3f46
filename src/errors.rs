use std::path::PathBuf;

/// Errors raised while matching, logging in to and capturing a book
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// No site variant accepts the URL (exit code 2)
    #[error("The input URL is not supported: {0}")]
    UnsupportedUrl(String),
    /// The viewer never reported a usable page count (exit code 3)
    #[error("Page count unavailable: {0}")]
    PageDiscoveryFailed(String),
    /// A single frame could not be fetched or decoded; the session skips it
    #[error("Failed to fetch page {index} ({url}): {reason}")]
    FrameFetchFailed {
        index: usize,
        url: String,
        reason: String,
    },
    /// Output or log directory could not be created (exit code 4)
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The site rejected the submitted credentials (exit code 5)
    #[error("Login failed: {0}")]
    LoginError(String),
    /// The captcha was still shown after the last answer (exit code 5)
    #[error("The captcha answer did not match")]
    CaptchaMismatch,
    /// A page script could not be evaluated
    #[error("Script evaluation failed: {0}")]
    ScriptEvaluationFailed(String),
    /// Configuration could not be parsed (exit code 6)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Generic error (exit code 1)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CaptureError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CaptureError::UnsupportedUrl(_) => 2,
            CaptureError::PageDiscoveryFailed(_) => 3,
            CaptureError::DirectoryCreateFailed { .. } => 4,
            CaptureError::LoginError(_) | CaptureError::CaptchaMismatch => 5,
            CaptureError::InvalidConfig(_) => 6,
            CaptureError::FrameFetchFailed { .. }
            | CaptureError::ScriptEvaluationFailed(_)
            | CaptureError::Other(_) => 1,
        }
    }

    /// Whether the error must end the whole process rather than the current URL
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CaptureError::DirectoryCreateFailed { .. } | CaptureError::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CaptureError::UnsupportedUrl("x".into()).exit_code(), 2);
        assert_eq!(CaptureError::PageDiscoveryFailed("x".into()).exit_code(), 3);
        assert_eq!(CaptureError::CaptchaMismatch.exit_code(), 5);
        assert_eq!(CaptureError::InvalidConfig("x".into()).exit_code(), 6);
        assert_eq!(
            CaptureError::Other(anyhow::anyhow!("boom")).exit_code(),
            1
        );
    }

    #[test]
    fn test_only_directory_and_config_errors_are_fatal() {
        let dir = CaptureError::DirectoryCreateFailed {
            path: PathBuf::from("/nonexistent/out"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(dir.is_fatal());
        assert!(dir.to_string().contains("/nonexistent/out"));

        assert!(!CaptureError::LoginError("bad password".into()).is_fatal());
        assert!(
            !CaptureError::FrameFetchFailed {
                index: 3,
                url: "https://example.com/3.jpg".into(),
                reason: "HTTP 404".into(),
            }
            .is_fatal()
        );
    }
}
