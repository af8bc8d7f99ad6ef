use std::error::Error;
use std::fmt;

/// Error type for desyncx
#[derive(Debug)]
pub enum SmugglexError {
    /// I/O errors (socket, file)
    Io(String),
    /// TLS connection errors
    Tls(String),
    /// URL parsing errors
    UrlParse(String),
    /// Timeout errors
    Timeout(String),
    /// Upstream HTTP CONNECT proxy handshake errors
    Proxy(String),
    /// Invalid input parameters
    InvalidInput(String),
}

impl fmt::Display for SmugglexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmugglexError::Io(msg) => write!(f, "I/O error: {}", msg),
            SmugglexError::Tls(msg) => write!(f, "TLS error: {}", msg),
            SmugglexError::UrlParse(msg) => write!(f, "URL parsing error: {}", msg),
            SmugglexError::Timeout(msg) => write!(f, "Timeout error: {}", msg),
            SmugglexError::Proxy(msg) => write!(f, "Proxy error: {}", msg),
            SmugglexError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl Error for SmugglexError {}

impl From<std::io::Error> for SmugglexError {
    fn from(err: std::io::Error) -> Self {
        SmugglexError::Io(err.to_string())
    }
}

impl From<url::ParseError> for SmugglexError {
    fn from(err: url::ParseError) -> Self {
        SmugglexError::UrlParse(err.to_string())
    }
}

impl From<rustls::Error> for SmugglexError {
    fn from(err: rustls::Error) -> Self {
        SmugglexError::Tls(err.to_string())
    }
}

impl From<rustls::pki_types::InvalidDnsNameError> for SmugglexError {
    fn from(err: rustls::pki_types::InvalidDnsNameError) -> Self {
        SmugglexError::Tls(format!("Invalid DNS name: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for SmugglexError {
    fn from(_err: tokio::time::error::Elapsed) -> Self {
        SmugglexError::Timeout("Request timed out".to_string())
    }
}

impl From<&str> for SmugglexError {
    fn from(err: &str) -> Self {
        SmugglexError::InvalidInput(err.to_string())
    }
}

impl SmugglexError {
    /// True for errors that represent a timeout rather than a hard transport failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SmugglexError::Timeout(_))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SmugglexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_include_kind() {
        assert_eq!(
            SmugglexError::Io("boom".into()).to_string(),
            "I/O error: boom"
        );
        assert_eq!(
            SmugglexError::Proxy("no 200".into()).to_string(),
            "Proxy error: no 200"
        );
        assert_eq!(
            SmugglexError::UrlParse("bad".into()).to_string(),
            "URL parsing error: bad"
        );
    }

    #[test]
    fn is_timeout_only_true_for_timeout_variant() {
        assert!(SmugglexError::Timeout("x".into()).is_timeout());
        assert!(!SmugglexError::Io("x".into()).is_timeout());
        assert!(!SmugglexError::Proxy("x".into()).is_timeout());
    }

    #[test]
    fn from_str_is_invalid_input() {
        let err: SmugglexError = "bad thing".into();
        assert!(matches!(err, SmugglexError::InvalidInput(_)));
    }

    #[test]
    fn from_io_error_wraps_message() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: SmugglexError = io_err.into();
        assert!(matches!(err, SmugglexError::Io(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
