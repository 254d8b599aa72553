use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Kind of transport-level failure reported by the feed client.
///
/// Only the four "flaky network" kinds are retried; anything else
/// surfaces immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Timeout,
    ConnectionReset,
    ConnectionRefused,
    HostNotFound,
    Other,
}

impl NetworkErrorKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, NetworkErrorKind::Other)
    }
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::ConnectionReset => "connection-reset",
            NetworkErrorKind::ConnectionRefused => "connection-refused",
            NetworkErrorKind::HostNotFound => "host-not-found",
            NetworkErrorKind::Other => "other",
        };
        write!(f, "{}", code)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot reach database: {0}")]
    Connectivity(String),

    #[error("network error ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    #[error("upstream feed error: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("trend aggregation failed: {0}")]
    Aggregation(String),

    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config file: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network {
            kind: classify_reqwest(&err),
            message: err.to_string(),
        }
    }
}

/// Map a reqwest failure onto the retry taxonomy. Timeouts are flagged
/// directly by reqwest; reset/refused come from the underlying io error;
/// DNS failures only show up in the hyper error message.
fn classify_reqwest(err: &reqwest::Error) -> NetworkErrorKind {
    if err.is_timeout() {
        return NetworkErrorKind::Timeout;
    }

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionReset => return NetworkErrorKind::ConnectionReset,
                std::io::ErrorKind::ConnectionRefused => return NetworkErrorKind::ConnectionRefused,
                std::io::ErrorKind::TimedOut => return NetworkErrorKind::Timeout,
                _ => break,
            }
        }
        if cause.to_string().contains("dns error") {
            return NetworkErrorKind::HostNotFound;
        }
        source = cause.source();
    }

    if err.is_connect() {
        NetworkErrorKind::ConnectionRefused
    } else {
        NetworkErrorKind::Other
    }
}
