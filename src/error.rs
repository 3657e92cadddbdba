/// Failures raised by a translation oracle
///
/// These are transport-level failures: the oracle could not be reached or
/// refused the request. A response that arrives but cannot be decoded is not
/// an `OracleError`; it is handed to the reconciler as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Missing or invalid provider configuration (API key, URL)
    ConfigError(String),
    /// Network failure while talking to the provider
    NetworkError(String),
    /// The provider answered with a non-success status
    ServiceError(String),
    /// Locale tag with invalid characters
    InvalidLocale(String),
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::ConfigError(msg) => write!(f, "Oracle configuration error: {}", msg),
            OracleError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            OracleError::ServiceError(msg) => write!(f, "Translation service error: {}", msg),
            OracleError::InvalidLocale(msg) => write!(f, "Invalid locale: {}", msg),
        }
    }
}

impl std::error::Error for OracleError {}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        OracleError::NetworkError(err.to_string())
    }
}

/// Result type for oracle calls
pub type OracleResult<T> = Result<T, OracleError>;

/// Run-level errors of the translation pipeline
///
/// Reconciliation anomalies never show up here; they are absorbed per chunk
/// and reported through [`crate::reconcile::Anomaly`].
#[derive(Debug)]
pub enum LebabError {
    /// The document could not be read; nothing was dispatched
    Extraction(String),
    /// Transport failure that the configured policy did not absorb
    Oracle { chunk: usize, source: OracleError },
    /// Invalid pipeline configuration
    Config(String),
    /// Loading or saving a document failed
    Io(std::io::Error),
    /// A document file could not be decoded or encoded
    Format(String),
    /// The run was cancelled before all chunks were translated
    Cancelled { completed: usize, total: usize },
}

impl std::fmt::Display for LebabError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LebabError::Extraction(msg) => write!(f, "Extraction error: {}", msg),
            LebabError::Oracle { chunk, source } => {
                write!(f, "Oracle failure on chunk {}: {}", chunk, source)
            }
            LebabError::Config(msg) => write!(f, "Configuration error: {}", msg),
            LebabError::Io(err) => write!(f, "I/O error: {}", err),
            LebabError::Format(msg) => write!(f, "Document format error: {}", msg),
            LebabError::Cancelled { completed, total } => write!(
                f,
                "Run cancelled after {} of {} chunks; document left untouched",
                completed, total
            ),
        }
    }
}

impl std::error::Error for LebabError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LebabError::Oracle { source, .. } => Some(source),
            LebabError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LebabError {
    fn from(err: std::io::Error) -> Self {
        LebabError::Io(err)
    }
}

impl From<serde_json::Error> for LebabError {
    fn from(err: serde_json::Error) -> Self {
        LebabError::Format(err.to_string())
    }
}

/// Result type for pipeline operations
pub type LebabResult<T> = Result<T, LebabError>;
