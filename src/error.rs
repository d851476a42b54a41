//! Error types for disha-io

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// disha-io error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A blocking wait exceeded its deadline (echo never returned,
    /// conversion never completed, encoder target never reached)
    #[error("Timeout waiting for {0}")]
    Timeout(&'static str),

    /// More objects detected in one sweep than the record capacity allows
    #[error("Object capacity exceeded: more than {limit} objects in one sweep")]
    CapacityExceeded {
        /// Configured per-sweep object limit
        limit: usize,
    },

    /// Edge pair that cannot represent a physical echo
    #[error("Invalid capture: rising={rising}, falling={falling}, overflows={overflows}")]
    InvalidCapture {
        /// Rising-edge timestamp in timer ticks
        rising: u32,
        /// Falling-edge timestamp in timer ticks
        falling: u32,
        /// Timer overflows observed between the edges
        overflows: u32,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operation not supported
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}
