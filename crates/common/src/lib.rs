/// Common error types shared by the dropper client crates

/// Error type for dropper client operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic error with message
    #[error("{0}")]
    Generic(String),

    /// Caller lacks administrator rights for a privileged operation
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Referenced claim (or other record) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Escrow cannot cover a withdrawal or a claim payout
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Operation attempted before the contract address was known
    #[error("Contract not instantiated: {0}")]
    NotInstantiated(String),

    /// Arguments rejected before or during execution
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transaction rejected by the chain for any other reason
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Transport or RPC failure talking to the node
    #[error("Chain error: {0}")]
    Chain(String),

    /// Configuration or build artifact problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Create a new generic error
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }

    /// Create a new authorization error
    pub fn authorization<S: Into<String>>(msg: S) -> Self {
        Error::Authorization(msg.into())
    }

    /// Create a new not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a new insufficient balance error
    pub fn insufficient_balance<S: Into<String>>(msg: S) -> Self {
        Error::InsufficientBalance(msg.into())
    }

    /// Create a new not instantiated error
    pub fn not_instantiated<S: Into<String>>(contract_name: S) -> Self {
        Error::NotInstantiated(contract_name.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a new reverted transaction error
    pub fn reverted<S: Into<String>>(msg: S) -> Self {
        Error::Reverted(msg.into())
    }

    /// Create a new chain error
    pub fn chain<S: Into<String>>(msg: S) -> Self {
        Error::Chain(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Error::Serialization(msg.into())
    }

    /// Whether the chain (or ledger) rejected the operation, as opposed to a
    /// client-side or transport failure
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::Authorization(_)
                | Error::NotFound(_)
                | Error::InsufficientBalance(_)
                | Error::Validation(_)
                | Error::Reverted(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
