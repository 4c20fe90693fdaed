use thiserror::Error;

pub type Result<T> = std::result::Result<T, BeanwireError>;

/// Boxed error produced by proxied method calls and their advice.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum BeanwireError {
    #[error("Bean set is empty: a container needs at least one bean type")]
    EmptyBeanSet,

    #[error("Failed to instantiate bean '{type_name}': {message}")]
    BeanInstantiation { type_name: String, message: String },

    #[error("Cannot inject '{field}' of bean '{type_name}': {message}")]
    BeanAccess {
        type_name: String,
        field: String,
        message: String,
    },

    #[error("No bean assignable to type: {type_name}")]
    BeanNotFound { type_name: String },

    #[error("Ambiguous bean for type {type_name}: candidates [{candidates}]")]
    AmbiguousBean {
        type_name: String,
        candidates: String,
    },

    #[error("Bean {type_name} was released with its container")]
    BeanReleased { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Illegal transaction state: {0}")]
    IllegalTransactionState(String),

    #[error("Transaction '{name}' rolled back because it has been marked as rollback-only")]
    UnexpectedRollback { name: String },

    #[error("Nested transactions are not supported by {manager}")]
    NestedTransactionNotSupported { manager: String },

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Data access failure: {0}")]
    DataAccess(#[source] BoxError),

    #[error("Invalid configuration for '{key}': {message}")]
    Config { key: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BeanwireError {
    pub fn instantiation(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BeanInstantiation {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub fn not_found(type_name: impl Into<String>) -> Self {
        Self::BeanNotFound {
            type_name: type_name.into(),
        }
    }

    pub fn config(key: impl Into<String>, message: impl ToString) -> Self {
        Self::Config {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// True for the errors raised while building a container.
    pub fn is_container_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyBeanSet
                | Self::BeanInstantiation { .. }
                | Self::BeanAccess { .. }
                | Self::AmbiguousBean { .. }
        )
    }
}

impl From<serde_json::Error> for BeanwireError {
    fn from(err: serde_json::Error) -> Self {
        BeanwireError::config("json", err)
    }
}
