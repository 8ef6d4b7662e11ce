use thiserror::Error;
use uuid::Uuid;

/// Core error taxonomy. Graph traversal over unknown users yields empty
/// results, and batch scoring omits unknown providers; only single,
/// caller-addressed lookups raise.
#[derive(Error, Debug)]
pub enum TrustMeshError {
    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    #[error("provider not found: {0}")]
    ProviderNotFound(Uuid),

    #[error("no preferences found for any group member")]
    NoPreferencesFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
