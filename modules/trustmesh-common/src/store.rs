//! Collaborator store interfaces.
//!
//! The core has no persistence of its own; hosts inject these behind
//! `Arc<dyn …>`. Traits return `anyhow::Result` so implementations can
//! surface backend errors without coupling the core to a driver error type.
//! Implemented by whatever the host runs and by `MemoryStore` (tests).

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{
    Connection, Endorsement, Provider, Review, ServiceOffering, User, UserPreferences,
};

/// Directed social-connection edges. Only first-degree edges are stored.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// All stored edges leaving `user_id`. Unknown users yield an empty set;
    /// absence of a node is not exceptional in a social graph.
    async fn connections_from(&self, user_id: Uuid) -> Result<Vec<Connection>>;
}

/// Basic identity records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user(&self, user_id: Uuid) -> Result<Option<User>>;
}

/// Providers and the offerings they sell.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn provider(&self, provider_id: Uuid) -> Result<Option<Provider>>;

    async fn offering(&self, offering_id: Uuid) -> Result<Option<ServiceOffering>>;

    async fn offerings_by_category(&self, category: &str) -> Result<Vec<ServiceOffering>>;
}

/// Ratings and informal vouches tied to (reviewer, provider) pairs.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn reviews_for_provider(&self, provider_id: Uuid) -> Result<Vec<Review>>;

    async fn endorsements_for_provider(&self, provider_id: Uuid) -> Result<Vec<Endorsement>>;

    /// Append-only; duplicates from the same user are allowed.
    async fn append_endorsement(&self, endorsement: Endorsement) -> Result<()>;
}

/// Structured preference profiles, one per user.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn preferences(&self, user_id: Uuid) -> Result<Option<UserPreferences>>;

    /// Last-writer-wins single-record upsert.
    async fn upsert_preferences(&self, prefs: UserPreferences) -> Result<()>;
}
