//! In-memory store backing every trait in [`crate::store`].
//!
//! The test backend for the whole workspace, and a fixture store for hosts
//! that want to run the engines without real collaborators. Thread-safe.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::store::{ConnectionStore, CatalogStore, PreferenceStore, ReviewStore, UserStore};
use crate::types::{
    Connection, ConnectionSource, Degree, Endorsement, Provider, Review, ServiceOffering, User,
    UserPreferences,
};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    connections: Mutex<Vec<Connection>>,
    providers: Mutex<Vec<Provider>>,
    offerings: Mutex<Vec<ServiceOffering>>,
    reviews: Mutex<Vec<Review>>,
    endorsements: Mutex<Vec<Endorsement>>,
    preferences: Mutex<Vec<UserPreferences>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Seeding helpers ---

    pub fn add_user(&self, user: User) -> Uuid {
        let id = user.id;
        self.users.lock().unwrap().push(user);
        id
    }

    /// Add one directed first-degree edge.
    pub fn connect(&self, from: Uuid, to: Uuid, strength: f64) -> Uuid {
        let conn = Connection {
            id: Uuid::new_v4(),
            from_user_id: from,
            to_user_id: to,
            degree: Degree::First,
            source: ConnectionSource::Contacts,
            strength,
            created_at: Utc::now(),
        };
        let id = conn.id;
        self.connections.lock().unwrap().push(conn);
        id
    }

    /// Add a pair of directed edges, one each way.
    pub fn connect_mutual(&self, a: Uuid, b: Uuid, strength: f64) {
        self.connect(a, b, strength);
        self.connect(b, a, strength);
    }

    pub fn add_provider(&self, provider: Provider) -> Uuid {
        let id = provider.id;
        self.providers.lock().unwrap().push(provider);
        id
    }

    pub fn add_offering(&self, offering: ServiceOffering) -> Uuid {
        let id = offering.id;
        self.offerings.lock().unwrap().push(offering);
        id
    }

    pub fn add_review(&self, reviewer_id: Uuid, provider_id: Uuid, rating: f64) -> Uuid {
        let review = Review {
            id: Uuid::new_v4(),
            reviewer_id,
            provider_id,
            rating,
            text: None,
            created_at: Utc::now(),
        };
        let id = review.id;
        self.reviews.lock().unwrap().push(review);
        id
    }

    pub fn add_endorsement(&self, user_id: Uuid, provider_id: Uuid) -> Uuid {
        let endorsement = Endorsement {
            id: Uuid::new_v4(),
            user_id,
            provider_id,
            note: None,
            created_at: Utc::now(),
        };
        let id = endorsement.id;
        self.endorsements.lock().unwrap().push(endorsement);
        id
    }

    pub fn endorsement_count(&self) -> usize {
        self.endorsements.lock().unwrap().len()
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn connections_from(&self, user_id: Uuid) -> Result<Vec<Connection>> {
        Ok(self
            .connections
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.from_user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn provider(&self, provider_id: Uuid) -> Result<Option<Provider>> {
        Ok(self
            .providers
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == provider_id)
            .cloned())
    }

    async fn offering(&self, offering_id: Uuid) -> Result<Option<ServiceOffering>> {
        Ok(self
            .offerings
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == offering_id)
            .cloned())
    }

    async fn offerings_by_category(&self, category: &str) -> Result<Vec<ServiceOffering>> {
        Ok(self
            .offerings
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.category == category)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn reviews_for_provider(&self, provider_id: Uuid) -> Result<Vec<Review>> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn endorsements_for_provider(&self, provider_id: Uuid) -> Result<Vec<Endorsement>> {
        Ok(self
            .endorsements
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn append_endorsement(&self, endorsement: Endorsement) -> Result<()> {
        self.endorsements.lock().unwrap().push(endorsement);
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn preferences(&self, user_id: Uuid) -> Result<Option<UserPreferences>> {
        Ok(self
            .preferences
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn upsert_preferences(&self, prefs: UserPreferences) -> Result<()> {
        let mut all = self.preferences.lock().unwrap();
        match all.iter_mut().find(|p| p.user_id == prefs.user_id) {
            Some(existing) => *existing = prefs,
            None => all.push(prefs),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connections_are_directed() {
        let store = MemoryStore::new();
        let a = store.add_user(User::new("Ana"));
        let b = store.add_user(User::new("Ben"));
        store.connect(a, b, 0.8);

        let from_a = store.connections_from(a).await.unwrap();
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].to_user_id, b);

        let from_b = store.connections_from(b).await.unwrap();
        assert!(from_b.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_yields_empty_connections() {
        let store = MemoryStore::new();
        let conns = store.connections_from(Uuid::new_v4()).await.unwrap();
        assert!(conns.is_empty());
    }

    #[tokio::test]
    async fn duplicate_endorsements_are_kept() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let provider = Uuid::new_v4();
        for _ in 0..2 {
            store
                .append_endorsement(Endorsement {
                    id: Uuid::new_v4(),
                    user_id: user,
                    provider_id: provider,
                    note: None,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let all = store.endorsements_for_provider(provider).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn upsert_preferences_replaces_in_place() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let mut prefs = UserPreferences {
            user_id,
            dietary: Default::default(),
            budget: crate::types::BudgetPreferences {
                dining: crate::types::BudgetRange::usd(20.0, 50.0),
                transportation: crate::types::BudgetRange::usd(0.0, 30.0),
                services: crate::types::BudgetRange::usd(0.0, 100.0),
                flexibility: crate::types::BudgetFlexibility::Flexible,
            },
            transportation: crate::types::TransportationPreferences {
                preferred_services: vec![],
                share_rides_ok: true,
                max_walk_minutes: 10,
                accessibility_needs: vec![],
            },
            venue: Default::default(),
            scheduling: crate::types::SchedulingPreferences {
                preferred_meal_times: Default::default(),
                avoid_days: vec![],
                timezone: "America/Chicago".to_string(),
            },
            location: Default::default(),
            completeness_score: 10,
            last_updated: Utc::now(),
        };
        store.upsert_preferences(prefs.clone()).await.unwrap();

        prefs.completeness_score = 42;
        store.upsert_preferences(prefs).await.unwrap();

        let stored = store.preferences(user_id).await.unwrap().unwrap();
        assert_eq!(stored.completeness_score, 42);
    }
}
