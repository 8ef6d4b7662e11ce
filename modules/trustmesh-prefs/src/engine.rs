use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use trustmesh_common::{
    BudgetFlexibility, BudgetPreferences, BudgetRange, DietaryPreferences, LocationPreferences,
    PreferenceCompleteness, PreferenceStore, PreferenceUpdate, SchedulingPreferences,
    TransportationPreferences, TrustMeshError, UserPreferences, VenuePreferences,
};

use crate::completeness;

// System defaults for a lazily created profile. The completeness rubric
// treats a value still at its default as "not yet customized".
pub(crate) const DEFAULT_DINING_MAX: f64 = 50.0;
pub(crate) const DEFAULT_TRANSPORT_MAX: f64 = 30.0;
pub(crate) const DEFAULT_MAX_WALK_MINUTES: u32 = 10;

/// Stores and merges per-user preference profiles and derives completeness.
#[derive(Clone)]
pub struct PreferenceEngine {
    pub(crate) store: Arc<dyn PreferenceStore>,
}

impl PreferenceEngine {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<UserPreferences>, TrustMeshError> {
        Ok(self.store.preferences(user_id).await?)
    }

    /// Merge a partial update into the user's profile, creating it from
    /// system defaults on first write.
    ///
    /// The merge is per-section and shallow: a section present in the
    /// partial replaces that section wholesale, absent sections survive.
    /// `completeness_score` and `last_updated` are recomputed here and are
    /// never caller-settable.
    pub async fn update(
        &self,
        user_id: Uuid,
        update: PreferenceUpdate,
    ) -> Result<UserPreferences, TrustMeshError> {
        let mut prefs = match self.store.preferences(user_id).await? {
            Some(existing) => existing,
            None => default_preferences(user_id),
        };

        if let Some(dietary) = update.dietary {
            prefs.dietary = dietary;
        }
        if let Some(budget) = update.budget {
            prefs.budget = budget;
        }
        if let Some(transportation) = update.transportation {
            prefs.transportation = transportation;
        }
        if let Some(venue) = update.venue {
            prefs.venue = venue;
        }
        if let Some(scheduling) = update.scheduling {
            prefs.scheduling = scheduling;
        }
        if let Some(location) = update.location {
            prefs.location = location;
        }

        prefs.completeness_score = completeness::assess(&prefs).overall_score;
        prefs.last_updated = Utc::now();

        self.store.upsert_preferences(prefs.clone()).await?;
        debug!(%user_id, completeness = prefs.completeness_score, "Preferences updated");
        Ok(prefs)
    }

    /// Score how complete a profile is, with follow-up prompts for the
    /// weakest sections.
    pub fn completeness(&self, prefs: &UserPreferences) -> PreferenceCompleteness {
        completeness::assess(prefs)
    }
}

/// The documented default profile used on lazy creation.
pub fn default_preferences(user_id: Uuid) -> UserPreferences {
    UserPreferences {
        user_id,
        dietary: DietaryPreferences::default(),
        budget: BudgetPreferences {
            dining: BudgetRange::usd(20.0, DEFAULT_DINING_MAX),
            transportation: BudgetRange::usd(0.0, DEFAULT_TRANSPORT_MAX),
            services: BudgetRange::usd(0.0, 100.0),
            flexibility: BudgetFlexibility::Flexible,
        },
        transportation: TransportationPreferences {
            preferred_services: vec!["uber".to_string(), "lyft".to_string()],
            share_rides_ok: true,
            max_walk_minutes: DEFAULT_MAX_WALK_MINUTES,
            accessibility_needs: vec![],
        },
        venue: VenuePreferences::default(),
        scheduling: SchedulingPreferences {
            preferred_meal_times: Default::default(),
            avoid_days: vec![],
            timezone: "America/Chicago".to_string(),
        },
        location: LocationPreferences {
            max_travel_minutes: 30,
            ..Default::default()
        },
        completeness_score: 0,
        last_updated: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustmesh_common::MemoryStore;

    fn engine(store: &Arc<MemoryStore>) -> PreferenceEngine {
        PreferenceEngine::new(store.clone())
    }

    #[tokio::test]
    async fn get_absent_profile_is_none() {
        let store = Arc::new(MemoryStore::new());
        assert!(engine(&store).get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn first_update_creates_from_defaults() {
        let store = Arc::new(MemoryStore::new());
        let user_id = Uuid::new_v4();

        let prefs = engine(&store)
            .update(
                user_id,
                PreferenceUpdate {
                    dietary: Some(DietaryPreferences {
                        allergies: vec!["peanuts".to_string()],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(prefs.dietary.allergies, vec!["peanuts"]);
        // Untouched sections came from the default profile.
        assert_eq!(prefs.budget.dining.max, DEFAULT_DINING_MAX);
        assert_eq!(prefs.transportation.preferred_services, vec!["uber", "lyft"]);
        assert_eq!(prefs.scheduling.timezone, "America/Chicago");
    }

    #[tokio::test]
    async fn budget_update_round_trips_and_leaves_other_sections() {
        let store = Arc::new(MemoryStore::new());
        let user_id = Uuid::new_v4();
        let engine = engine(&store);

        engine
            .update(
                user_id,
                PreferenceUpdate {
                    dietary: Some(DietaryPreferences {
                        restrictions: vec!["vegetarian".to_string()],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let budget = BudgetPreferences {
            dining: BudgetRange::usd(35.0, 80.0),
            transportation: BudgetRange::usd(0.0, 25.0),
            services: BudgetRange::usd(0.0, 150.0),
            flexibility: BudgetFlexibility::Strict,
        };
        engine
            .update(
                user_id,
                PreferenceUpdate {
                    budget: Some(budget.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = engine.get(user_id).await.unwrap().unwrap();
        assert_eq!(stored.budget, budget);
        assert_eq!(stored.dietary.restrictions, vec!["vegetarian"]);
    }

    #[tokio::test]
    async fn sections_replace_wholesale_not_field_by_field() {
        let store = Arc::new(MemoryStore::new());
        let user_id = Uuid::new_v4();
        let engine = engine(&store);

        engine
            .update(
                user_id,
                PreferenceUpdate {
                    dietary: Some(DietaryPreferences {
                        restrictions: vec!["kosher".to_string()],
                        allergies: vec!["shellfish".to_string()],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // A dietary section without allergies wipes the earlier allergies:
        // the section is replaced, not deep-merged.
        let prefs = engine
            .update(
                user_id,
                PreferenceUpdate {
                    dietary: Some(DietaryPreferences {
                        restrictions: vec!["kosher".to_string()],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(prefs.dietary.allergies.is_empty());
    }

    #[tokio::test]
    async fn completeness_is_recomputed_on_every_update() {
        let store = Arc::new(MemoryStore::new());
        let user_id = Uuid::new_v4();
        let engine = engine(&store);

        let bare = engine
            .update(user_id, PreferenceUpdate::default())
            .await
            .unwrap();
        let richer = engine
            .update(
                user_id,
                PreferenceUpdate {
                    venue: Some(VenuePreferences {
                        ambiance_preferences: vec!["lively".to_string()],
                        seating_preferences: vec!["patio".to_string()],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(richer.completeness_score > bare.completeness_score);
    }
}
