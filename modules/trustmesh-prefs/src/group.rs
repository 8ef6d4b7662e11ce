//! Group aggregation, conflict detection, and search-filter generation.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use trustmesh_common::{
    BudgetFlexibility, BudgetRange, ConflictType, GeoPoint, GroupBudget, GroupPreferences,
    PreferenceConflict, SearchFilters, TrustMeshError, UserPreferences,
};

use crate::engine::PreferenceEngine;

/// Budget spread (highest member max minus lowest) that reads as a conflict
/// when at least one member is strict about it.
const BUDGET_SPREAD_CONFLICT: f64 = 30.0;

/// A cuisine score above this reads as "loves", below its negation "hates".
const STRONG_OPINION: f64 = 0.5;

/// Fixed search radius around a group's centroid, in miles.
const GROUP_RADIUS_MILES: f64 = 10.0;

impl PreferenceEngine {
    /// Aggregate the profiles of a group into shared constraints and
    /// averaged soft scores for one outing. Recomputed per request.
    ///
    /// Hard constraints are the set union across members: excluding one
    /// person's allergy must never happen, so union (not intersection) is
    /// the only safe policy. The budget envelope is capped by the most
    /// budget-constrained member, never averaged.
    pub async fn aggregate_group(
        &self,
        user_ids: &[Uuid],
        category: &str,
    ) -> Result<GroupPreferences, TrustMeshError> {
        if user_ids.is_empty() {
            return Err(TrustMeshError::InvalidInput(
                "group aggregation needs at least one user".to_string(),
            ));
        }

        let mut members = Vec::new();
        for user_id in user_ids {
            if let Some(prefs) = self.store.preferences(*user_id).await? {
                members.push(prefs);
            }
        }
        if members.is_empty() {
            return Err(TrustMeshError::NoPreferencesFound);
        }

        let required_restrictions = union(members.iter().flat_map(|p| &p.dietary.restrictions));
        let required_allergen_free = union(members.iter().flat_map(|p| &p.dietary.allergies));
        let required_accessibility = union(members.iter().flat_map(|p| {
            p.transportation
                .accessibility_needs
                .iter()
                .chain(&p.venue.accessibility_needs)
        }));

        let min = members
            .iter()
            .map(|p| p.budget.dining.min)
            .fold(f64::INFINITY, f64::min);
        let max = members
            .iter()
            .map(|p| p.budget.dining.max)
            .fold(f64::INFINITY, f64::min);

        let conflicts = detect_conflicts(&members, category);

        info!(
            members = members.len(),
            conflicts = conflicts.len(),
            category,
            "Aggregated group preferences"
        );

        Ok(GroupPreferences {
            user_ids: user_ids.to_vec(),
            required_restrictions,
            required_allergen_free,
            required_accessibility,
            budget_range: GroupBudget {
                min,
                max,
                per_person: max,
            },
            cuisine_scores: aggregate_cuisine_scores(&members),
            ambiance_scores: aggregate_ambiance_scores(&members),
            conflicts,
            computed_at: Utc::now(),
        })
    }

    /// Provider-search filters for one user: home location with a
    /// travel-minutes-derived radius, and the category's budget envelope.
    /// An absent profile yields empty filters.
    pub async fn generate_search_filters(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> Result<SearchFilters, TrustMeshError> {
        let Some(prefs) = self.store.preferences(user_id).await? else {
            return Ok(SearchFilters::default());
        };

        let mut filters = SearchFilters {
            category: Some(category.to_string()),
            ..Default::default()
        };

        if let Some(home) = prefs.location.home {
            filters.location = Some(home);
            // Rough miles-per-travel-minute estimate.
            filters.radius_miles = Some(f64::from(prefs.location.max_travel_minutes) / 2.0);
        }

        if category == "dining" {
            filters.price_range = Some(prefs.budget.dining.clone());
        }

        Ok(filters)
    }

    /// Search filters for a group: centroid of the members' home locations
    /// (arithmetic mean, acceptable at city scale but not geodesically
    /// correct) with a fixed radius, plus the aggregated group budget.
    pub async fn generate_group_search_filters(
        &self,
        user_ids: &[Uuid],
        category: &str,
    ) -> Result<SearchFilters, TrustMeshError> {
        let group = self.aggregate_group(user_ids, category).await?;

        let mut filters = SearchFilters {
            category: Some(category.to_string()),
            price_range: Some(BudgetRange::usd(
                group.budget_range.min,
                group.budget_range.max,
            )),
            ..Default::default()
        };

        let mut homes = Vec::new();
        for user_id in user_ids {
            if let Some(prefs) = self.store.preferences(*user_id).await? {
                if let Some(home) = prefs.location.home {
                    homes.push(home);
                }
            }
        }
        if !homes.is_empty() {
            filters.location = Some(centroid(&homes));
            filters.radius_miles = Some(GROUP_RADIUS_MILES);
        }

        Ok(filters)
    }
}

/// Flag preference clashes a venue choice cannot paper over.
pub fn detect_conflicts(members: &[UserPreferences], _category: &str) -> Vec<PreferenceConflict> {
    let mut conflicts = Vec::new();

    // Budget: a wide spread only matters when someone cannot flex.
    let strict: Vec<Uuid> = members
        .iter()
        .filter(|p| p.budget.flexibility == BudgetFlexibility::Strict)
        .map(|p| p.user_id)
        .collect();
    let lowest_max = members
        .iter()
        .map(|p| p.budget.dining.max)
        .fold(f64::INFINITY, f64::min);
    let highest_max = members
        .iter()
        .map(|p| p.budget.dining.max)
        .fold(f64::NEG_INFINITY, f64::max);

    if highest_max - lowest_max > BUDGET_SPREAD_CONFLICT && !strict.is_empty() {
        conflicts.push(PreferenceConflict {
            conflict_type: ConflictType::Budget,
            description: format!(
                "Budget range varies significantly (${lowest_max} - ${highest_max})"
            ),
            affected_users: strict,
            suggestions: vec![
                format!(
                    "Consider venues in the ${}-{} range",
                    lowest_max,
                    lowest_max + 15.0
                ),
                "Some members may need to splurge a bit".to_string(),
            ],
        });
    }

    conflicts.extend(cuisine_conflicts(members));
    conflicts
}

/// Cuisines one member loves (> 0.5) and another hates (< -0.5). Both
/// thresholds are strict; a single member with strong opinions never
/// conflicts with themselves.
fn cuisine_conflicts(members: &[UserPreferences]) -> Vec<PreferenceConflict> {
    let all_cuisines: BTreeSet<&str> = members
        .iter()
        .flat_map(|p| p.dietary.cuisine_preferences.iter())
        .map(|c| c.cuisine.as_str())
        .collect();

    let mut conflicts = Vec::new();
    for cuisine in all_cuisines {
        let mut lovers = Vec::new();
        let mut haters = Vec::new();

        for member in members {
            let Some(score) = member
                .dietary
                .cuisine_preferences
                .iter()
                .find(|c| c.cuisine == cuisine)
                .map(|c| c.score)
            else {
                continue;
            };
            if score > STRONG_OPINION {
                lovers.push(member.user_id);
            }
            if score < -STRONG_OPINION {
                haters.push(member.user_id);
            }
        }

        if !lovers.is_empty() && !haters.is_empty() {
            let affected_users = lovers.into_iter().chain(haters).collect();
            conflicts.push(PreferenceConflict {
                conflict_type: ConflictType::Cuisine,
                description: format!("{cuisine} is loved by some and disliked by others"),
                affected_users,
                suggestions: vec![
                    format!("Consider a {cuisine} fusion place with other options"),
                    "Choose a different cuisine everyone enjoys".to_string(),
                ],
            });
        }
    }
    conflicts
}

/// Mean signed score per cuisine over the members who expressed an opinion
/// on it; silent members don't pull the average toward neutral.
fn aggregate_cuisine_scores(members: &[UserPreferences]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for member in members {
        for cuisine in &member.dietary.cuisine_preferences {
            let entry = sums.entry(cuisine.cuisine.clone()).or_insert((0.0, 0));
            entry.0 += cuisine.score;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(cuisine, (sum, count))| (cuisine, sum / f64::from(count)))
        .collect()
}

/// Fraction of the group preferring each ambiance.
fn aggregate_ambiance_scores(members: &[UserPreferences]) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for member in members {
        for ambiance in &member.venue.ambiance_preferences {
            *counts.entry(ambiance.clone()).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(ambiance, count)| (ambiance, f64::from(count) / members.len() as f64))
        .collect()
}

/// First-seen-order union of string constraints.
fn union<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

/// Arithmetic-mean center of a set of points.
fn centroid(points: &[GeoPoint]) -> GeoPoint {
    let n = points.len() as f64;
    GeoPoint {
        lat: points.iter().map(|p| p.lat).sum::<f64>() / n,
        lng: points.iter().map(|p| p.lng).sum::<f64>() / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::default_preferences;
    use trustmesh_common::CuisineScore;

    fn member(cuisines: &[(&str, f64)]) -> UserPreferences {
        let mut prefs = default_preferences(Uuid::new_v4());
        prefs.dietary.cuisine_preferences = cuisines
            .iter()
            .map(|(cuisine, score)| CuisineScore {
                cuisine: cuisine.to_string(),
                score: *score,
            })
            .collect();
        prefs
    }

    #[test]
    fn lover_and_hater_conflict_names_both() {
        let ana = member(&[("thai", 0.9)]);
        let ben = member(&[("thai", -0.6)]);
        let conflicts = detect_conflicts(&[ana.clone(), ben.clone()], "dining");

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Cuisine);
        assert!(conflicts[0].affected_users.contains(&ana.user_id));
        assert!(conflicts[0].affected_users.contains(&ben.user_id));
    }

    #[test]
    fn lone_strong_opinion_is_not_a_conflict() {
        let ana = member(&[("thai", 0.9)]);
        let ben = member(&[]);
        assert!(detect_conflicts(&[ana, ben], "dining").is_empty());
    }

    #[test]
    fn thresholds_are_strict_inequalities() {
        let ana = member(&[("thai", 0.5)]);
        let ben = member(&[("thai", -0.5)]);
        assert!(detect_conflicts(&[ana, ben], "dining").is_empty());
    }

    #[test]
    fn budget_spread_without_strict_member_passes() {
        let mut ana = member(&[]);
        ana.budget.dining.max = 30.0;
        let mut ben = member(&[]);
        ben.budget.dining.max = 120.0;
        assert!(detect_conflicts(&[ana, ben], "dining").is_empty());
    }

    #[test]
    fn budget_spread_with_strict_member_flags_them() {
        let mut ana = member(&[]);
        ana.budget.dining.max = 30.0;
        ana.budget.flexibility = BudgetFlexibility::Strict;
        let mut ben = member(&[]);
        ben.budget.dining.max = 120.0;

        let conflicts = detect_conflicts(&[ana.clone(), ben], "dining");
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Budget);
        assert_eq!(conflicts[0].affected_users, vec![ana.user_id]);
    }

    #[test]
    fn narrow_spread_is_never_a_budget_conflict() {
        let mut ana = member(&[]);
        ana.budget.dining.max = 40.0;
        ana.budget.flexibility = BudgetFlexibility::Strict;
        let mut ben = member(&[]);
        ben.budget.dining.max = 65.0;
        assert!(detect_conflicts(&[ana, ben], "dining").is_empty());
    }

    #[test]
    fn cuisine_means_skip_silent_members() {
        let ana = member(&[("thai", 1.0)]);
        let ben = member(&[("thai", 0.0)]);
        let cal = member(&[]);
        let scores = aggregate_cuisine_scores(&[ana, ben, cal]);
        // Two opinions, not three: (1.0 + 0.0) / 2.
        assert_eq!(scores["thai"], 0.5);
    }

    #[test]
    fn ambiance_scores_are_group_fractions() {
        let mut ana = member(&[]);
        ana.venue.ambiance_preferences = vec!["lively".to_string()];
        let ben = member(&[]);
        let scores = aggregate_ambiance_scores(&[ana, ben]);
        assert_eq!(scores["lively"], 0.5);
    }

    #[test]
    fn centroid_is_arithmetic_mean() {
        let points = [
            GeoPoint { lat: 10.0, lng: 20.0 },
            GeoPoint { lat: 30.0, lng: 40.0 },
        ];
        let center = centroid(&points);
        assert_eq!(center.lat, 20.0);
        assert_eq!(center.lng, 30.0);
    }
}
