use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use trustmesh_common::{
    Availability, CatalogStore, Degree, MatchPriority, MatchResult, MatchingPreferences,
    OfferingStatus, PriceRange, PricingModel, ServiceOffering, ServiceRequirements, TrustMeshError,
    TrustScore, UserPreferences,
};
use trustmesh_graph::TrustScorer;
use trustmesh_prefs::PreferenceEngine;

/// Preference-fit scoring starts here and moves with each signal.
const FIT_BASE: i32 = 50;

/// Blend weights over (trust, preference fit, normalized global rating),
/// keyed by the caller's priority. `Availability` shares the default triple:
/// no live-availability signal is modeled in this core.
fn blend_weights(prioritize: MatchPriority) -> (f64, f64, f64) {
    match prioritize {
        MatchPriority::Trust => (0.6, 0.25, 0.15),
        MatchPriority::Rating => (0.25, 0.25, 0.5),
        // The price signal itself folds into the preference fit upstream.
        MatchPriority::Price => (0.3, 0.5, 0.2),
        MatchPriority::Availability => (0.6, 0.25, 0.15),
    }
}

/// Ranks candidate offerings for a requester and category by blending trust,
/// preference fit, and global reputation, and explains every result.
#[derive(Clone)]
pub struct Matcher {
    trust: TrustScorer,
    prefs: PreferenceEngine,
    catalog: Arc<dyn CatalogStore>,
}

impl Matcher {
    pub fn new(trust: TrustScorer, prefs: PreferenceEngine, catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            trust,
            prefs,
            catalog,
        }
    }

    /// Rank all active offerings in `category` for `user_id`.
    ///
    /// Trust/network/rating gates are hard filters applied before scoring:
    /// a filtered-out candidate never appears, even as a strong preference
    /// match. An empty candidate set is an empty result, not an error.
    pub async fn find_matches(
        &self,
        user_id: Uuid,
        category: &str,
        requirements: &ServiceRequirements,
        matching: &MatchingPreferences,
    ) -> Result<Vec<MatchResult>, TrustMeshError> {
        let offerings: Vec<ServiceOffering> = self
            .catalog
            .offerings_by_category(category)
            .await?
            .into_iter()
            .filter(|o| o.status == OfferingStatus::Active)
            .collect();

        if offerings.is_empty() {
            info!(category, "No active offerings in category");
            return Ok(Vec::new());
        }

        let provider_ids: Vec<Uuid> = {
            let mut seen = HashSet::new();
            offerings
                .iter()
                .map(|o| o.provider_id)
                .filter(|id| seen.insert(*id))
                .collect()
        };
        let trust_scores = self.trust.batch_trust_score(user_id, &provider_ids).await?;
        let user_prefs = self.prefs.get(user_id).await?;

        let mut matches = Vec::new();
        for offering in offerings {
            let Some(provider) = self.catalog.provider(offering.provider_id).await? else {
                continue;
            };
            let Some(trust) = trust_scores.get(&offering.provider_id) else {
                continue;
            };

            if let Some(min_trust) = matching.min_trust_score {
                if trust.score < min_trust {
                    continue;
                }
            }
            if matching.network_only && trust.degree.is_none() {
                continue;
            }
            if let Some(min_rating) = matching.min_rating {
                if provider.global_rating < min_rating {
                    continue;
                }
            }

            let (fit, highlights) =
                preference_fit(&offering, user_prefs.as_ref(), requirements);
            let match_score = blend(trust, fit, provider.global_rating, matching.prioritize);

            matches.push(MatchResult {
                provider_id: offering.provider_id,
                provider_name: provider.display_name.clone(),
                offering_id: offering.id,
                offering_name: offering.name.clone(),
                trust_score: trust.score,
                connection_degree: trust.degree,
                network_review_count: trust.network_review_count,
                network_avg_rating: trust.network_avg_rating,
                global_rating: provider.global_rating,
                global_review_count: provider.global_review_count,
                estimated_price: estimate_price(&offering, requirements),
                price_range: offering.negotiable.then(|| PriceRange {
                    low: offering.base_price * 0.9,
                    high: offering.base_price * 1.1,
                }),
                availability: Availability::Available,
                preference_match_score: fit,
                match_explanation: explanation(trust, fit, &highlights),
                preference_highlights: highlights,
                match_score,
                match_rank: 0,
                can_instant_book: offering.instant_book,
                negotiable: offering.negotiable,
            });
        }

        // Stable sort: ties keep candidate-enumeration order, which is all
        // the contract promises beyond the score itself.
        matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        for (index, result) in matches.iter_mut().enumerate() {
            result.match_rank = index as u32 + 1;
        }

        info!(
            category,
            candidates = provider_ids.len(),
            matches = matches.len(),
            "Matching complete"
        );
        Ok(matches)
    }

    /// Rank a single offering within its category. `None` when the offering
    /// is unknown or filtered out of its own category's results.
    pub async fn find_match(
        &self,
        user_id: Uuid,
        offering_id: Uuid,
    ) -> Result<Option<MatchResult>, TrustMeshError> {
        let Some(offering) = self.catalog.offering(offering_id).await? else {
            return Ok(None);
        };

        let matches = self
            .find_matches(
                user_id,
                &offering.category,
                &ServiceRequirements::default(),
                &MatchingPreferences::default(),
            )
            .await?;
        Ok(matches.into_iter().find(|m| m.offering_id == offering_id))
    }
}

/// Score how well an offering fits the requester's stated requirements and
/// stored profile, 0-100 around a base of 50, with human-readable highlights
/// for the strongest signals.
fn preference_fit(
    offering: &ServiceOffering,
    user_prefs: Option<&UserPreferences>,
    requirements: &ServiceRequirements,
) -> (u32, Vec<String>) {
    let mut score = FIT_BASE;
    let mut highlights = Vec::new();

    let Some(user_prefs) = user_prefs else {
        return (FIT_BASE as u32, highlights);
    };

    if let Some(budget) = &requirements.budget {
        if offering.base_price <= budget.max {
            score += 15;
            if offering.base_price <= budget.max * 0.8 {
                highlights.push("Great value for your budget".to_string());
            }
        } else {
            score -= 20;
        }
    }

    if let Some(party_size) = requirements.party_size {
        if let Some(max) = offering.max_capacity {
            if party_size <= max {
                score += 10;
            }
        }
        if let Some(min) = offering.min_capacity {
            if party_size >= min {
                score += 5;
            }
        }
    }

    // Simplified locality bonus: any preferred-area signal counts.
    if !user_prefs.location.preferred_areas.is_empty() {
        score += 10;
    }

    if offering.instant_book {
        highlights.push("Instant booking available".to_string());
        score += 5;
    }

    (score.clamp(0, 100) as u32, highlights)
}

/// Blend trust, preference fit, and global reputation into the final score.
fn blend(trust: &TrustScore, fit: u32, global_rating: f64, prioritize: MatchPriority) -> u32 {
    let (trust_weight, fit_weight, rating_weight) = blend_weights(prioritize);
    let normalized_rating = global_rating * 20.0;

    (f64::from(trust.score) * trust_weight
        + f64::from(fit) * fit_weight
        + normalized_rating * rating_weight)
        .round() as u32
}

/// Estimated price for the stated requirements.
fn estimate_price(offering: &ServiceOffering, requirements: &ServiceRequirements) -> f64 {
    let mut price = offering.base_price;

    if offering.pricing_model == PricingModel::PerPerson {
        if let Some(party_size) = requirements.party_size {
            price = offering.base_price * f64::from(party_size);
        }
    }
    if offering.pricing_model == PricingModel::Hourly {
        if let Some(duration) = requirements.duration_minutes {
            price = offering.base_price * (f64::from(duration) / 60.0);
        }
    }

    (price * 100.0).round() / 100.0
}

/// Compose the deterministic, human-readable reason this result ranked:
/// degree sentence, review and endorsement clauses, preference tier, then
/// up to two highlights. Falls back to the global-ratings line when nothing
/// network-specific applies.
fn explanation(trust: &TrustScore, fit: u32, highlights: &[String]) -> String {
    let mut parts: Vec<String> = Vec::new();

    match trust.degree {
        Some(Degree::First) => parts.push("Direct connection in your network".to_string()),
        Some(Degree::Second) => parts.push("Friend of a friend".to_string()),
        Some(Degree::Third) => parts.push("In your extended network".to_string()),
        None => {}
    }

    if trust.network_review_count > 0 {
        let plural = if trust.network_review_count > 1 { "s" } else { "" };
        parts.push(format!(
            "{} review{plural} from your network",
            trust.network_review_count
        ));
    }

    if trust.endorsement_count > 0 {
        parts.push("Vouched for by someone you know".to_string());
    }

    if fit >= 80 {
        parts.push("Excellent match for your preferences".to_string());
    } else if fit >= 60 {
        parts.push("Good match for your preferences".to_string());
    }

    parts.extend(highlights.iter().take(2).cloned());

    if parts.is_empty() {
        "Based on global ratings".to_string()
    } else {
        parts.join(". ")
    }
}
