use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::info;
use uuid::Uuid;

use trustmesh_common::{
    CatalogStore, Config, Degree, TrustComponents, TrustMeshError, TrustScore,
};

use crate::graph::SocialGraphEngine;

// Blend weights, fixed design constants: social proximity dominates, global
// reputation is a last-resort fallback.
const WEIGHT_CONNECTION: f64 = 0.40;
const WEIGHT_NETWORK_REVIEWS: f64 = 0.35;
const WEIGHT_ENDORSEMENTS: f64 = 0.15;
const WEIGHT_GLOBAL_REPUTATION: f64 = 0.10;

/// Each endorsement is a strong signal; the component saturates at two.
const ENDORSEMENT_POINTS: f64 = 50.0;

/// Connection-distance component, 0-100 by degree.
fn connection_score(degree: Option<Degree>) -> f64 {
    match degree {
        Some(Degree::First) => 100.0,
        Some(Degree::Second) => 60.0,
        Some(Degree::Third) => 30.0,
        None => 0.0,
    }
}

/// Combines connection degree, network review average, endorsement count,
/// and global rating into a single 0-100 trust score with an auditable
/// component breakdown. Scores are views, recomputed on every request.
#[derive(Clone)]
pub struct TrustScorer {
    graph: SocialGraphEngine,
    catalog: Arc<dyn CatalogStore>,
    concurrency: usize,
}

impl TrustScorer {
    pub fn new(graph: SocialGraphEngine, catalog: Arc<dyn CatalogStore>, config: &Config) -> Self {
        Self {
            graph,
            catalog,
            concurrency: config.score_concurrency,
        }
    }

    /// Trust in `provider_id` from `user_id`'s perspective. Fails only when
    /// the provider itself is unknown.
    pub async fn trust_score(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
    ) -> Result<TrustScore, TrustMeshError> {
        let provider = self
            .catalog
            .provider(provider_id)
            .await?
            .ok_or(TrustMeshError::ProviderNotFound(provider_id))?;

        // Degree resolves through the provider's linked user; providers
        // without one are always out of network.
        let degree = match provider.user_id {
            Some(linked_user) => self.graph.connection_degree(user_id, linked_user).await?,
            None => None,
        };

        let network_rating = self.graph.network_rating(user_id, provider_id).await?;
        let endorsements = self
            .graph
            .network_endorsements(user_id, provider_id)
            .await?;

        let review_score = if network_rating.review_count > 0 {
            network_rating.weighted_average * 20.0
        } else {
            0.0
        };
        let endorsement_score = (endorsements.len() as f64 * ENDORSEMENT_POINTS).min(100.0);

        let components = TrustComponents {
            connection_score: connection_score(degree),
            review_score,
            endorsement_score,
            global_score: provider.global_rating * 20.0,
        };

        let score = components.connection_score * WEIGHT_CONNECTION
            + components.review_score * WEIGHT_NETWORK_REVIEWS
            + components.endorsement_score * WEIGHT_ENDORSEMENTS
            + components.global_score * WEIGHT_GLOBAL_REPUTATION;

        Ok(TrustScore {
            provider_id,
            score: score.round() as u32,
            degree,
            network_review_count: network_rating.review_count,
            network_avg_rating: network_rating.weighted_average,
            endorsement_count: endorsements.len() as u32,
            global_rating: provider.global_rating,
            components,
            computed_at: Utc::now(),
        })
    }

    /// Score a candidate list concurrently, keyed by provider id. Unknown
    /// providers are skipped, not failed: partial results are the expected
    /// outcome of scoring a best-effort candidate set.
    pub async fn batch_trust_score(
        &self,
        user_id: Uuid,
        provider_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, TrustScore>, TrustMeshError> {
        let mut distinct_seen = HashSet::new();
        let distinct: Vec<Uuid> = provider_ids
            .iter()
            .copied()
            .filter(|id| distinct_seen.insert(*id))
            .collect();

        info!(
            providers = distinct.len(),
            concurrency = self.concurrency,
            "Batch trust scoring"
        );

        let results: Vec<(Uuid, Result<TrustScore, TrustMeshError>)> =
            stream::iter(distinct.into_iter().map(|provider_id| async move {
                (provider_id, self.trust_score(user_id, provider_id).await)
            }))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut scores = HashMap::new();
        for (provider_id, result) in results {
            match result {
                Ok(score) => {
                    scores.insert(provider_id, score);
                }
                Err(TrustMeshError::ProviderNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(scores)
    }
}
