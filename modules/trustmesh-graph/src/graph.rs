use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use trustmesh_common::{
    Connection, ConnectionPath, ConnectionStore, Degree, Endorsement, NetworkRating,
    NetworkReview, ReviewStore, ReviewsByDegree, TrustMeshError, UserStore,
};

/// Maximum traversal depth in hops. Paths longer than this are treated as
/// "no connection", not as degree 4+, bounding worst-case work per request
/// to O(branching^3).
const MAX_HOPS: usize = 3;

/// Resolves connection degree and shortest paths over the directed social
/// graph, and scopes reviews/endorsements to the requester's network.
///
/// Higher-degree connections are derived per request, never persisted; the
/// graph changes continuously and stored derivations would go stale.
#[derive(Clone)]
pub struct SocialGraphEngine {
    connection_store: Arc<dyn ConnectionStore>,
    user_store: Arc<dyn UserStore>,
    review_store: Arc<dyn ReviewStore>,
}

impl SocialGraphEngine {
    pub fn new(
        connection_store: Arc<dyn ConnectionStore>,
        user_store: Arc<dyn UserStore>,
        review_store: Arc<dyn ReviewStore>,
    ) -> Self {
        Self {
            connection_store,
            user_store,
            review_store,
        }
    }

    /// All connections of `user_id` through `max_degree`, as one cumulative
    /// set deduplicated by target id.
    ///
    /// First degree returns stored edges directly (minus self-loops). Each
    /// further degree hops once beyond the previous frontier, skipping the
    /// requester and every target already claimed at a closer degree, and
    /// re-anchors the surviving edge to the requester with the derived
    /// degree stamped on it.
    pub async fn connections(
        &self,
        user_id: Uuid,
        max_degree: Degree,
    ) -> Result<Vec<Connection>, TrustMeshError> {
        let first = self.connection_store.connections_from(user_id).await?;
        let mut result: Vec<Connection> = first
            .into_iter()
            .filter(|c| c.to_user_id != user_id)
            .collect();

        let mut seen: HashSet<Uuid> = result.iter().map(|c| c.to_user_id).collect();
        seen.insert(user_id);

        let mut frontier: Vec<Uuid> = result.iter().map(|c| c.to_user_id).collect();

        for degree in [Degree::Second, Degree::Third] {
            if degree > max_degree || frontier.is_empty() {
                break;
            }

            let mut next_frontier = Vec::new();
            for intermediate in frontier {
                for conn in self.connection_store.connections_from(intermediate).await? {
                    if seen.contains(&conn.to_user_id) {
                        continue;
                    }
                    seen.insert(conn.to_user_id);
                    next_frontier.push(conn.to_user_id);
                    result.push(Connection {
                        from_user_id: user_id,
                        degree,
                        ..conn
                    });
                }
            }
            frontier = next_frontier;
        }

        Ok(result)
    }

    /// Breadth-first search for the shortest path from `user_id` to
    /// `target_id`, bounded to 3 hops.
    ///
    /// Returns the first shortest path found; ties among equal-length paths
    /// resolve in store/frontier order and are not otherwise specified.
    /// Only the path *length* is consumed downstream. A user has no path to
    /// themselves.
    pub async fn connection_path(
        &self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<Option<ConnectionPath>, TrustMeshError> {
        if user_id == target_id {
            return Ok(None);
        }

        let mut visited: HashSet<Uuid> = HashSet::from([user_id]);
        let mut queue: VecDeque<(Uuid, Vec<Uuid>)> = VecDeque::from([(user_id, vec![user_id])]);

        while let Some((node, path)) = queue.pop_front() {
            let hops = path.len() - 1;
            if hops >= MAX_HOPS {
                continue;
            }

            for conn in self.connection_store.connections_from(node).await? {
                let next = conn.to_user_id;
                if next == target_id {
                    let mut full = path.clone();
                    full.push(next);
                    let Some(degree) = Degree::from_hops(full.len() - 1) else {
                        continue;
                    };
                    return Ok(Some(ConnectionPath {
                        from_user_id: user_id,
                        to_user_id: target_id,
                        path: full,
                        degree,
                    }));
                }
                if visited.insert(next) {
                    let mut extended = path.clone();
                    extended.push(next);
                    queue.push_back((next, extended));
                }
            }
        }

        Ok(None)
    }

    /// Path length minus one; `None` when unreachable within 3 hops.
    pub async fn connection_degree(
        &self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<Option<Degree>, TrustMeshError> {
        let path = self.connection_path(user_id, target_id).await?;
        Ok(path.map(|p| p.degree))
    }

    /// Reviews for `provider_id` written by users within 3 degrees of
    /// `user_id`, annotated with the reviewer's degree and decay weight.
    ///
    /// Independent of the provider's own connectivity: a review counts as
    /// long as the *reviewer* is in network, even for providers with no
    /// linked user.
    pub async fn network_reviews(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Vec<NetworkReview>, TrustMeshError> {
        let connections = self.connections(user_id, Degree::Third).await?;
        let degree_by_target: HashMap<Uuid, Degree> = connections
            .iter()
            .map(|c| (c.to_user_id, c.degree))
            .collect();

        let reviews = self.review_store.reviews_for_provider(provider_id).await?;
        let network: Vec<NetworkReview> = reviews
            .into_iter()
            .filter_map(|review| {
                degree_by_target
                    .get(&review.reviewer_id)
                    .map(|&degree| NetworkReview {
                        review_id: review.id,
                        reviewer_id: review.reviewer_id,
                        provider_id: review.provider_id,
                        rating: review.rating,
                        connection_degree: degree,
                        weight: degree.weight(),
                        created_at: review.created_at,
                    })
            })
            .collect();

        debug!(
            %provider_id,
            network_reviews = network.len(),
            "Scoped provider reviews to requester network"
        );
        Ok(network)
    }

    /// Degree-weighted average rating over network reviews:
    /// sum(rating * weight) / sum(weight). Zero reviews yields an average of
    /// 0.0 with `review_count = 0`, never NaN.
    pub async fn network_rating(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
    ) -> Result<NetworkRating, TrustMeshError> {
        let reviews = self.network_reviews(user_id, provider_id).await?;
        if reviews.is_empty() {
            return Ok(NetworkRating::empty(provider_id));
        }

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        let mut by_degree = ReviewsByDegree::default();

        for review in &reviews {
            weighted_sum += review.rating * review.weight;
            total_weight += review.weight;
            match review.connection_degree {
                Degree::First => by_degree.first += 1,
                Degree::Second => by_degree.second += 1,
                Degree::Third => by_degree.third += 1,
            }
        }

        Ok(NetworkRating {
            provider_id,
            weighted_average: weighted_sum / total_weight,
            review_count: reviews.len() as u32,
            reviews_by_degree: by_degree,
        })
    }

    /// Endorsements for `provider_id` whose author is within 3 degrees of
    /// `user_id`.
    pub async fn network_endorsements(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Vec<Endorsement>, TrustMeshError> {
        let connections = self.connections(user_id, Degree::Third).await?;
        let members: HashSet<Uuid> = connections.iter().map(|c| c.to_user_id).collect();

        let endorsements = self.review_store.endorsements_for_provider(provider_id).await?;
        Ok(endorsements
            .into_iter()
            .filter(|e| members.contains(&e.user_id))
            .collect())
    }

    /// Record a vouch for a provider. The user must exist; uniqueness is not
    /// enforced, so repeat endorsements each count.
    pub async fn endorse(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
        note: Option<String>,
    ) -> Result<Endorsement, TrustMeshError> {
        self.user_store
            .user(user_id)
            .await?
            .ok_or(TrustMeshError::UserNotFound(user_id))?;

        let endorsement = Endorsement {
            id: Uuid::new_v4(),
            user_id,
            provider_id,
            note,
            created_at: Utc::now(),
        };
        self.review_store.append_endorsement(endorsement.clone()).await?;
        Ok(endorsement)
    }
}
