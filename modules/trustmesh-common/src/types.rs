use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

// --- Users & Connections ---

/// Identity record. Immutable except `last_active_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    /// Hash of the user's contact handle, used for contact matching.
    pub contact_handle_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl User {
    pub fn new(display_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            contact_handle_hash: format!("hash:{display_name}"),
            created_at: now,
            last_active_at: now,
        }
    }
}

/// Social distance between two users. "No connection" is `Option::None`,
/// never a sentinel value, so weight tables stay exhaustive under `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degree {
    First,
    Second,
    Third,
}

impl Degree {
    /// Review weight by social distance: trust in a recommendation decays
    /// with distance. Fixed constants, not learned.
    pub fn weight(&self) -> f64 {
        match self {
            Degree::First => 1.0,
            Degree::Second => 0.6,
            Degree::Third => 0.3,
        }
    }

    /// Map a hop count (path length minus one) to a degree. Anything outside
    /// 1..=3 is out of network.
    pub fn from_hops(hops: usize) -> Option<Self> {
        match hops {
            1 => Some(Degree::First),
            2 => Some(Degree::Second),
            3 => Some(Degree::Third),
            _ => None,
        }
    }
}

impl std::fmt::Display for Degree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Degree::First => write!(f, "1st"),
            Degree::Second => write!(f, "2nd"),
            Degree::Third => write!(f, "3rd"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionSource {
    Contacts,
    Manual,
    Mutual,
}

impl std::fmt::Display for ConnectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionSource::Contacts => write!(f, "contacts"),
            ConnectionSource::Manual => write!(f, "manual"),
            ConnectionSource::Mutual => write!(f, "mutual"),
        }
    }
}

/// A directed social edge. Only first-degree edges are stored; higher
/// degrees are derived by traversal and re-anchored to the requester.
/// An edge A -> B does not imply B -> A.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub degree: Degree,
    pub source: ConnectionSource,
    /// Interaction-frequency strength, 0.0-1.0.
    pub strength: f64,
    pub created_at: DateTime<Utc>,
}

/// A shortest path between two users, found by bounded breadth-first search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionPath {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    /// User ids along the path, endpoints included.
    pub path: Vec<Uuid>,
    pub degree: Degree,
}

// --- Providers & Offerings ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Individual,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Active,
    Paused,
    Suspended,
    Inactive,
}

/// A service provider, optionally linked to a platform user. The link is
/// what makes graph proximity resolvable; providers without one always
/// score as out-of-network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub provider_type: ProviderType,
    pub display_name: String,
    pub description: Option<String>,
    /// Public reputation, 0.0-5.0.
    pub global_rating: f64,
    pub global_review_count: u32,
    pub status: ProviderStatus,
    pub created_at: DateTime<Utc>,
}

impl Provider {
    pub fn new(display_name: &str, user_id: Option<Uuid>, global_rating: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            provider_type: ProviderType::Business,
            display_name: display_name.to_string(),
            description: None,
            global_rating,
            global_review_count: 0,
            status: ProviderStatus::Active,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    Fixed,
    Hourly,
    PerPerson,
    Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferingStatus {
    Active,
    Paused,
    Inactive,
}

/// A sellable service. Immutable input to matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub category: String,
    pub subcategory: Option<String>,
    pub name: String,
    pub description: String,
    pub pricing_model: PricingModel,
    pub base_price: f64,
    pub currency: String,
    pub negotiable: bool,
    pub instant_book: bool,
    pub min_capacity: Option<u32>,
    pub max_capacity: Option<u32>,
    pub location: Option<GeoPoint>,
    pub status: OfferingStatus,
    pub created_at: DateTime<Utc>,
}

impl ServiceOffering {
    pub fn new(provider_id: Uuid, category: &str, name: &str, base_price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id,
            category: category.to_string(),
            subcategory: None,
            name: name.to_string(),
            description: String::new(),
            pricing_model: PricingModel::Fixed,
            base_price,
            currency: "USD".to_string(),
            negotiable: false,
            instant_book: false,
            min_capacity: None,
            max_capacity: None,
            location: None,
            status: OfferingStatus::Active,
            created_at: Utc::now(),
        }
    }
}

// --- Reviews & Endorsements ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub provider_id: Uuid,
    /// 1.0-5.0.
    pub rating: f64,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An explicit, unscored vouch. Multiple endorsements from the same user
/// are allowed and each counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endorsement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A review from inside the requester's network, annotated with the
/// reviewer's connection degree and its decay weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkReview {
    pub review_id: Uuid,
    pub reviewer_id: Uuid,
    pub provider_id: Uuid,
    pub rating: f64,
    pub connection_degree: Degree,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewsByDegree {
    pub first: u32,
    pub second: u32,
    pub third: u32,
}

/// Degree-weighted rating aggregate over network reviews. A zero
/// `review_count` means the average carries no signal; callers must check
/// the count before trusting the average.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRating {
    pub provider_id: Uuid,
    pub weighted_average: f64,
    pub review_count: u32,
    pub reviews_by_degree: ReviewsByDegree,
}

impl NetworkRating {
    pub fn empty(provider_id: Uuid) -> Self {
        Self {
            provider_id,
            weighted_average: 0.0,
            review_count: 0,
            reviews_by_degree: ReviewsByDegree::default(),
        }
    }
}

// --- Trust Scores ---

/// Component scores, each normalized to 0-100 before blending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrustComponents {
    pub connection_score: f64,
    pub review_score: f64,
    pub endorsement_score: f64,
    pub global_score: f64,
}

/// Composite 0-100 trust metric. Derived, never persisted: the graph and
/// reviews change continuously and a stored score would be silently stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustScore {
    pub provider_id: Uuid,
    pub score: u32,
    pub degree: Option<Degree>,
    pub network_review_count: u32,
    pub network_avg_rating: f64,
    pub endorsement_count: u32,
    pub global_rating: f64,
    pub components: TrustComponents,
    pub computed_at: DateTime<Utc>,
}

// --- Preference Profiles ---

/// Signed preference for one cuisine: -1.0 = avoid, 0 = neutral, 1.0 = love.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuisineScore {
    pub cuisine: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

impl BudgetRange {
    pub fn usd(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// HH:MM
    pub start: String,
    /// HH:MM
    pub end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetFlexibility {
    Strict,
    Flexible,
    SplurgeOk,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DietaryPreferences {
    /// e.g. "vegetarian", "kosher", "halal".
    pub restrictions: Vec<String>,
    /// e.g. "gluten", "peanuts", "shellfish".
    pub allergies: Vec<String>,
    pub cuisine_preferences: Vec<CuisineScore>,
    pub avoid_ingredients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPreferences {
    pub dining: BudgetRange,
    pub transportation: BudgetRange,
    pub services: BudgetRange,
    pub flexibility: BudgetFlexibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportationPreferences {
    pub preferred_services: Vec<String>,
    pub share_rides_ok: bool,
    pub max_walk_minutes: u32,
    pub accessibility_needs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VenuePreferences {
    /// e.g. "quiet", "lively", "trendy".
    pub ambiance_preferences: Vec<String>,
    /// e.g. "booth", "patio", "private".
    pub seating_preferences: Vec<String>,
    pub accessibility_needs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingPreferences {
    /// Meal name ("lunch", "dinner") to preferred window.
    pub preferred_meal_times: BTreeMap<String, TimeRange>,
    /// Days of week to avoid, 0-6 with Sunday = 0.
    pub avoid_days: Vec<u8>,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationPreferences {
    pub home: Option<GeoPoint>,
    pub work: Option<GeoPoint>,
    pub preferred_areas: Vec<String>,
    pub avoid_areas: Vec<String>,
    pub max_travel_minutes: u32,
}

/// A user's structured preference profile. Created lazily on first write;
/// mutated only via per-section merge so unsent sections survive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub dietary: DietaryPreferences,
    pub budget: BudgetPreferences,
    pub transportation: TransportationPreferences,
    pub venue: VenuePreferences,
    pub scheduling: SchedulingPreferences,
    pub location: LocationPreferences,
    /// Derived, 0-100. Recomputed on every update; never caller-settable.
    pub completeness_score: u32,
    pub last_updated: DateTime<Utc>,
}

/// Partial profile update. A section that is present replaces that section
/// wholesale; absent sections are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferenceUpdate {
    pub dietary: Option<DietaryPreferences>,
    pub budget: Option<BudgetPreferences>,
    pub transportation: Option<TransportationPreferences>,
    pub venue: Option<VenuePreferences>,
    pub scheduling: Option<SchedulingPreferences>,
    pub location: Option<LocationPreferences>,
}

// --- Group Aggregation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Budget,
    Dietary,
    Cuisine,
    Time,
    Location,
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictType::Budget => write!(f, "budget"),
            ConflictType::Dietary => write!(f, "dietary"),
            ConflictType::Cuisine => write!(f, "cuisine"),
            ConflictType::Time => write!(f, "time"),
            ConflictType::Location => write!(f, "location"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceConflict {
    pub conflict_type: ConflictType,
    pub description: String,
    pub affected_users: Vec<Uuid>,
    pub suggestions: Vec<String>,
}

/// Shared budget envelope. `max` is capped by the most budget-constrained
/// member; exceeding one member's stated max is a hard failure for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupBudget {
    pub min: f64,
    pub max: f64,
    pub per_person: f64,
}

/// Aggregated preferences for one outing. Derived per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPreferences {
    pub user_ids: Vec<Uuid>,
    /// Union of members' dietary restrictions.
    pub required_restrictions: Vec<String>,
    /// Union of members' allergies.
    pub required_allergen_free: Vec<String>,
    /// Union of members' transportation and venue accessibility needs.
    pub required_accessibility: Vec<String>,
    pub budget_range: GroupBudget,
    /// Mean signed score per cuisine, over members who expressed an opinion.
    pub cuisine_scores: BTreeMap<String, f64>,
    /// Fraction of the group preferring each ambiance.
    pub ambiance_scores: BTreeMap<String, f64>,
    pub conflicts: Vec<PreferenceConflict>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SectionScores {
    pub dietary: u32,
    pub budget: u32,
    pub transportation: u32,
    pub venue: u32,
    pub scheduling: u32,
    pub location: u32,
}

/// How complete a profile is, per section, with follow-up prompts for the
/// weakest sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceCompleteness {
    pub user_id: Uuid,
    pub overall_score: u32,
    pub sections: SectionScores,
    pub missing_fields: Vec<String>,
    pub suggested_questions: Vec<String>,
}

/// Provider-search filters derived from one profile or a group aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub location: Option<GeoPoint>,
    pub radius_miles: Option<f64>,
    pub price_range: Option<BudgetRange>,
}

// --- Matching ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPriority {
    #[default]
    Trust,
    Price,
    Rating,
    Availability,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceRequirements {
    pub date_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub party_size: Option<u32>,
    pub location: Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
    pub budget: Option<BudgetRange>,
    pub free_form_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingPreferences {
    /// Only return providers reachable within the requester's network.
    pub network_only: bool,
    pub min_trust_score: Option<u32>,
    pub min_rating: Option<f64>,
    pub prioritize: MatchPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Limited,
    Waitlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

/// One ranked, explainable candidate. `match_rank` is 1-based, assigned
/// after the global sort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub provider_id: Uuid,
    pub provider_name: String,
    pub offering_id: Uuid,
    pub offering_name: String,
    pub trust_score: u32,
    pub connection_degree: Option<Degree>,
    pub network_review_count: u32,
    pub network_avg_rating: f64,
    pub global_rating: f64,
    pub global_review_count: u32,
    pub estimated_price: f64,
    /// Present only for negotiable offerings.
    pub price_range: Option<PriceRange>,
    pub availability: Availability,
    pub preference_match_score: u32,
    pub preference_highlights: Vec<String>,
    pub match_score: u32,
    pub match_rank: u32,
    pub match_explanation: String,
    pub can_instant_book: bool,
    pub negotiable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_weights_decay_with_distance() {
        assert_eq!(Degree::First.weight(), 1.0);
        assert_eq!(Degree::Second.weight(), 0.6);
        assert_eq!(Degree::Third.weight(), 0.3);
    }

    #[test]
    fn degree_from_hops_bounds() {
        assert_eq!(Degree::from_hops(1), Some(Degree::First));
        assert_eq!(Degree::from_hops(3), Some(Degree::Third));
        assert_eq!(Degree::from_hops(0), None);
        assert_eq!(Degree::from_hops(4), None);
    }

    #[test]
    fn degree_ordering_tracks_distance() {
        assert!(Degree::First < Degree::Second);
        assert!(Degree::Second < Degree::Third);
    }

    #[test]
    fn enums_serialize_snake_case() {
        let source = serde_json::to_string(&ConnectionSource::Contacts).unwrap();
        assert_eq!(source, "\"contacts\"");
        let model = serde_json::to_string(&PricingModel::PerPerson).unwrap();
        assert_eq!(model, "\"per_person\"");
        let flex = serde_json::to_string(&BudgetFlexibility::SplurgeOk).unwrap();
        assert_eq!(flex, "\"splurge_ok\"");
    }

    #[test]
    fn empty_network_rating_carries_no_signal() {
        let rating = NetworkRating::empty(Uuid::new_v4());
        assert_eq!(rating.weighted_average, 0.0);
        assert_eq!(rating.review_count, 0);
        assert_eq!(rating.reviews_by_degree, ReviewsByDegree::default());
    }

    #[test]
    fn preference_update_defaults_to_no_sections() {
        let update = PreferenceUpdate::default();
        assert!(update.dietary.is_none());
        assert!(update.budget.is_none());
        assert!(update.location.is_none());
    }

    #[test]
    fn match_priority_defaults_to_trust() {
        assert_eq!(MatchPriority::default(), MatchPriority::Trust);
    }
}
