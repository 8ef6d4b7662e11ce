//! Profile completeness scoring.
//!
//! Each section is scored 0-100 by a fixed rubric; the overall score is the
//! unweighted mean of the six sections. Sections under 50 contribute one
//! missing-field hint and a canned follow-up question, considered in a fixed
//! order so the prompts are deterministic.

use trustmesh_common::{
    BudgetFlexibility, BudgetPreferences, DietaryPreferences, LocationPreferences,
    PreferenceCompleteness, SchedulingPreferences, SectionScores, TransportationPreferences,
    UserPreferences, VenuePreferences,
};

use crate::engine::{DEFAULT_DINING_MAX, DEFAULT_MAX_WALK_MINUTES, DEFAULT_TRANSPORT_MAX};

/// A section scoring below this contributes a follow-up prompt.
const PROMPT_THRESHOLD: u32 = 50;

pub fn assess(prefs: &UserPreferences) -> PreferenceCompleteness {
    let sections = SectionScores {
        dietary: score_dietary(&prefs.dietary),
        budget: score_budget(&prefs.budget),
        transportation: score_transportation(&prefs.transportation),
        venue: score_venue(&prefs.venue),
        scheduling: score_scheduling(&prefs.scheduling),
        location: score_location(&prefs.location),
    };

    let sum = sections.dietary
        + sections.budget
        + sections.transportation
        + sections.venue
        + sections.scheduling
        + sections.location;
    let overall_score = (f64::from(sum) / 6.0).round() as u32;

    let mut missing_fields = Vec::new();
    let mut suggested_questions = Vec::new();

    if sections.dietary < PROMPT_THRESHOLD {
        missing_fields.push("dietary.cuisine_preferences".to_string());
        suggested_questions.push("What are your favorite types of cuisine?".to_string());
    }
    if sections.budget < PROMPT_THRESHOLD {
        missing_fields.push("budget.dining".to_string());
        suggested_questions.push("What's your typical dining budget per person?".to_string());
    }
    if sections.location < PROMPT_THRESHOLD {
        missing_fields.push("location.preferred_areas".to_string());
        suggested_questions.push("What neighborhoods do you like to go out in?".to_string());
    }

    PreferenceCompleteness {
        user_id: prefs.user_id,
        overall_score,
        sections,
        missing_fields,
        suggested_questions,
    }
}

fn score_dietary(dietary: &DietaryPreferences) -> u32 {
    let mut score = 20;
    if !dietary.cuisine_preferences.is_empty() {
        score += 40;
    }
    if !dietary.restrictions.is_empty() || !dietary.allergies.is_empty() {
        score += 20;
    }
    if !dietary.avoid_ingredients.is_empty() {
        score += 20;
    }
    score.min(100)
}

fn score_budget(budget: &BudgetPreferences) -> u32 {
    // Values still at the system defaults read as "not yet customized".
    let mut score = 30;
    if budget.dining.max != DEFAULT_DINING_MAX {
        score += 30;
    }
    if budget.flexibility != BudgetFlexibility::Flexible {
        score += 20;
    }
    if budget.transportation.max != DEFAULT_TRANSPORT_MAX {
        score += 20;
    }
    score.min(100)
}

fn score_transportation(transport: &TransportationPreferences) -> u32 {
    let mut score = 40;
    if !transport.preferred_services.is_empty() {
        score += 30;
    }
    if transport.max_walk_minutes != DEFAULT_MAX_WALK_MINUTES {
        score += 15;
    }
    if !transport.accessibility_needs.is_empty() {
        score += 15;
    }
    score.min(100)
}

fn score_venue(venue: &VenuePreferences) -> u32 {
    let mut score = 20;
    if !venue.ambiance_preferences.is_empty() {
        score += 40;
    }
    if !venue.seating_preferences.is_empty() {
        score += 20;
    }
    if !venue.accessibility_needs.is_empty() {
        score += 20;
    }
    score.min(100)
}

fn score_scheduling(scheduling: &SchedulingPreferences) -> u32 {
    let mut score = 30;
    if !scheduling.preferred_meal_times.is_empty() {
        score += 40;
    }
    if !scheduling.avoid_days.is_empty() {
        score += 30;
    }
    score.min(100)
}

fn score_location(location: &LocationPreferences) -> u32 {
    let mut score = 20;
    if location.home.is_some() {
        score += 25;
    }
    if location.work.is_some() {
        score += 15;
    }
    if !location.preferred_areas.is_empty() {
        score += 40;
    }
    score.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::default_preferences;
    use trustmesh_common::{BudgetRange, CuisineScore, GeoPoint, TimeRange};
    use uuid::Uuid;

    #[test]
    fn default_profile_scores_low_with_prompts() {
        let prefs = default_preferences(Uuid::new_v4());
        let assessment = assess(&prefs);

        assert_eq!(assessment.sections.dietary, 20);
        assert_eq!(assessment.sections.budget, 30);
        // Default rideshare services count as a transportation signal.
        assert_eq!(assessment.sections.transportation, 70);
        assert_eq!(assessment.sections.venue, 20);
        assert_eq!(assessment.sections.scheduling, 30);
        assert_eq!(assessment.sections.location, 20);
        assert_eq!(assessment.overall_score, 32);

        // Under-scored sections prompt in fixed order: dietary, budget, location.
        assert_eq!(
            assessment.missing_fields,
            vec![
                "dietary.cuisine_preferences",
                "budget.dining",
                "location.preferred_areas"
            ]
        );
        assert_eq!(assessment.suggested_questions.len(), 3);
    }

    #[test]
    fn full_profile_scores_high_with_no_prompts() {
        let mut prefs = default_preferences(Uuid::new_v4());
        prefs.dietary.cuisine_preferences = vec![CuisineScore {
            cuisine: "thai".to_string(),
            score: 0.9,
        }];
        prefs.dietary.allergies = vec!["gluten".to_string()];
        prefs.dietary.avoid_ingredients = vec!["cilantro".to_string()];
        prefs.budget.dining = BudgetRange::usd(30.0, 90.0);
        prefs.budget.transportation = BudgetRange::usd(0.0, 20.0);
        prefs.budget.flexibility = trustmesh_common::BudgetFlexibility::Strict;
        prefs.transportation.max_walk_minutes = 15;
        prefs.transportation.accessibility_needs = vec!["step-free".to_string()];
        prefs.venue.ambiance_preferences = vec!["quiet".to_string()];
        prefs.venue.seating_preferences = vec!["booth".to_string()];
        prefs.venue.accessibility_needs = vec!["step-free".to_string()];
        prefs.scheduling.preferred_meal_times.insert(
            "dinner".to_string(),
            TimeRange {
                start: "18:00".to_string(),
                end: "21:00".to_string(),
            },
        );
        prefs.scheduling.avoid_days = vec![0];
        prefs.location.home = Some(GeoPoint {
            lat: 32.7767,
            lng: -96.797,
        });
        prefs.location.work = Some(GeoPoint {
            lat: 32.78,
            lng: -96.8,
        });
        prefs.location.preferred_areas = vec!["Deep Ellum".to_string()];

        let assessment = assess(&prefs);
        assert_eq!(assessment.overall_score, 100);
        assert!(assessment.missing_fields.is_empty());
        assert!(assessment.suggested_questions.is_empty());
    }

    #[test]
    fn restrictions_or_allergies_both_earn_the_dietary_bonus() {
        let with_restriction = DietaryPreferences {
            restrictions: vec!["halal".to_string()],
            ..Default::default()
        };
        let with_allergy = DietaryPreferences {
            allergies: vec!["dairy".to_string()],
            ..Default::default()
        };
        assert_eq!(score_dietary(&with_restriction), 40);
        assert_eq!(score_dietary(&with_allergy), 40);
    }

    #[test]
    fn section_scores_cap_at_one_hundred() {
        let prefs = {
            let mut p = default_preferences(Uuid::new_v4());
            p.transportation.preferred_services = vec!["uber".to_string()];
            p.transportation.max_walk_minutes = 25;
            p.transportation.accessibility_needs = vec!["ramp".to_string()];
            p
        };
        assert_eq!(score_transportation(&prefs.transportation), 100);
    }
}
