//! Adjustment factors and confidence bonuses derived from personalization
//! parameters. These are fixed lookup rules, not a fitted model.

use std::collections::BTreeMap;

use crate::models::{
    AdjustmentFactors, BaselinePersonalizationParams, DemographicInfo, EnvironmentalContext,
    PersonalFactors,
};

pub const RESTRAINT_FACTOR: &str = "restraintFactor";
pub const EMOTIONAL_VULNERABILITY: &str = "emotionalVulnerability";

const DISTRESS_EVENTS: [&str; 3] = ["crisis", "trauma", "loss"];
const POSITIVE_EVENTS: [&str; 3] = ["success", "achievement", "positive"];

/// True when any event mentions one of `keywords`, ignoring case.
pub fn events_mention(events: &[String], keywords: &[&str]) -> bool {
    events.iter().any(|event| {
        let event = event.to_lowercase();
        keywords.iter().any(|keyword| event.contains(keyword))
    })
}

pub fn mentions_distress(events: &[String]) -> bool {
    events_mention(events, &DISTRESS_EVENTS)
}

fn normalized(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn derive_adjustment_factors(params: &BaselinePersonalizationParams) -> AdjustmentFactors {
    AdjustmentFactors {
        demographic_adjustments: params
            .demographic_info
            .as_ref()
            .map(demographic_adjustments)
            .unwrap_or_default(),
        personal_adjustments: params
            .personal_factors
            .as_ref()
            .map(personal_adjustments)
            .unwrap_or_default(),
        environmental_adjustments: params
            .environmental_context
            .as_ref()
            .map(environmental_adjustments)
            .unwrap_or_default(),
    }
}

fn demographic_adjustments(info: &DemographicInfo) -> BTreeMap<String, f64> {
    let mut factors = BTreeMap::new();

    if let Some(culture) = info.culture.as_deref() {
        let expression = match normalized(culture).as_str() {
            "east asian" => 0.8,
            "latin american" => 1.2,
            _ => 1.0,
        };
        factors.insert("emotionalExpression".to_string(), expression);
    }

    match info.age {
        Some(age) if age < 18 => {
            factors.insert("emotionalVolatility".to_string(), 1.2);
        }
        Some(age) if age > 65 => {
            factors.insert("emotionalPositivity".to_string(), 1.1);
        }
        _ => {}
    }

    factors
}

fn personal_adjustments(personal: &PersonalFactors) -> BTreeMap<String, f64> {
    let mut factors = BTreeMap::new();

    match personal.communication_style.as_deref().map(normalized).as_deref() {
        Some("expressive") => {
            factors.insert("emotionalIntensity".to_string(), 1.2);
        }
        Some("reserved") => {
            factors.insert("emotionalIntensity".to_string(), 0.8);
        }
        _ => {}
    }

    let has_condition = |name: &str| {
        personal
            .mental_health_conditions
            .iter()
            .any(|condition| normalized(condition) == name)
    };
    if has_condition("depression") {
        factors.insert("negativeEmotionBias".to_string(), 1.3);
        factors.insert("positiveEmotionBias".to_string(), 0.7);
    }
    if has_condition("anxiety") {
        factors.insert("fearIntensity".to_string(), 1.3);
    }

    if let Some(expressiveness) = personal.expressiveness {
        factors.insert(
            "generalExpressionAdjustment".to_string(),
            0.5 + expressiveness.clamp(0.0, 1.0),
        );
    }

    factors
}

fn environmental_adjustments(context: &EnvironmentalContext) -> BTreeMap<String, f64> {
    let mut factors = BTreeMap::new();

    match context.setting.as_deref().map(normalized).as_deref() {
        Some("clinical") => {
            factors.insert("formalityFactor".to_string(), 1.2);
            factors.insert(RESTRAINT_FACTOR.to_string(), 1.1);
        }
        Some("home") => {
            factors.insert("comfortFactor".to_string(), 1.2);
            factors.insert("opennessFactor".to_string(), 1.1);
        }
        Some("public") => {
            factors.insert(RESTRAINT_FACTOR.to_string(), 1.3);
        }
        _ => {}
    }

    if mentions_distress(&context.recent_events) {
        factors.insert(EMOTIONAL_VULNERABILITY.to_string(), 1.3);
    }
    if events_mention(&context.recent_events, &POSITIVE_EVENTS) {
        factors.insert("positiveEmotionBoost".to_string(), 1.2);
    }

    factors
}

/// Extra confidence earned by each populated personalization field.
pub fn personalization_bonus(params: Option<&BaselinePersonalizationParams>) -> f64 {
    let Some(params) = params else {
        return 0.0;
    };

    let mut bonus = 0.0;
    if let Some(info) = &params.demographic_info {
        if info.age.is_some() {
            bonus += 0.02;
        }
        if info.culture.is_some() {
            bonus += 0.03;
        }
    }
    if let Some(personal) = &params.personal_factors {
        if personal.communication_style.is_some() {
            bonus += 0.03;
        }
        if !personal.mental_health_conditions.is_empty() {
            bonus += 0.04;
        }
    }
    if let Some(context) = &params.environmental_context {
        if context.setting.is_some() {
            bonus += 0.02;
        }
    }
    bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn full_params() -> BaselinePersonalizationParams {
        BaselinePersonalizationParams {
            demographic_info: Some(DemographicInfo {
                age: Some(70),
                gender: Some("female".to_string()),
                culture: Some("East Asian".to_string()),
                language: Some("ko".to_string()),
            }),
            personal_factors: Some(PersonalFactors {
                mental_health_conditions: vec!["depression".to_string(), "anxiety".to_string()],
                communication_style: Some("reserved".to_string()),
                expressiveness: Some(0.3),
            }),
            environmental_context: Some(EnvironmentalContext {
                setting: Some("clinical".to_string()),
                time_of_day: Some("morning".to_string()),
                recent_events: vec!["Job LOSS last week".to_string()],
            }),
        }
    }

    #[test]
    fn maps_every_bucket() {
        let factors = derive_adjustment_factors(&full_params());

        assert_eq!(factors.demographic_adjustments["emotionalExpression"], 0.8);
        assert_eq!(factors.demographic_adjustments["emotionalPositivity"], 1.1);
        assert!(!factors.demographic_adjustments.contains_key("emotionalVolatility"));

        assert_eq!(factors.personal_adjustments["emotionalIntensity"], 0.8);
        assert_eq!(factors.personal_adjustments["negativeEmotionBias"], 1.3);
        assert_eq!(factors.personal_adjustments["positiveEmotionBias"], 0.7);
        assert_eq!(factors.personal_adjustments["fearIntensity"], 1.3);
        assert!(approx(factors.personal_adjustments["generalExpressionAdjustment"], 0.8));

        assert_eq!(factors.environmental_adjustments["formalityFactor"], 1.2);
        assert_eq!(factors.environmental(RESTRAINT_FACTOR), Some(1.1));
        assert_eq!(factors.environmental(EMOTIONAL_VULNERABILITY), Some(1.3));
        assert!(factors.environmental("positiveEmotionBoost").is_none());
    }

    #[test]
    fn culture_and_age_rules() {
        let params = |culture: &str, age: u32| BaselinePersonalizationParams {
            demographic_info: Some(DemographicInfo {
                age: Some(age),
                culture: Some(culture.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let latin = derive_adjustment_factors(&params("latin american", 16));
        assert_eq!(latin.demographic_adjustments["emotionalExpression"], 1.2);
        assert_eq!(latin.demographic_adjustments["emotionalVolatility"], 1.2);

        let other = derive_adjustment_factors(&params("nordic", 40));
        assert_eq!(other.demographic_adjustments["emotionalExpression"], 1.0);
        assert_eq!(other.demographic_adjustments.len(), 1);
    }

    #[test]
    fn settings_and_positive_events() {
        let context = |setting: &str, event: &str| BaselinePersonalizationParams {
            environmental_context: Some(EnvironmentalContext {
                setting: Some(setting.to_string()),
                recent_events: vec![event.to_string()],
                ..Default::default()
            }),
            ..Default::default()
        };

        let home = derive_adjustment_factors(&context("home", "big achievement at work"));
        assert_eq!(home.environmental_adjustments["comfortFactor"], 1.2);
        assert_eq!(home.environmental_adjustments["opennessFactor"], 1.1);
        assert_eq!(home.environmental("positiveEmotionBoost"), Some(1.2));
        assert!(home.environmental(EMOTIONAL_VULNERABILITY).is_none());

        let public = derive_adjustment_factors(&context("public", "routine day"));
        assert_eq!(public.environmental(RESTRAINT_FACTOR), Some(1.3));
        assert_eq!(public.environmental_adjustments.len(), 1);
    }

    #[test]
    fn empty_params_yield_no_factors() {
        let factors = derive_adjustment_factors(&BaselinePersonalizationParams::default());
        assert!(factors.is_empty());
    }

    #[test]
    fn bonus_sums_populated_fields() {
        assert_eq!(personalization_bonus(None), 0.0);
        assert!(approx(personalization_bonus(Some(&full_params())), 0.14));

        let only_age = BaselinePersonalizationParams {
            demographic_info: Some(DemographicInfo {
                age: Some(30),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(approx(personalization_bonus(Some(&only_age)), 0.02));
    }
}
