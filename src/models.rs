use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single detected emotion within an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionScore {
    #[serde(rename = "type")]
    pub emotion_type: String,
    pub intensity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl EmotionScore {
    pub fn new(emotion_type: impl Into<String>, intensity: f64) -> Self {
        Self {
            emotion_type: emotion_type.into(),
            intensity,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Confidence used as a weight; missing confidence counts as full.
    pub fn weight(&self) -> f64 {
        self.confidence.unwrap_or(1.0)
    }
}

/// Output of an upstream analysis provider for one moment in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub emotions: Vec<EmotionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_sentiment: Option<f64>,
}

impl EmotionAnalysis {
    pub fn new(timestamp: DateTime<Utc>, emotions: Vec<EmotionScore>) -> Self {
        Self {
            id: None,
            timestamp,
            emotions,
            overall_sentiment: None,
        }
    }

    pub fn emotion(&self, emotion_type: &str) -> Option<&EmotionScore> {
        self.emotions
            .iter()
            .find(|emotion| emotion.emotion_type == emotion_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionBaselineEntry {
    #[serde(rename = "type")]
    pub emotion_type: String,
    pub average_intensity: f64,
    pub standard_deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypicalEmotionalState {
    pub emotion_baselines: Vec<EmotionBaselineEntry>,
    pub average_sentiment: f64,
    pub sentiment_standard_deviation: f64,
}

impl TypicalEmotionalState {
    pub fn baseline_for(&self, emotion_type: &str) -> Option<&EmotionBaselineEntry> {
        self.emotion_baselines
            .iter()
            .find(|entry| entry.emotion_type == emotion_type)
    }
}

/// Named multiplicative factors derived from personalization parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentFactors {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub demographic_adjustments: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub personal_adjustments: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environmental_adjustments: BTreeMap<String, f64>,
}

impl AdjustmentFactors {
    pub fn is_empty(&self) -> bool {
        self.demographic_adjustments.is_empty()
            && self.personal_adjustments.is_empty()
            && self.environmental_adjustments.is_empty()
    }

    pub fn environmental(&self, key: &str) -> Option<f64> {
        self.environmental_adjustments.get(key).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalBaseline {
    pub id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub typical_emotional_state: TypicalEmotionalState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment_factors: Option<AdjustmentFactors>,
    pub confidence_score: f64,
    pub data_point_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicInfo {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub culture: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalFactors {
    #[serde(default)]
    pub mental_health_conditions: Vec<String>,
    #[serde(default)]
    pub communication_style: Option<String>,
    /// 0 (flat) to 1 (highly expressive)
    #[serde(default)]
    pub expressiveness: Option<f64>,
}

/// Where and under what circumstances a reading was taken.
///
/// Doubles as the current context passed to normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalContext {
    #[serde(default)]
    pub setting: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub recent_events: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselinePersonalizationParams {
    #[serde(default)]
    pub demographic_info: Option<DemographicInfo>,
    #[serde(default)]
    pub personal_factors: Option<PersonalFactors>,
    #[serde(default)]
    pub environmental_context: Option<EnvironmentalContext>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_upstream_analysis_json() {
        let json = r#"{
            "timestamp": "2026-03-01T10:00:00Z",
            "emotions": [
                {"type": "joy", "intensity": 0.7, "confidence": 0.9},
                {"type": "anxiety", "intensity": 0.2}
            ]
        }"#;

        let analysis: EmotionAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.emotions.len(), 2);
        assert_eq!(analysis.emotion("joy").unwrap().confidence, Some(0.9));
        assert_eq!(analysis.emotion("anxiety").unwrap().weight(), 1.0);
        assert!(analysis.overall_sentiment.is_none());
    }

    #[test]
    fn adjustment_buckets_use_camel_case_keys() {
        let mut factors = AdjustmentFactors::default();
        factors
            .environmental_adjustments
            .insert("restraintFactor".to_string(), 1.2);

        let value = serde_json::to_value(&factors).unwrap();
        assert_eq!(value["environmentalAdjustments"]["restraintFactor"], 1.2);
        assert!(value.get("demographicAdjustments").is_none());
        assert_eq!(factors.environmental("restraintFactor"), Some(1.2));
    }
}
