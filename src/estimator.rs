use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EstimatorConfig;
use crate::error::{BaselineError, Result};
use crate::factors::{
    derive_adjustment_factors, mentions_distress, personalization_bonus,
    EMOTIONAL_VULNERABILITY, RESTRAINT_FACTOR,
};
use crate::models::{
    BaselinePersonalizationParams, EmotionAnalysis, EmotionBaselineEntry, EmotionalBaseline,
    EnvironmentalContext, TypicalEmotionalState,
};
use crate::sentiment::{derive_sentiment, in_emotion_set, mean_and_std_dev};

/// Emotions whose expression a clinical setting tends to hold back.
const RESTRAINED_EMOTIONS: [&str; 3] = ["anger", "joy", "excitement"];
/// Emotions amplified after distressing events.
const VULNERABLE_EMOTIONS: [&str; 3] = ["sadness", "fear", "anger"];

/// Builds, merges and applies per-user emotional baselines.
///
/// Every operation is a pure function of its inputs. Persisting the result
/// and serializing concurrent updates for one user is the caller's job.
#[derive(Debug, Clone, Default)]
pub struct BaselineEstimator {
    config: EstimatorConfig,
}

impl BaselineEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn create_baseline(
        &self,
        user_id: &str,
        samples: &[EmotionAnalysis],
        params: Option<&BaselinePersonalizationParams>,
    ) -> Result<EmotionalBaseline> {
        if samples.len() < self.config.min_samples {
            warn!(
                user_id,
                samples = samples.len(),
                "not enough samples to establish a baseline"
            );
            return Err(BaselineError::InsufficientData {
                required: self.config.min_samples,
                actual: samples.len(),
            });
        }

        let now = Utc::now();
        let baseline = EmotionalBaseline {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
            typical_emotional_state: self.typical_state(samples),
            adjustment_factors: params.map(derive_adjustment_factors),
            confidence_score: self.sample_confidence(samples.len(), params),
            data_point_count: samples.len(),
        };

        info!(
            user_id,
            samples = samples.len(),
            confidence = baseline.confidence_score,
            "created emotional baseline"
        );
        Ok(baseline)
    }

    /// Fold `new_samples` into `baseline`. The existing baseline never gets
    /// more than `max_existing_weight` of the merge, however long its history.
    pub fn update_baseline(
        &self,
        baseline: &EmotionalBaseline,
        new_samples: &[EmotionAnalysis],
        params: Option<&BaselinePersonalizationParams>,
    ) -> Result<EmotionalBaseline> {
        if new_samples.is_empty() {
            return Ok(baseline.clone());
        }
        validate(baseline)?;

        let existing_count = baseline.data_point_count as f64;
        let new_count = new_samples.len() as f64;
        let total = existing_count + new_count;
        let existing_weight = (existing_count / total).min(self.config.max_existing_weight);
        let new_weight = 1.0 - existing_weight;
        let blend = |old: f64, new: f64| old * existing_weight + new * new_weight;

        let previous = &baseline.typical_emotional_state;
        let fresh = self.typical_state(new_samples);

        let mut merged: BTreeMap<String, EmotionBaselineEntry> = previous
            .emotion_baselines
            .iter()
            .map(|entry| (entry.emotion_type.clone(), entry.clone()))
            .collect();
        for entry in fresh.emotion_baselines {
            match merged.get_mut(&entry.emotion_type) {
                Some(existing) => {
                    existing.average_intensity =
                        blend(existing.average_intensity, entry.average_intensity);
                    existing.standard_deviation = blend(
                        existing.standard_deviation,
                        entry.standard_deviation,
                    )
                    .max(self.config.std_dev_floor);
                }
                None => {
                    merged.insert(entry.emotion_type.clone(), entry);
                }
            }
        }

        let typical_emotional_state = TypicalEmotionalState {
            emotion_baselines: merged.into_values().collect(),
            average_sentiment: blend(previous.average_sentiment, fresh.average_sentiment),
            sentiment_standard_deviation: blend(
                previous.sentiment_standard_deviation,
                fresh.sentiment_standard_deviation,
            )
            .max(self.config.std_dev_floor),
        };

        let new_confidence = self.sample_confidence(new_samples.len(), params);
        let confidence_score = ((baseline.confidence_score * existing_count
            + new_confidence * new_count)
            / total)
            .min(self.config.max_confidence);

        let updated = EmotionalBaseline {
            id: baseline.id,
            user_id: baseline.user_id.clone(),
            created_at: baseline.created_at,
            updated_at: Utc::now(),
            typical_emotional_state,
            adjustment_factors: match params {
                Some(params) => Some(derive_adjustment_factors(params)),
                None => baseline.adjustment_factors.clone(),
            },
            confidence_score,
            data_point_count: baseline.data_point_count + new_samples.len(),
        };

        info!(
            user_id = %updated.user_id,
            existing_weight,
            data_points = updated.data_point_count,
            confidence = updated.confidence_score,
            "updated emotional baseline"
        );
        Ok(updated)
    }

    /// Interpret `analysis` relative to the user's baseline and, optionally,
    /// the circumstances it was recorded in. Returns a new analysis.
    pub fn normalize(
        &self,
        analysis: &EmotionAnalysis,
        baseline: &EmotionalBaseline,
        context: Option<&EnvironmentalContext>,
    ) -> Result<EmotionAnalysis> {
        validate(baseline)?;

        let state = &baseline.typical_emotional_state;
        let mut normalized = analysis.clone();
        let sentiment = normalized
            .overall_sentiment
            .unwrap_or_else(|| derive_sentiment(&analysis.emotions));

        for emotion in normalized.emotions.iter_mut() {
            let Some(entry) = state.baseline_for(&emotion.emotion_type) else {
                continue;
            };
            let deviation = (emotion.intensity - entry.average_intensity) / entry.standard_deviation;
            let scale = if deviation.abs() > self.config.atypical_deviation {
                self.config.atypical_scale
            } else {
                self.config.typical_scale
            };
            debug!(
                emotion = %emotion.emotion_type,
                deviation,
                scale,
                "scaled emotion against baseline"
            );
            emotion.intensity = (emotion.intensity * scale).clamp(0.0, 1.0);
        }

        let typical_sentiment =
            (sentiment - state.average_sentiment).abs() < state.sentiment_standard_deviation;
        normalized.overall_sentiment = Some(if typical_sentiment {
            (sentiment + state.average_sentiment) / 2.0
        } else {
            sentiment
        });

        if let (Some(context), Some(factors)) = (context, baseline.adjustment_factors.as_ref()) {
            let clinical = context
                .setting
                .as_deref()
                .is_some_and(|setting| setting.trim().eq_ignore_ascii_case("clinical"));
            if clinical {
                if let Some(restraint) = factors.environmental(RESTRAINT_FACTOR).filter(|f| *f > 0.0) {
                    for emotion in normalized.emotions.iter_mut() {
                        if in_emotion_set(&RESTRAINED_EMOTIONS, &emotion.emotion_type) {
                            emotion.intensity = (emotion.intensity / restraint).clamp(0.0, 1.0);
                        }
                    }
                }
            }

            if mentions_distress(&context.recent_events) {
                if let Some(vulnerability) = factors.environmental(EMOTIONAL_VULNERABILITY) {
                    for emotion in normalized.emotions.iter_mut() {
                        if in_emotion_set(&VULNERABLE_EMOTIONS, &emotion.emotion_type) {
                            emotion.intensity = (emotion.intensity * vulnerability).clamp(0.0, 1.0);
                        }
                    }
                }
            }
        }

        Ok(normalized)
    }

    fn typical_state(&self, samples: &[EmotionAnalysis]) -> TypicalEmotionalState {
        let floor = self.config.std_dev_floor;
        let mut intensities: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        let mut sentiments = Vec::with_capacity(samples.len());

        for sample in samples {
            for emotion in &sample.emotions {
                intensities
                    .entry(emotion.emotion_type.as_str())
                    .or_default()
                    .push(emotion.intensity);
            }
            sentiments.push(
                sample
                    .overall_sentiment
                    .unwrap_or_else(|| derive_sentiment(&sample.emotions)),
            );
        }

        let emotion_baselines = intensities
            .into_iter()
            .map(|(emotion_type, values)| {
                let (mean, std_dev) = mean_and_std_dev(&values);
                EmotionBaselineEntry {
                    emotion_type: emotion_type.to_string(),
                    average_intensity: mean,
                    standard_deviation: std_dev.max(floor),
                }
            })
            .collect::<Vec<_>>();

        let (average_sentiment, sentiment_std_dev) = mean_and_std_dev(&sentiments);
        debug!(
            emotion_types = emotion_baselines.len(),
            average_sentiment,
            sentiment_std_dev,
            "computed typical emotional state"
        );

        TypicalEmotionalState {
            emotion_baselines,
            average_sentiment,
            sentiment_standard_deviation: sentiment_std_dev.max(floor),
        }
    }

    fn sample_confidence(
        &self,
        sample_count: usize,
        params: Option<&BaselinePersonalizationParams>,
    ) -> f64 {
        let from_samples = (self.config.confidence_per_sample * sample_count as f64)
            .min(self.config.max_sample_confidence);
        (from_samples + personalization_bonus(params)).min(self.config.max_confidence)
    }
}

fn validate(baseline: &EmotionalBaseline) -> Result<()> {
    let malformed = |reason: String| Err(BaselineError::MalformedBaseline(reason));

    if baseline.data_point_count == 0 {
        return malformed(format!("baseline {} has no data points", baseline.id));
    }
    if !baseline.confidence_score.is_finite() {
        return malformed(format!("baseline {} has a non-finite confidence", baseline.id));
    }

    let state = &baseline.typical_emotional_state;
    let spreads = state
        .emotion_baselines
        .iter()
        .map(|entry| {
            (
                entry.emotion_type.as_str(),
                entry.average_intensity,
                entry.standard_deviation,
            )
        })
        .chain(std::iter::once((
            "sentiment",
            state.average_sentiment,
            state.sentiment_standard_deviation,
        )));
    for (name, average, std_dev) in spreads {
        if !average.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
            return malformed(format!(
                "{name} has invalid statistics (mean {average}, std dev {std_dev})"
            ));
        }
    }
    Ok(())
}
