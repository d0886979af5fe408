//! Sentiment derivation shared by baseline creation and normalization.

use crate::models::EmotionScore;

pub const POSITIVE_EMOTIONS: [&str; 5] = ["joy", "trust", "contentment", "excitement", "calmness"];
pub const NEGATIVE_EMOTIONS: [&str; 5] = ["sadness", "anger", "fear", "disgust", "anxiety"];

/// Emotion-set membership ignores ASCII case.
pub fn in_emotion_set(set: &[&str], emotion_type: &str) -> bool {
    set.iter().any(|name| name.eq_ignore_ascii_case(emotion_type))
}

/// Confidence-weighted positive minus negative affect, in [-1, 1].
///
/// Every emotion contributes its confidence to the total weight, including
/// emotions that belong to neither set. Returns 0 when there is no weight.
pub fn derive_sentiment(emotions: &[EmotionScore]) -> f64 {
    let mut positive = 0.0;
    let mut negative = 0.0;
    let mut total_weight = 0.0;

    for emotion in emotions {
        let weight = emotion.weight();
        if in_emotion_set(&POSITIVE_EMOTIONS, &emotion.emotion_type) {
            positive += emotion.intensity * weight;
        } else if in_emotion_set(&NEGATIVE_EMOTIONS, &emotion.emotion_type) {
            negative += emotion.intensity * weight;
        }
        total_weight += weight;
    }

    if total_weight > 0.0 {
        (positive - negative) / total_weight
    } else {
        0.0
    }
}

/// Arithmetic mean and population standard deviation.
pub fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn balances_positive_against_negative() {
        let emotions = vec![
            EmotionScore::new("joy", 0.8),
            EmotionScore::new("sadness", 0.4),
        ];
        assert!(approx(derive_sentiment(&emotions), (0.8 - 0.4) / 2.0));
    }

    #[test]
    fn weights_by_confidence() {
        let emotions = vec![
            EmotionScore::new("joy", 1.0).with_confidence(0.5),
            EmotionScore::new("fear", 1.0).with_confidence(1.0),
        ];
        assert!(approx(derive_sentiment(&emotions), (0.5 - 1.0) / 1.5));
    }

    #[test]
    fn neutral_emotions_dilute_the_score() {
        let emotions = vec![
            EmotionScore::new("trust", 0.6),
            EmotionScore::new("surprise", 0.9),
        ];
        assert!(approx(derive_sentiment(&emotions), 0.3));
    }

    #[test]
    fn empty_or_weightless_is_neutral() {
        assert_eq!(derive_sentiment(&[]), 0.0);
        let weightless = vec![EmotionScore::new("joy", 0.9).with_confidence(0.0)];
        assert_eq!(derive_sentiment(&weightless), 0.0);
    }

    #[test]
    fn population_std_dev() {
        let (mean, std_dev) = mean_and_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!(approx(mean, 5.0));
        assert!(approx(std_dev, 2.0));
        assert_eq!(mean_and_std_dev(&[]), (0.0, 0.0));
    }
}
