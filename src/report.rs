use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{EmotionAnalysis, EmotionBaselineEntry, EmotionalBaseline};

pub fn ranked_emotions(baseline: &EmotionalBaseline) -> Vec<EmotionBaselineEntry> {
    let mut entries = baseline.typical_emotional_state.emotion_baselines.clone();
    entries.sort_by(|a, b| {
        b.average_intensity
            .partial_cmp(&a.average_intensity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.emotion_type.cmp(&b.emotion_type))
    });
    entries
}

fn write_bucket(output: &mut String, title: &str, factors: &BTreeMap<String, f64>) {
    if factors.is_empty() {
        return;
    }
    let _ = writeln!(output, "### {title}");
    for (name, value) in factors {
        let _ = writeln!(output, "- {name}: {value:.2}");
    }
}

pub fn build_report(baseline: &EmotionalBaseline) -> String {
    let state = &baseline.typical_emotional_state;
    let mut output = String::new();

    let _ = writeln!(output, "# Emotional Baseline Report");
    let _ = writeln!(
        output,
        "Generated for {} (updated {}, {} samples, confidence {:.2})",
        baseline.user_id,
        baseline.updated_at.format("%Y-%m-%d %H:%M UTC"),
        baseline.data_point_count,
        baseline.confidence_score
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Emotion Baselines");

    let ranked = ranked_emotions(baseline);
    if ranked.is_empty() {
        let _ = writeln!(output, "No emotions recorded for this user.");
    } else {
        for entry in ranked.iter() {
            let _ = writeln!(
                output,
                "- {}: avg intensity {:.2} (std dev {:.2})",
                entry.emotion_type, entry.average_intensity, entry.standard_deviation
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sentiment");
    let _ = writeln!(
        output,
        "- average {:+.2} (std dev {:.2})",
        state.average_sentiment, state.sentiment_standard_deviation
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Adjustment Factors");
    match baseline.adjustment_factors.as_ref().filter(|f| !f.is_empty()) {
        None => {
            let _ = writeln!(output, "No personalization supplied.");
        }
        Some(factors) => {
            write_bucket(&mut output, "Demographic", &factors.demographic_adjustments);
            write_bucket(&mut output, "Personal", &factors.personal_adjustments);
            write_bucket(&mut output, "Environmental", &factors.environmental_adjustments);
        }
    }

    output
}

/// Side-by-side view of a raw analysis and its normalized counterpart.
pub fn build_normalization_summary(raw: &EmotionAnalysis, normalized: &EmotionAnalysis) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Normalization");
    for (before, after) in raw.emotions.iter().zip(normalized.emotions.iter()) {
        let _ = writeln!(
            output,
            "- {}: {:.2} -> {:.2}",
            before.emotion_type, before.intensity, after.intensity
        );
    }

    let sentiment = |value: Option<f64>| match value {
        Some(value) => format!("{value:+.2}"),
        None => "n/a".to_string(),
    };
    let _ = writeln!(
        output,
        "- sentiment: {} -> {}",
        sentiment(raw.overall_sentiment),
        sentiment(normalized.overall_sentiment)
    );

    output
}
