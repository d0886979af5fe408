use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{EmotionAnalysis, EmotionScore};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}

#[derive(Debug, Deserialize)]
struct SampleRow {
    sample_id: String,
    user_id: String,
    timestamp: DateTime<Utc>,
    emotion_type: String,
    intensity: f64,
    confidence: Option<f64>,
    overall_sentiment: Option<f64>,
}

pub fn import_csv(path: &Path, user_id: Option<&str>) -> Result<Vec<EmotionAnalysis>, ImportError> {
    let reader = csv::Reader::from_path(path)?;
    collect_samples(reader, user_id)
}

/// Group one-emotion-per-row CSV records into analyses keyed by
/// `(user_id, sample_id)`, in order of first appearance.
pub fn read_samples<R: Read>(
    input: R,
    user_id: Option<&str>,
) -> Result<Vec<EmotionAnalysis>, ImportError> {
    collect_samples(csv::Reader::from_reader(input), user_id)
}

fn collect_samples<R: Read>(
    mut reader: csv::Reader<R>,
    user_id: Option<&str>,
) -> Result<Vec<EmotionAnalysis>, ImportError> {
    let mut samples: Vec<EmotionAnalysis> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for (offset, result) in reader.deserialize::<SampleRow>().enumerate() {
        let row_number = offset + 1;
        let row = result?;
        if user_id.is_some_and(|wanted| wanted != row.user_id) {
            continue;
        }
        validate_row(&row, row_number)?;

        let key = (row.user_id.clone(), row.sample_id.clone());
        let position = *index.entry(key).or_insert_with(|| {
            samples.push(EmotionAnalysis {
                id: Some(row.sample_id.clone()),
                timestamp: row.timestamp,
                emotions: Vec::new(),
                overall_sentiment: None,
            });
            samples.len() - 1
        });

        let sample = &mut samples[position];
        if row.overall_sentiment.is_some() {
            sample.overall_sentiment = row.overall_sentiment;
        }
        sample.emotions.push(EmotionScore {
            emotion_type: row.emotion_type,
            intensity: row.intensity,
            confidence: row.confidence,
        });
    }

    Ok(samples)
}

fn validate_row(row: &SampleRow, row_number: usize) -> Result<(), ImportError> {
    let invalid = |message: String| {
        Err(ImportError::InvalidRow {
            row: row_number,
            message,
        })
    };

    if row.emotion_type.trim().is_empty() {
        return invalid("emotion_type is empty".to_string());
    }
    if !(0.0..=1.0).contains(&row.intensity) {
        return invalid(format!("intensity {} outside [0, 1]", row.intensity));
    }
    if let Some(confidence) = row.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return invalid(format!("confidence {confidence} outside [0, 1]"));
        }
    }
    if let Some(sentiment) = row.overall_sentiment {
        if !(-1.0..=1.0).contains(&sentiment) {
            return invalid(format!("overall_sentiment {sentiment} outside [-1, 1]"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "sample_id,user_id,timestamp,emotion_type,intensity,confidence,overall_sentiment\n";

    fn emotion_types(sample: &EmotionAnalysis) -> Vec<&str> {
        sample
            .emotions
            .iter()
            .map(|e| e.emotion_type.as_str())
            .collect()
    }

    #[test]
    fn groups_rows_by_sample() {
        let csv = format!(
            "{HEADER}\
             s1,u1,2026-02-01T09:00:00Z,joy,0.7,0.9,\n\
             s2,u1,2026-02-02T09:00:00Z,sadness,0.4,,-0.2\n\
             s1,u1,2026-02-01T09:00:00Z,trust,0.5,,\n"
        );

        let samples = read_samples(csv.as_bytes(), None).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].id.as_deref(), Some("s1"));
        assert_eq!(samples[0].emotions.len(), 2);
        assert_eq!(samples[0].emotions[0].confidence, Some(0.9));
        assert_eq!(samples[0].emotions[1].confidence, None);
        assert!(samples[0].overall_sentiment.is_none());
        assert_eq!(samples[1].overall_sentiment, Some(-0.2));
    }

    #[test]
    fn filters_by_user() {
        let csv = format!(
            "{HEADER}\
             s1,u1,2026-02-01T09:00:00Z,joy,0.7,,\n\
             s2,u2,2026-02-01T10:00:00Z,fear,0.3,,\n"
        );

        let samples = read_samples(csv.as_bytes(), Some("u2")).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].emotions[0].emotion_type, "fear");
    }

    #[test]
    fn same_sample_id_for_different_users_stays_separate() {
        let csv = format!(
            "{HEADER}\
             s1,u1,2026-02-01T09:00:00Z,joy,0.7,,\n\
             s1,u2,2026-02-01T09:00:00Z,anger,0.4,,\n\
             s1,u1,2026-02-01T09:00:00Z,trust,0.3,,\n"
        );

        let samples = read_samples(csv.as_bytes(), None).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(emotion_types(&samples[0]), vec!["joy", "trust"]);
        assert_eq!(emotion_types(&samples[1]), vec!["anger"]);
    }

    #[test]
    fn rejects_out_of_range_intensity() {
        let csv = format!(
            "{HEADER}\
             s1,u1,2026-02-01T09:00:00Z,joy,0.7,,\n\
             s2,u1,2026-02-01T10:00:00Z,anger,1.4,,\n"
        );

        match read_samples(csv.as_bytes(), None) {
            Err(ImportError::InvalidRow { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        std::fs::write(
            &path,
            format!("{HEADER}s1,u1,2026-02-01T09:00:00Z,calmness,0.2,1.0,\n"),
        )
        .unwrap();

        let samples = import_csv(&path, Some("u1")).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].emotions[0].intensity, 0.2);
    }
}
