use std::path::Path;

use crate::{classifier::ClassifierError, types::TrainingSample};

/// `(sentence, emotion, intent, context)` rows the bundled models are trained on.
const SAMPLE_ROWS: [(&str, &str, &str, &str); 10] = [
    ("I'm stressed from studying all night", "Anxious", "Study", "Exams"),
    ("Need something calm after interview prep", "Calm", "Relax", "Job Search"),
    ("So tired after midterms, but need to grind", "Tired", "Study", "Exams"),
    ("Burning out from nonstop assignments", "Overwhelmed", "Rest", "Burnout"),
    ("Let’s get pumped for leg day", "Energized", "Workout", "Gym"),
    ("Just want to chill after a long day", "Calm", "Relax", "General Stress"),
    ("Finals week is killing me", "Stressed", "Study", "Exams"),
    ("No calls back from interviews... feeling lost", "Sad", "Rest", "Job Search"),
    ("Need background music while I code", "Focused", "Study", "Work"),
    ("Let's party and forget this week", "Excited", "Party", "General Stress"),
];

/// The built-in ten row training set.
pub fn sample_dataset() -> Vec<TrainingSample> {
    SAMPLE_ROWS
        .iter()
        .map(|(sentence, emotion, intent, context)| TrainingSample {
            sentence: sentence.to_string(),
            emotion: emotion.to_string(),
            intent: intent.to_string(),
            context: context.to_string(),
        })
        .collect()
}

/// Reads a training set from a JSON array of
/// `{"sentence", "emotion", "intent", "context"}` objects.
pub async fn load_dataset(path: &Path) -> Result<Vec<TrainingSample>, ClassifierError> {
    let content = async_fs::read_to_string(path)
        .await
        .map_err(|e| ClassifierError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

    let samples: Vec<TrainingSample> =
        serde_json::from_str(&content).map_err(|e| ClassifierError::Format {
            path: path.to_path_buf(),
            source: e,
        })?;

    if samples.is_empty() {
        return Err(ClassifierError::EmptyDataset);
    }

    Ok(samples)
}
