use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of categories the facial classifier reports.
///
/// Labels outside this set are not rejected anywhere in the detection path;
/// they flow through buffers and logs verbatim. This enum exists for the seams
/// that need exhaustive coverage (prompt selection, companion styling), where
/// an unrecognized label degrades to [`Emotion::Neutral`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprise,
    Fear,
    Disgust,
    Neutral,
}

pub const ALL_EMOTIONS: [Emotion; 7] = [
    Emotion::Happy,
    Emotion::Sad,
    Emotion::Angry,
    Emotion::Surprise,
    Emotion::Fear,
    Emotion::Disgust,
    Emotion::Neutral,
];

/// Default category for empty buffers and fallback readings.
pub const NEUTRAL_LABEL: &str = "neutral";

impl Emotion {
    pub fn as_label(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprise => "surprise",
            Emotion::Fear => "fear",
            Emotion::Disgust => "disgust",
            Emotion::Neutral => "neutral",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "happy" => Some(Emotion::Happy),
            "sad" => Some(Emotion::Sad),
            "angry" => Some(Emotion::Angry),
            "surprise" => Some(Emotion::Surprise),
            "fear" => Some(Emotion::Fear),
            "disgust" => Some(Emotion::Disgust),
            "neutral" => Some(Emotion::Neutral),
            _ => None,
        }
    }

    /// Maps unknown labels to [`Emotion::Neutral`] for display purposes. The
    /// raw label is preserved wherever it is stored or logged.
    pub fn from_label_lossy(label: &str) -> Self {
        Self::from_label(label).unwrap_or(Emotion::Neutral)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
