mod heuristic;
mod scripted;

use crate::camera::Frame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use heuristic::HeuristicClassifier;
pub use scripted::ScriptedClassifier;

/// Result of one classification call, already reduced to a single face: when a
/// backend reports several, it must return the first face in its own ordering.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    /// Highest-confidence label. Not restricted to the closed category set;
    /// foreign labels pass through untouched.
    pub dominant_emotion: String,
    /// Confidence per label, each in [0, 100].
    pub emotions: BTreeMap<String, f32>,
    /// Whether a face was actually located. Tolerant backends still produce a
    /// score distribution when no face is present.
    pub face_found: bool,
}

impl Classification {
    /// A distribution concentrated on one label, for scripts and examples.
    pub fn single(label: &str, confidence: f32) -> Self {
        let mut emotions = BTreeMap::new();
        emotions.insert(label.to_owned(), confidence);
        Self {
            dominant_emotion: label.to_owned(),
            emotions,
            face_found: true,
        }
    }

    /// Confidence of the dominant label, 0 when the backend omitted it from
    /// the distribution.
    pub fn dominant_confidence(&self) -> f32 {
        self.emotions
            .get(&self.dominant_emotion)
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("no usable image: {0}")]
    UnreadableFrame(String),

    #[error("classifier backend failed: {0}")]
    Backend(String),
}

/// Facial emotion classifier collaborator. Invoked as a stateless service
/// call; the detector holds no reference to it between calls. Implementations
/// must not fail merely because no face is found.
pub trait FaceClassifier: Send + Sync {
    fn classify(&self, frame: &Frame) -> Result<Classification, ClassifyError>;
}
