use crate::camera::Frame;
use crate::classify::{Classification, ClassifyError, FaceClassifier};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Test double that plays back a queue of canned outcomes, one per call.
/// An exhausted script reports a backend failure.
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Result<Classification, ClassifyError>>>,
}

impl ScriptedClassifier {
    pub fn new(outcomes: Vec<Result<Classification, ClassifyError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
        }
    }

    /// Shorthand for a script of plain single-label classifications.
    pub fn of_labels(labels: &[&str]) -> Self {
        let outcomes = labels
            .iter()
            .map(|label| Ok(Classification::single(label, 90.0)))
            .collect();
        Self::new(outcomes)
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl FaceClassifier for ScriptedClassifier {
    fn classify(&self, _frame: &Frame) -> Result<Classification, ClassifyError> {
        let mut script = self
            .script
            .lock()
            .map_err(|_| ClassifyError::Backend("script mutex poisoned".to_owned()))?;
        script
            .pop_front()
            .unwrap_or_else(|| Err(ClassifyError::Backend("script exhausted".to_owned())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PixelFormat;
    use bytes::Bytes;
    use std::time::SystemTime;

    fn any_frame() -> Frame {
        Frame::new(
            1,
            1,
            PixelFormat::Rgb8,
            Bytes::from_static(&[0, 0, 0]),
            SystemTime::UNIX_EPOCH,
        )
        .expect("well-formed frame")
    }

    #[test]
    fn plays_back_in_order_then_fails() {
        let classifier = ScriptedClassifier::of_labels(&["happy", "sad"]);
        let frame = any_frame();

        let first = classifier.classify(&frame).expect("first");
        assert_eq!(first.dominant_emotion, "happy");
        let second = classifier.classify(&frame).expect("second");
        assert_eq!(second.dominant_emotion, "sad");
        assert!(classifier.classify(&frame).is_err());
    }
}
