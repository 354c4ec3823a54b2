mod clock;

use crate::camera::Frame;
use crate::classify::{Classification, FaceClassifier};
use crate::config::DetectorConfig;
use crate::emotion::NEUTRAL_LABEL;
use crate::util::HistoryBuffer;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use clock::{Clock, ManualClock, SystemClock};

/// Spacing of session-log entries, independent of the detection interval.
pub const SESSION_LOG_INTERVAL_SECS: f64 = 15.0;

/// One successful classification, as held in the smoothing buffer.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RecentObservation {
    pub emotion: String,
    pub confidence: f32,
    pub timestamp: f64,
    pub all_emotions: BTreeMap<String, f32>,
}

/// Coarse-cadence timeline record. Field names match the exported JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionLogEntry {
    pub emotion: String,
    pub timestamp: f64,
    pub readable_time: String,
}

/// Per-call verdict handed to the consumer. Always well-formed; a failed
/// classification surfaces as the neutral fallback with `error` attached.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct EmotionReading {
    pub emotion: String,
    pub confidence: f32,
    pub smoothed_emotion: String,
    pub all_emotions: BTreeMap<String, f32>,
    pub face_detected: bool,
    pub timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EmotionReading {
    fn fallback(timestamp: f64, error: Option<String>) -> Self {
        Self {
            emotion: NEUTRAL_LABEL.to_owned(),
            confidence: 0.0,
            smoothed_emotion: NEUTRAL_LABEL.to_owned(),
            all_emotions: BTreeMap::new(),
            face_detected: false,
            timestamp,
            error,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SessionSummary {
    pub duration_minutes: f64,
    pub total_emotions_logged: usize,
    pub most_common_emotion: String,
    pub emotion_breakdown: BTreeMap<String, usize>,
    pub session_start: String,
    pub session_end: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("failed to serialize emotion log")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write emotion log: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts a stream of camera frames into a stable emotion verdict while
/// bounding classifier call frequency, and keeps a coarse session log for
/// analytics.
///
/// The detector is a passive, single-threaded object: every call runs to
/// completion synchronously. One instance must not be mutated from multiple
/// threads without external serialization; confine it to one producer thread.
pub struct EmotionDetector {
    config: DetectorConfig,
    clock: Box<dyn Clock>,
    history: HistoryBuffer<RecentObservation>,
    session_log: Vec<SessionLogEntry>,
    last_detection: Option<SystemTime>,
}

fn unix_secs(t: SystemTime) -> f64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn readable_time(t: SystemTime) -> String {
    DateTime::<Local>::from(t).format("%H:%M:%S").to_string()
}

impl EmotionDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: DetectorConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            clock: Box::new(clock),
            history: HistoryBuffer::new(config.smoothing_window.get()),
            session_log: Vec::new(),
            last_detection: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Classifies one frame, or returns the cached verdict when the detection
    /// interval has not elapsed since the last actual classification.
    ///
    /// Never fails: classifier errors produce a neutral fallback reading with
    /// the error description attached, and leave the buffer and session log
    /// untouched.
    pub fn detect_emotion(
        &mut self,
        frame: &Frame,
        classifier: &dyn FaceClassifier,
    ) -> EmotionReading {
        let now = self.clock.now();

        if let Some(last) = self.last_detection {
            // A clock that moved backwards reads as zero elapsed time, which
            // keeps the gate closed until real time catches up.
            let elapsed = now.duration_since(last).unwrap_or_default();
            if elapsed < self.config.detection_interval.duration() {
                return self.cached_reading(now);
            }
        }

        let rgb = frame.to_rgb8();
        match classifier.classify(&rgb) {
            Ok(classification) => self.record_classification(classification, now),
            Err(e) => {
                tracing::warn!(error = %e, "emotion classification failed");
                EmotionReading::fallback(unix_secs(now), Some(e.to_string()))
            }
        }
    }

    fn record_classification(
        &mut self,
        classification: Classification,
        now: SystemTime,
    ) -> EmotionReading {
        let timestamp = unix_secs(now);
        let confidence = classification.dominant_confidence();

        self.history.push(RecentObservation {
            emotion: classification.dominant_emotion.clone(),
            confidence,
            timestamp,
            all_emotions: classification.emotions.clone(),
        });
        self.last_detection = Some(now);

        let smoothed = self.smoothed_emotion();

        let due = match self.session_log.last() {
            None => true,
            Some(last) => timestamp - last.timestamp >= SESSION_LOG_INTERVAL_SECS,
        };
        if due {
            let entry = SessionLogEntry {
                emotion: smoothed.clone(),
                timestamp,
                readable_time: readable_time(now),
            };
            tracing::debug!(emotion = %entry.emotion, time = %entry.readable_time, "logged emotion");
            self.session_log.push(entry);
        }

        EmotionReading {
            emotion: classification.dominant_emotion,
            confidence,
            smoothed_emotion: smoothed,
            all_emotions: classification.emotions,
            face_detected: classification.face_found,
            timestamp,
            error: None,
        }
    }

    fn cached_reading(&self, now: SystemTime) -> EmotionReading {
        match self.history.latest() {
            Some(last) => EmotionReading {
                emotion: last.emotion.clone(),
                confidence: last.confidence,
                smoothed_emotion: self.smoothed_emotion(),
                all_emotions: last.all_emotions.clone(),
                face_detected: true,
                timestamp: last.timestamp,
                error: None,
            },
            None => EmotionReading::fallback(unix_secs(now), None),
        }
    }

    /// Recency-weighted plurality vote over the buffer: entry `i` of `n`
    /// weighs `(i + 1) / n`, so newer observations dominate. Ties go to the
    /// category encountered first in buffer order. Empty buffer reads neutral.
    pub fn smoothed_emotion(&self) -> String {
        let n = self.history.len();
        if n == 0 {
            return NEUTRAL_LABEL.to_owned();
        }

        let mut weights: Vec<(&str, f64)> = Vec::new();
        for (i, obs) in self.history.iter().enumerate() {
            let weight = (i + 1) as f64 / n as f64;
            match weights.iter().position(|(label, _)| *label == obs.emotion) {
                Some(idx) => weights[idx].1 += weight,
                None => weights.push((obs.emotion.as_str(), weight)),
            }
        }

        let mut best = &weights[0];
        for candidate in &weights[1..] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best.0.to_owned()
    }

    pub fn observation_count(&self) -> usize {
        self.history.len()
    }

    /// The full session log, oldest first. Consumers read this directly; the
    /// JSON export exists only for post-hoc inspection.
    pub fn emotion_log(&self) -> &[SessionLogEntry] {
        &self.session_log
    }

    /// `None` means nothing has been logged yet, as distinct from a
    /// zero-duration session.
    pub fn session_summary(&self) -> Option<SessionSummary> {
        let first = self.session_log.first()?;
        let last = self.session_log.last()?;

        let mut counts: Vec<(&str, usize)> = Vec::new();
        for entry in &self.session_log {
            match counts.iter().position(|(label, _)| *label == entry.emotion) {
                Some(idx) => counts[idx].1 += 1,
                None => counts.push((entry.emotion.as_str(), 1)),
            }
        }
        let mut best = &counts[0];
        for candidate in &counts[1..] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }

        let duration_secs = last.timestamp - first.timestamp;
        Some(SessionSummary {
            duration_minutes: (duration_secs / 60.0 * 10.0).round() / 10.0,
            total_emotions_logged: self.session_log.len(),
            most_common_emotion: best.0.to_owned(),
            emotion_breakdown: counts
                .iter()
                .map(|(label, count)| ((*label).to_owned(), *count))
                .collect(),
            session_start: first.readable_time.clone(),
            session_end: last.readable_time.clone(),
        })
    }

    /// Writes the session log as a JSON array. Without an explicit path the
    /// filename carries the current unix time to avoid collisions. Write
    /// failures propagate; the in-memory log is unaffected.
    pub fn export_emotion_log(&self, path: Option<&Path>) -> Result<PathBuf, ExportError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(format!(
                "emotion_log_{}.json",
                unix_secs(self.clock.now()) as u64
            )),
        };
        let json = serde_json::to_string_pretty(&self.session_log)?;
        std::fs::write(&path, json)?;
        tracing::info!(path = %path.display(), entries = self.session_log.len(), "emotion log exported");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PixelFormat;
    use crate::classify::{Classification, ClassifyError, ScriptedClassifier};
    use crate::config::DetectorConfig;
    use bytes::Bytes;
    use std::time::Duration;

    fn frame() -> Frame {
        Frame::new(
            2,
            2,
            PixelFormat::Rgb8,
            Bytes::from(vec![128u8; 12]),
            SystemTime::UNIX_EPOCH,
        )
        .expect("well-formed frame")
    }

    fn config(window: usize, interval_secs: f64) -> DetectorConfig {
        DetectorConfig::new(window, interval_secs).expect("valid config")
    }

    fn detector(window: usize, interval_secs: f64) -> (EmotionDetector, ManualClock) {
        let clock = ManualClock::default();
        let detector = EmotionDetector::with_clock(config(window, interval_secs), clock.clone());
        (detector, clock)
    }

    #[test]
    fn fresh_detector_is_neutral_with_no_data() {
        let (detector, _clock) = detector(8, 2.0);
        assert_eq!(detector.smoothed_emotion(), "neutral");
        assert!(detector.session_summary().is_none());
        assert!(detector.emotion_log().is_empty());
    }

    #[test]
    fn gated_call_reuses_last_verdict_without_invoking_classifier() {
        let (mut detector, clock) = detector(8, 2.0);
        let classifier = ScriptedClassifier::of_labels(&["happy", "sad"]);

        let first = detector.detect_emotion(&frame(), &classifier);
        assert_eq!(first.emotion, "happy");

        clock.advance(Duration::from_secs(1));
        let second = detector.detect_emotion(&frame(), &classifier);
        assert_eq!(second.emotion, first.emotion);
        assert_eq!(second.all_emotions, first.all_emotions);
        assert!(second.face_detected);
        // The "sad" entry is still queued: only one classification ran.
        assert_eq!(classifier.remaining(), 1);

        clock.advance(Duration::from_secs(2));
        let third = detector.detect_emotion(&frame(), &classifier);
        assert_eq!(third.emotion, "sad");
        assert_eq!(classifier.remaining(), 0);
    }

    #[test]
    fn failed_first_call_reads_neutral() {
        let (mut detector, _clock) = detector(8, 2.0);
        let failing = ScriptedClassifier::new(vec![Err(ClassifyError::Backend(
            "model load failed".to_owned(),
        ))]);
        let reading = detector.detect_emotion(&frame(), &failing);
        assert!(!reading.face_detected);
        assert_eq!(reading.smoothed_emotion, "neutral");
    }

    #[test]
    fn newest_entry_outweighs_older_majority() {
        // Capacity 3, arrivals [sad, sad, happy], weights 1/3, 2/3, 3/3.
        // happy's single full weight edges out sad's 1/3 + 2/3 (which lands
        // just under 1.0 in double precision), so the newest entry wins.
        let (mut detector, clock) = detector(3, 0.5);
        let classifier = ScriptedClassifier::of_labels(&["sad", "sad", "happy"]);
        for _ in 0..3 {
            detector.detect_emotion(&frame(), &classifier);
            clock.advance(Duration::from_secs(1));
        }
        assert_eq!(detector.observation_count(), 3);
        assert_eq!(detector.smoothed_emotion(), "happy");
    }

    #[test]
    fn majority_concentrated_in_recent_entries_wins() {
        let run = |labels: &[&str]| {
            let (mut detector, clock) = detector(4, 0.5);
            let classifier = ScriptedClassifier::of_labels(labels);
            for _ in 0..labels.len() {
                detector.detect_emotion(&frame(), &classifier);
                clock.advance(Duration::from_secs(1));
            }
            detector.smoothed_emotion()
        };
        // Same multiset, opposite placement: the recent half wins both times.
        assert_eq!(run(&["sad", "sad", "happy", "happy"]), "happy");
        assert_eq!(run(&["happy", "happy", "sad", "sad"]), "sad");
    }

    #[test]
    fn tied_weights_resolve_to_first_encountered_category() {
        // Weights 1/4, 2/4, 3/4, 4/4 over [angry, happy, happy, angry]:
        // angry = 0.25 + 1.0 = 1.25, happy = 0.5 + 0.75 = 1.25.
        let (mut detector, clock) = detector(4, 0.5);
        let classifier = ScriptedClassifier::of_labels(&["angry", "happy", "happy", "angry"]);
        for _ in 0..4 {
            detector.detect_emotion(&frame(), &classifier);
            clock.advance(Duration::from_secs(1));
        }
        assert_eq!(detector.smoothed_emotion(), "angry");
    }

    #[test]
    fn smoothed_emotion_is_always_present_in_buffer() {
        let (mut detector, clock) = detector(5, 0.5);
        let labels = ["happy", "fear", "surprise", "fear", "neutral"];
        let classifier = ScriptedClassifier::of_labels(&labels);
        for _ in 0..labels.len() {
            detector.detect_emotion(&frame(), &classifier);
            clock.advance(Duration::from_secs(1));
        }
        assert!(labels.contains(&detector.smoothed_emotion().as_str()));
    }

    #[test]
    fn classifier_failure_yields_fallback_and_leaves_state_intact() {
        let (mut detector, clock) = detector(8, 0.5);
        let classifier = ScriptedClassifier::new(vec![
            Ok(Classification::single("happy", 88.0)),
            Err(ClassifyError::UnreadableFrame("no usable image".to_owned())),
            Ok(Classification::single("sad", 70.0)),
        ]);

        detector.detect_emotion(&frame(), &classifier);
        assert_eq!(detector.observation_count(), 1);
        let log_len = detector.emotion_log().len();

        clock.advance(Duration::from_secs(1));
        let failed = detector.detect_emotion(&frame(), &classifier);
        assert_eq!(failed.emotion, "neutral");
        assert_eq!(failed.confidence, 0.0);
        assert!(!failed.face_detected);
        assert!(failed.all_emotions.is_empty());
        assert!(failed.error.is_some());
        assert_eq!(detector.observation_count(), 1);
        assert_eq!(detector.emotion_log().len(), log_len);

        // Still usable after the failure.
        clock.advance(Duration::from_secs(1));
        let recovered = detector.detect_emotion(&frame(), &classifier);
        assert_eq!(recovered.emotion, "sad");
        assert!(recovered.error.is_none());
    }

    #[test]
    fn unknown_labels_pass_through_untouched() {
        let (mut detector, _clock) = detector(4, 2.0);
        let classifier = ScriptedClassifier::of_labels(&["contempt"]);
        let reading = detector.detect_emotion(&frame(), &classifier);
        assert_eq!(reading.emotion, "contempt");
        assert_eq!(reading.smoothed_emotion, "contempt");
        assert_eq!(detector.emotion_log()[0].emotion, "contempt");
    }

    #[test]
    fn log_cadence_is_independent_of_detection_interval() {
        // 2 s sampling over 30 s: 16 classifications, entries only at t=0 and
        // the first sample at or past 15 s.
        let (mut detector, clock) = detector(8, 2.0);
        let labels = vec!["happy"; 16];
        let classifier = ScriptedClassifier::of_labels(&labels);
        for _ in 0..16 {
            detector.detect_emotion(&frame(), &classifier);
            clock.advance(Duration::from_secs(2));
        }
        assert_eq!(detector.emotion_log().len(), 2);
        let log = detector.emotion_log();
        assert_eq!(log[0].timestamp, 0.0);
        assert_eq!(log[1].timestamp, 16.0);
    }

    #[test]
    fn log_entries_carry_the_smoothed_category() {
        let (mut detector, clock) = detector(4, 1.0);
        // First call logs "sad" immediately; by the 16 s mark the window is
        // dominated by recent "happy" observations.
        let classifier =
            ScriptedClassifier::of_labels(&["sad", "happy", "happy", "happy", "happy"]);
        for _ in 0..5 {
            detector.detect_emotion(&frame(), &classifier);
            clock.advance(Duration::from_secs(4));
        }
        let log = detector.emotion_log();
        assert_eq!(log[0].emotion, "sad");
        assert_eq!(log[1].emotion, "happy");
    }

    #[test]
    fn summary_aggregates_the_full_log() {
        let (mut detector, clock) = detector(1, 1.0);
        // 1-entry window: smoothed == instantaneous, logged every >= 15 s.
        let labels = ["happy", "happy", "sad", "happy", "fear", "happy", "happy"];
        let classifier = ScriptedClassifier::of_labels(&labels);
        for _ in 0..labels.len() {
            detector.detect_emotion(&frame(), &classifier);
            clock.advance(Duration::from_secs(15));
        }

        let summary = detector.session_summary().expect("populated summary");
        assert_eq!(summary.total_emotions_logged, 7);
        assert_eq!(summary.most_common_emotion, "happy");
        assert_eq!(summary.emotion_breakdown["happy"], 5);
        assert_eq!(summary.emotion_breakdown["sad"], 1);
        assert_eq!(summary.emotion_breakdown["fear"], 1);
        // 6 intervals of 15 s = 90 s = 1.5 min.
        assert_eq!(summary.duration_minutes, 1.5);
    }

    #[test]
    fn summary_plurality_tie_goes_to_first_seen() {
        let (mut detector, clock) = detector(1, 1.0);
        let classifier = ScriptedClassifier::of_labels(&["sad", "happy", "sad", "happy"]);
        for _ in 0..4 {
            detector.detect_emotion(&frame(), &classifier);
            clock.advance(Duration::from_secs(15));
        }
        let summary = detector.session_summary().expect("populated summary");
        assert_eq!(summary.most_common_emotion, "sad");
    }

    #[test]
    fn export_matches_summary_count_and_round_trips() {
        let (mut detector, clock) = detector(1, 1.0);
        let classifier = ScriptedClassifier::of_labels(&["happy", "sad", "happy"]);
        for _ in 0..3 {
            detector.detect_emotion(&frame(), &classifier);
            clock.advance(Duration::from_secs(20));
        }

        let path = std::env::temp_dir().join(format!(
            "sentio_export_test_{}.json",
            std::process::id()
        ));
        let written = detector
            .export_emotion_log(Some(&path))
            .expect("export succeeds");
        let raw = std::fs::read_to_string(&written).expect("readable export");
        let entries: Vec<SessionLogEntry> = serde_json::from_str(&raw).expect("valid json");
        let summary = detector.session_summary().expect("populated summary");
        assert_eq!(entries.len(), summary.total_emotions_logged);
        assert_eq!(entries, detector.emotion_log());
        std::fs::remove_file(&written).ok();
    }

    #[test]
    fn export_to_unwritable_path_fails_but_log_survives() {
        let (mut detector, _clock) = detector(1, 1.0);
        let classifier = ScriptedClassifier::of_labels(&["happy"]);
        detector.detect_emotion(&frame(), &classifier);

        let bogus = Path::new("/nonexistent-sentio-dir/export.json");
        assert!(matches!(
            detector.export_emotion_log(Some(bogus)),
            Err(ExportError::Io(_))
        ));
        assert_eq!(detector.emotion_log().len(), 1);
    }
}
