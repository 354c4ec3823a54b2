use crate::camera::{Frame, PixelFormat};
use crate::classify::{Classification, ClassifyError, FaceClassifier};
use crate::emotion::{Emotion, ALL_EMOTIONS};
use std::collections::BTreeMap;

/// Deterministic classifier stand-in mapping frame chroma and luma statistics
/// to a score distribution. It makes no claim of recognizing anything; it
/// exists so the detection path can run end to end without a model download.
#[derive(Clone, Debug, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }
}

struct ChannelMeans {
    r: f32,
    g: f32,
    b: f32,
}

fn channel_means(frame: &Frame) -> Option<ChannelMeans> {
    let pixels = frame.pixel_count();
    if pixels == 0 {
        return None;
    }
    let mut sums = [0u64; 3];
    for px in frame.data.chunks_exact(3) {
        sums[0] += px[0] as u64;
        sums[1] += px[1] as u64;
        sums[2] += px[2] as u64;
    }
    let n = pixels as f32;
    Some(ChannelMeans {
        r: sums[0] as f32 / n,
        g: sums[1] as f32 / n,
        b: sums[2] as f32 / n,
    })
}

impl FaceClassifier for HeuristicClassifier {
    fn classify(&self, frame: &Frame) -> Result<Classification, ClassifyError> {
        if frame.format != PixelFormat::Rgb8 {
            return Err(ClassifyError::UnreadableFrame(format!(
                "expected RGB8 input, got {:?}",
                frame.format
            )));
        }
        let means = channel_means(frame)
            .ok_or_else(|| ClassifyError::UnreadableFrame("empty frame".to_owned()))?;

        let luma = 0.299 * means.r + 0.587 * means.g + 0.114 * means.b;
        let warmth = means.r - means.b;
        let chill = means.b - means.r;
        let verdancy = means.g - (means.r + means.b) / 2.0;

        // A dark frame reads as "no face"; scores are still produced so the
        // tolerant-contract path is exercised.
        let face_found = luma > 16.0;

        let mut raw: BTreeMap<Emotion, f32> = BTreeMap::new();
        raw.insert(Emotion::Happy, 4.0 + warmth.max(0.0) + luma / 8.0);
        raw.insert(Emotion::Sad, 4.0 + chill.max(0.0) / 2.0);
        raw.insert(Emotion::Angry, 2.0 + (warmth - verdancy).max(0.0) / 2.0);
        raw.insert(Emotion::Surprise, 2.0 + (luma - 160.0).max(0.0) / 4.0);
        raw.insert(Emotion::Fear, 2.0 + chill.max(0.0) / 4.0);
        raw.insert(Emotion::Disgust, 2.0 + verdancy.max(0.0) / 2.0);
        raw.insert(Emotion::Neutral, 8.0);

        let total: f32 = raw.values().sum();
        let mut emotions = BTreeMap::new();
        for emotion in ALL_EMOTIONS {
            let weight = raw.get(&emotion).copied().unwrap_or(0.0);
            emotions.insert(emotion.as_label().to_owned(), 100.0 * weight / total);
        }

        let dominant_emotion = emotions
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(label, _)| label.clone())
            .unwrap_or_else(|| Emotion::Neutral.as_label().to_owned());

        Ok(Classification {
            dominant_emotion,
            emotions,
            face_found,
        })
    }
}
