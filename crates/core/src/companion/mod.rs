mod hosted;
mod scripted;

use crate::emotion::Emotion;
use crate::voice::VoiceTone;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use hosted::HostedCompanion;
pub use scripted::ScriptedCompanion;

/// One journal entry awaiting an empathetic reply. `emotion` is the raw
/// detected label; styling degrades it to neutral when unrecognized.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompanionRequest {
    pub entry_text: String,
    pub emotion: String,
    pub confidence: f32,
    pub voice_tone: Option<VoiceTone>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanionReply {
    pub text: String,
}

#[derive(thiserror::Error, Debug)]
pub enum CompanionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("companion service returned status {0}: {1}")]
    HttpStatus(u16, String),

    #[error("companion response carried no content")]
    EmptyResponse,
}

/// Empathetic-reply collaborator. Implementations are stateless per call.
pub trait Companion: Send + Sync {
    fn respond(
        &self,
        request: CompanionRequest,
    ) -> BoxFuture<'_, Result<CompanionReply, CompanionError>>;
}

/// How the companion should speak for a given detected emotion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseStyle {
    pub tone: &'static str,
    pub approach: &'static str,
    pub avoid: &'static str,
}

impl ResponseStyle {
    pub fn for_emotion(emotion: Emotion) -> Self {
        match emotion {
            Emotion::Happy => Self {
                tone: "celebratory and encouraging",
                approach: "amplify the positive emotions and help the user savor the moment",
                avoid: "being dismissive or bringing up potential problems",
            },
            Emotion::Sad => Self {
                tone: "gentle, compassionate, and validating",
                approach: "acknowledge the pain, offer comfort, and gently explore the feelings",
                avoid: "trying to fix or minimize the sadness",
            },
            Emotion::Angry => Self {
                tone: "calm, understanding, and non-judgmental",
                approach: "validate the anger, help process the trigger, suggest healthy expression",
                avoid: "escalating the anger or being dismissive",
            },
            Emotion::Surprise => Self {
                tone: "curious and engaged",
                approach: "explore the unexpected event and help process the new information",
                avoid: "being overwhelming or dismissive of the surprise",
            },
            Emotion::Fear => Self {
                tone: "reassuring and grounding",
                approach: "acknowledge the fear, provide comfort, help ground in reality",
                avoid: "minimizing the fear or being overly optimistic",
            },
            Emotion::Disgust => Self {
                tone: "understanding and supportive",
                approach: "validate the strong reaction and help explore what values were violated",
                avoid: "judging the reaction or the source of disgust",
            },
            Emotion::Neutral => Self {
                tone: "warm and gently curious",
                approach: "invite deeper reflection and help uncover underlying feelings",
                avoid: "being too probing or assuming something is wrong",
            },
        }
    }
}

/// System message for the reply generator, styled to the detected emotion.
pub fn system_prompt(emotion_label: &str, confidence: f32) -> String {
    let style = ResponseStyle::for_emotion(Emotion::from_label_lossy(emotion_label));
    format!(
        "You are Sentio, an empathetic emotional wellness companion. A user has just written \
a journal entry while experiencing the emotion: {emotion_label} (detected with {confidence:.0}% confidence).

Your role is to:
- Be a wise, compassionate friend who truly listens
- Respond with a {tone} tone
- {approach}
- Avoid {avoid}

Guidelines:
- Keep responses to 2-4 sentences (50-100 words)
- Be warm but not overly familiar
- Ask ONE thoughtful follow-up question if appropriate
- Use \"I notice...\" or \"It sounds like...\" rather than \"You should...\"
- Focus on emotional validation before offering any perspective
- Never give medical or therapeutic advice
- Be authentic and avoid cliches

Remember: your goal is to help the user feel heard, understood, and gently supported.",
        tone = style.tone,
        approach = style.approach,
        avoid = style.avoid,
    )
}

/// User message carrying the entry text plus voice characteristics when a
/// recording accompanied it.
pub fn user_message(request: &CompanionRequest) -> String {
    let mut message = format!("Journal entry: '{}'", request.entry_text);
    if let Some(tone) = &request.voice_tone {
        message.push_str(&format!(
            "\n\nVoice characteristics: tone={}, pace={}, intensity={}",
            tone.tone, tone.pace, tone.intensity
        ));
    }
    message
}
