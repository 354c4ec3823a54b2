use crate::voice::{AudioClip, TranscribeError, Transcriber, Transcript};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

const MODEL: &str = "whisper-1";
const LANGUAGE: &str = "en";

/// Hosted speech-to-text client posting the clip to the transcriptions
/// endpoint.
#[derive(Clone)]
pub struct WhisperApiTranscriber {
    client: Client,
    api_key: String,
    base_url: String,
}

impl WhisperApiTranscriber {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl Transcriber for WhisperApiTranscriber {
    fn transcribe(&self, clip: AudioClip) -> BoxFuture<'_, Result<Transcript, TranscribeError>> {
        let this = self.clone();
        async move {
            if clip.bytes.is_empty() {
                return Err(TranscribeError::EmptyClip);
            }

            let url = format!("{}/audio/transcriptions", this.base_url);
            let form = Form::new()
                .part(
                    "file",
                    Part::stream(clip.bytes.clone()).file_name(clip.filename.clone()),
                )
                .text("model", MODEL)
                .text("language", LANGUAGE);

            let response = this
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", this.api_key))
                .multipart(form)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                return Err(TranscribeError::HttpStatus(status.as_u16(), detail));
            }

            let parsed: TranscriptionResponse = response.json().await?;
            Ok(Transcript { text: parsed.text })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn empty_clip_is_rejected_before_any_request() {
        let transcriber = WhisperApiTranscriber::new("key".to_owned());
        let clip = AudioClip {
            filename: "note.wav".to_owned(),
            bytes: Bytes::new(),
        };
        assert!(matches!(
            transcriber.transcribe(clip).await,
            Err(TranscribeError::EmptyClip)
        ));
    }
}
