use crate::companion::{Companion, CompanionError, CompanionReply, CompanionRequest};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Mutex;

/// Offline stand-in that replays a fixed reply and records what it was asked.
pub struct ScriptedCompanion {
    reply: String,
    seen: Mutex<Vec<CompanionRequest>>,
}

impl ScriptedCompanion {
    pub fn with_reply<S: Into<String>>(reply: S) -> Self {
        Self {
            reply: reply.into(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompanionRequest> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

impl Companion for ScriptedCompanion {
    fn respond(
        &self,
        request: CompanionRequest,
    ) -> BoxFuture<'_, Result<CompanionReply, CompanionError>> {
        async move {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request);
            }
            Ok(CompanionReply {
                text: self.reply.clone(),
            })
        }
        .boxed()
    }
}
