//! Testing utilities.
//!
//! `ScriptedNarrator` stands in for the generation service so sessions can
//! be driven deterministically without network calls.

use crate::narrator::{Narrator, NarratorError};
use crate::transcript::Transcript;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// Reply used once the script runs out.
pub const SCRIPT_EXHAUSTED: &str = "The narrator has no more scripted replies.";

#[derive(Debug)]
enum Scripted {
    Reply(String),
    Fail(String),
    /// Never answers, like a service that stopped responding.
    Hang,
}

/// A narrator that returns scripted replies in order.
///
/// Every transcript it is asked to narrate is recorded, so tests can check
/// both how many service calls a session made and what each one carried.
#[derive(Debug, Default)]
pub struct ScriptedNarrator {
    replies: Mutex<VecDeque<Scripted>>,
    seen: Mutex<Vec<Transcript>>,
    hung: Arc<Notify>,
}

impl ScriptedNarrator {
    /// Create a narrator with scripted replies.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| Scripted::Reply(r.into()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// Create a narrator whose first call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::default().then_fail(message)
    }

    /// Queue a reply after the ones already scripted.
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        lock(&self.replies).push_back(Scripted::Reply(text.into()));
        self
    }

    /// Queue a failure after the replies already scripted.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        lock(&self.replies).push_back(Scripted::Fail(message.into()));
        self
    }

    /// Queue a call that never returns.
    ///
    /// When the call starts, [`hang_signal`](Self::hang_signal) is notified.
    pub fn then_hang(self) -> Self {
        lock(&self.replies).push_back(Scripted::Hang);
        self
    }

    /// Notified once a hanging call has started.
    pub fn hang_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.hung)
    }

    /// Number of narrate calls made so far.
    pub fn call_count(&self) -> usize {
        lock(&self.seen).len()
    }

    /// Every transcript passed to `narrate`, in call order.
    pub fn transcripts(&self) -> Vec<Transcript> {
        lock(&self.seen).clone()
    }

    /// Length of each transcript passed to `narrate`, in call order.
    pub fn request_lengths(&self) -> Vec<usize> {
        lock(&self.seen).iter().map(Transcript::len).collect()
    }
}

#[async_trait]
impl Narrator for ScriptedNarrator {
    async fn narrate(&self, transcript: &Transcript) -> Result<String, NarratorError> {
        lock(&self.seen).push(transcript.clone());

        let next = lock(&self.replies).pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(message)) => Err(NarratorError::Api(gemini::Error::Api {
                status: 500,
                message,
            })),
            Some(Scripted::Hang) => {
                self.hung.notify_one();
                std::future::pending().await
            }
            None => Ok(SCRIPT_EXHAUSTED.to_string()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Turn;

    #[tokio::test]
    async fn test_replies_in_order_then_exhausted() {
        let narrator = ScriptedNarrator::new(["one"]).then_reply("two");
        let transcript = Transcript::new().append(Turn::player("go"));

        assert_eq!(narrator.narrate(&transcript).await.unwrap(), "one");
        assert_eq!(narrator.narrate(&transcript).await.unwrap(), "two");
        assert_eq!(
            narrator.narrate(&transcript).await.unwrap(),
            SCRIPT_EXHAUSTED
        );
        assert_eq!(narrator.request_lengths(), vec![1, 1, 1]);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let narrator = ScriptedNarrator::new(["ok"]).then_fail("network down");
        let transcript = Transcript::new().append(Turn::player("go"));

        assert!(narrator.narrate(&transcript).await.is_ok());
        let err = narrator.narrate(&transcript).await.unwrap_err();
        assert!(err.to_string().contains("network down"));
        assert_eq!(narrator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_hang_signals_and_never_returns() {
        let narrator = ScriptedNarrator::default().then_hang();
        let hung = narrator.hang_signal();
        let transcript = Transcript::new().append(Turn::player("go"));

        tokio::select! {
            _ = narrator.narrate(&transcript) => panic!("hanging call returned"),
            _ = hung.notified() => {}
        }
        assert_eq!(narrator.call_count(), 1);
    }
}
