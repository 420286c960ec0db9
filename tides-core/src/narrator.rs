//! The turn driver.
//!
//! A [`Narrator`] turns a transcript ending in a player turn into the next
//! piece of narration. [`take_turn`] wraps one call with the bookkeeping:
//! append the player turn, ask the narrator, append the reply.

use crate::prompts::SYSTEM_PROMPT;
use crate::transcript::{Transcript, Turn};
use async_trait::async_trait;
use gemini::{Gemini, Request};
use thiserror::Error;

/// Errors from the narrator.
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("Gemini API error: {0}")]
    Api(#[from] gemini::Error),
}

/// Generation parameters sent with every request.
#[derive(Debug, Clone)]
pub struct NarratorConfig {
    /// The model to use (defaults to gemini-2.0-flash).
    pub model: Option<String>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Nucleus sampling threshold.
    pub top_p: f32,

    /// Maximum tokens per reply.
    pub max_output_tokens: u32,

    /// Lore and response format.
    pub system_instruction: String,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.9,
            top_p: 0.95,
            max_output_tokens: 512,
            system_instruction: SYSTEM_PROMPT.to_string(),
        }
    }
}

impl NarratorConfig {
    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build the request for one call over `transcript`.
    pub fn request(&self, transcript: &Transcript) -> Request {
        let mut request = Request::new(transcript.to_messages())
            .with_system(&self.system_instruction)
            .with_temperature(self.temperature)
            .with_top_p(self.top_p)
            .with_max_output_tokens(self.max_output_tokens);

        if let Some(ref model) = self.model {
            request = request.with_model(model);
        }

        request
    }
}

/// Something that continues the story.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Narrate the reply to the last (player) turn of `transcript`.
    async fn narrate(&self, transcript: &Transcript) -> Result<String, NarratorError>;
}

/// Narrator backed by the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiNarrator {
    client: Gemini,
    config: NarratorConfig,
}

impl GeminiNarrator {
    pub fn new(client: Gemini) -> Self {
        Self {
            client,
            config: NarratorConfig::default(),
        }
    }

    /// Create a narrator from `GEMINI_API_KEY` (and optional `GEMINI_API_BASE`).
    pub fn from_env() -> Self {
        Self::new(Gemini::from_env())
    }

    /// Configure the narrator.
    pub fn with_config(mut self, config: NarratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &NarratorConfig {
        &self.config
    }
}

#[async_trait]
impl Narrator for GeminiNarrator {
    async fn narrate(&self, transcript: &Transcript) -> Result<String, NarratorError> {
        let response = self.client.complete(self.config.request(transcript)).await?;
        Ok(response.text())
    }
}

/// Result of one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The narrator's reply, verbatim.
    pub reply: String,

    /// The transcript with the player turn and the reply appended.
    pub transcript: Transcript,
}

/// Play one turn: send `transcript` plus `input` and record the reply.
///
/// Makes exactly one narrator call. On error `transcript` is untouched and
/// the error is returned as is.
pub async fn take_turn<N>(
    narrator: &N,
    transcript: &Transcript,
    input: &str,
) -> Result<TurnOutcome, NarratorError>
where
    N: Narrator + ?Sized,
{
    let pending = transcript.clone().append(Turn::player(input));

    tracing::debug!(turns = pending.len(), "requesting narration");
    let reply = narrator.narrate(&pending).await?;

    tracing::debug!(chars = reply.len(), "narration received");

    let transcript = pending.append(Turn::narrator(reply.clone()));
    Ok(TurnOutcome { reply, transcript })
}
