//! Tides of Remembrance story engine.
//!
//! This crate provides:
//! - The transcript of the current loop (ordered player/narrator turns)
//! - A turn driver that sends the transcript to Gemini and records the reply
//! - The console session: commands, restarts, and the input loop
//!
//! # Quick Start
//!
//! ```ignore
//! use tides_core::{GameSession, GeminiNarrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = GameSession::new(GeminiNarrator::from_env());
//!
//!     println!("{}", session.start().await?);
//!     let step = session.handle("I follow the gulls to the ruined pier").await?;
//!     println!("{step:?}");
//!     Ok(())
//! }
//! ```

pub mod narrator;
pub mod prompts;
pub mod session;
pub mod testing;
pub mod transcript;

// Primary public API
pub use narrator::{take_turn, GeminiNarrator, Narrator, NarratorConfig, NarratorError, TurnOutcome};
pub use session::{Command, GameSession, SessionError, SessionState, Step};
pub use testing::ScriptedNarrator;
pub use transcript::{Role, Transcript, Turn};
