//! GameSession - the console loop around the turn driver.
//!
//! A session is either playing or terminated. It seeds the first loop with
//! the intro prompt, then reads one line at a time: commands are handled
//! locally, anything else is sent to the narrator.

use crate::narrator::{take_turn, Narrator, NarratorError};
use crate::prompts::{
    divider, BANNER, EMPTY_INPUT_HINT, HANGUP_FAREWELL, INPUT_PROMPT, INTRO_PROMPT,
    NEW_LOOP_PROMPT, QUIT_FAREWELL, RESTART_NOTICE,
};
use crate::transcript::Transcript;
use std::future::Future;
use std::io::Write;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Narrator error: {0}")]
    Narrator(#[from] NarratorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The player interrupted while the narrator was generating.
    #[error("Interrupted")]
    Interrupted,
}

/// Input words that end the session.
pub const QUIT_COMMANDS: [&str; 3] = ["/quit", "quit", "exit"];

/// Input words that start a new loop.
pub const RESTART_COMMANDS: [&str; 4] = ["/restart", "new loop", "new run", "new game"];

/// A parsed line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Restart,
    Empty,
    /// Gameplay input, forwarded to the narrator.
    Action(String),
}

impl Command {
    /// Classify one line. Matching is case-insensitive on the trimmed line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let lower = line.to_lowercase();

        if QUIT_COMMANDS.contains(&lower.as_str()) {
            Command::Quit
        } else if RESTART_COMMANDS.contains(&lower.as_str()) {
            Command::Restart
        } else if line.is_empty() {
            Command::Empty
        } else {
            Command::Action(line.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Playing,
    Terminated,
}

/// What handling one command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The narrator continued the current loop.
    Narration(String),
    /// A new loop began with this narration.
    Restarted(String),
    /// Nothing was sent; the player should be nudged.
    Hint,
    /// The player quit.
    Quit,
}

/// A Tides of Remembrance session.
pub struct GameSession<N> {
    narrator: N,
    transcript: Transcript,
    state: SessionState,
}

impl<N: Narrator> GameSession<N> {
    pub fn new(narrator: N) -> Self {
        Self {
            narrator,
            transcript: Transcript::new(),
            state: SessionState::Playing,
        }
    }

    /// Seed the first loop with the intro prompt and return its narration.
    pub async fn start(&mut self) -> Result<String, SessionError> {
        self.narrate(INTRO_PROMPT).await
    }

    /// Parse and handle one line of input.
    pub async fn handle(&mut self, line: &str) -> Result<Step, SessionError> {
        self.apply(Command::parse(line)).await
    }

    /// Handle one command.
    pub async fn apply(&mut self, command: Command) -> Result<Step, SessionError> {
        match command {
            Command::Quit => {
                self.state = SessionState::Terminated;
                Ok(Step::Quit)
            }
            Command::Restart => {
                tracing::info!(previous_turns = self.transcript.len(), "starting a new loop");
                self.transcript = std::mem::take(&mut self.transcript).reset();
                let reply = self.narrate(NEW_LOOP_PROMPT).await?;
                Ok(Step::Restarted(reply))
            }
            Command::Empty => Ok(Step::Hint),
            Command::Action(input) => {
                let reply = self.narrate(&input).await?;
                Ok(Step::Narration(reply))
            }
        }
    }

    /// End the session because input ran out or the player interrupted.
    pub fn hang_up(&mut self) {
        self.state = SessionState::Terminated;
    }

    /// Run the console loop until the player quits or input ends.
    ///
    /// `interrupt` resolving while waiting for input ends the session like
    /// end of input does. Resolving during a narrator call abandons the call
    /// and returns [`SessionError::Interrupted`] without reading more input.
    pub async fn run<R, W, F>(
        &mut self,
        input: R,
        out: &mut W,
        interrupt: F,
    ) -> Result<(), SessionError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        F: Future<Output = ()>,
    {
        writeln!(out, "\n{}\n", divider())?;
        for line in BANNER {
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;

        tokio::pin!(interrupt);

        let intro = tokio::select! {
            biased;
            intro = self.start() => intro?,
            _ = &mut interrupt => return Err(SessionError::Interrupted),
        };
        writeln!(out, "{intro}")?;

        let mut lines = input.lines();

        while self.state == SessionState::Playing {
            writeln!(out, "\n{}\n", divider())?;
            write!(out, "{INPUT_PROMPT}")?;
            out.flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = &mut interrupt => None,
            };

            let Some(line) = line else {
                self.hang_up();
                writeln!(out, "\n{HANGUP_FAREWELL}\n")?;
                break;
            };

            let command = Command::parse(&line);
            if command == Command::Restart {
                writeln!(out, "\n{RESTART_NOTICE}\n")?;
            }

            let step = tokio::select! {
                biased;
                step = self.apply(command) => step?,
                _ = &mut interrupt => return Err(SessionError::Interrupted),
            };

            match step {
                Step::Narration(reply) | Step::Restarted(reply) => writeln!(out, "{reply}")?,
                Step::Hint => writeln!(out, "{EMPTY_INPUT_HINT}")?,
                Step::Quit => writeln!(out, "\n{QUIT_FAREWELL}\n")?,
            }
            out.flush()?;
        }

        Ok(())
    }

    async fn narrate(&mut self, input: &str) -> Result<String, SessionError> {
        let outcome = take_turn(&self.narrator, &self.transcript, input).await?;
        self.transcript = outcome.transcript;
        Ok(outcome.reply)
    }

    /// The transcript of the current loop.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedNarrator;

    #[test]
    fn test_quit_synonyms_case_insensitive() {
        for line in ["/quit", "QUIT", "Exit", "  exit  ", "/QuIt"] {
            assert_eq!(Command::parse(line), Command::Quit, "{line:?}");
        }
    }

    #[test]
    fn test_restart_synonyms_case_insensitive() {
        for line in ["/restart", "New Loop", "new run", "NEW GAME"] {
            assert_eq!(Command::parse(line), Command::Restart, "{line:?}");
        }
    }

    #[test]
    fn test_empty_and_action() {
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("   \t"), Command::Empty);
        assert_eq!(
            Command::parse("  open the Vial "),
            Command::Action("open the Vial".to_string())
        );
        // Only exact synonyms are commands.
        assert_eq!(
            Command::parse("quit the lighthouse"),
            Command::Action("quit the lighthouse".to_string())
        );
    }

    #[tokio::test]
    async fn test_start_seeds_with_intro_prompt() {
        let mut session = GameSession::new(ScriptedNarrator::new(["intro narration"]));
        let reply = session.start().await.unwrap();

        assert_eq!(reply, "intro narration");
        let seen = session.narrator().transcripts();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[0].turns()[0].text(), INTRO_PROMPT);
    }

    #[tokio::test]
    async fn test_empty_input_never_calls_narrator() {
        let mut session = GameSession::new(ScriptedNarrator::new(["intro"]));
        session.start().await.unwrap();
        let before = session.transcript().len();

        assert_eq!(session.handle("   ").await.unwrap(), Step::Hint);
        assert_eq!(session.transcript().len(), before);
        assert_eq!(session.narrator().call_count(), 1);
    }

    #[tokio::test]
    async fn test_restart_resets_to_priming_prompt() {
        let narrator = ScriptedNarrator::new(["intro", "a", "b", "new loop"]);
        let mut session = GameSession::new(narrator);
        session.start().await.unwrap();
        session.handle("look around").await.unwrap();
        session.handle("dive").await.unwrap();

        let step = session.handle("/restart").await.unwrap();

        assert_eq!(step, Step::Restarted("new loop".to_string()));
        let seen = session.narrator().transcripts();
        let priming = seen.last().unwrap();
        assert_eq!(priming.len(), 1);
        assert_eq!(priming.turns()[0].text(), NEW_LOOP_PROMPT);
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[tokio::test]
    async fn test_quit_terminates() {
        let mut session = GameSession::new(ScriptedNarrator::new(["intro"]));
        session.start().await.unwrap();

        assert_eq!(session.handle("Quit").await.unwrap(), Step::Quit);
        assert!(session.is_terminated());
        assert_eq!(session.narrator().call_count(), 1);
    }

    #[tokio::test]
    async fn test_narrator_failure_propagates() {
        let narrator = ScriptedNarrator::new(["intro"]).then_fail("403 forbidden");
        let mut session = GameSession::new(narrator);
        session.start().await.unwrap();

        let err = session.handle("look").await.unwrap_err();
        assert!(matches!(err, SessionError::Narrator(_)));
        assert_eq!(session.transcript().len(), 2);
    }
}
