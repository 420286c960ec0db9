//! The transcript of one loop.
//!
//! A transcript is the only conversational memory the narrator has: the
//! generation service is stateless, so the whole sequence is re-sent on
//! every request. Turns alternate player/narrator and the first turn is
//! always a player turn (the intro or new-loop priming prompt).

use gemini::Content;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Player,
    Narrator,
}

/// One role-tagged message of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    /// A turn typed by the player (or a scripted prompt sent on their behalf).
    pub fn player(text: impl Into<String>) -> Self {
        Self {
            role: Role::Player,
            text: text.into(),
        }
    }

    /// A turn narrated by the model.
    pub fn narrator(text: impl Into<String>) -> Self {
        Self {
            role: Role::Narrator,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl From<&Turn> for Content {
    fn from(turn: &Turn) -> Self {
        match turn.role {
            Role::Player => Content::user(turn.text.clone()),
            Role::Narrator => Content::model(turn.text.clone()),
        }
    }
}

/// Ordered turn history of the current loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// An empty transcript, as at program start or after a restart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the transcript with `turn` added at the end.
    pub fn append(mut self, turn: Turn) -> Self {
        debug_assert_eq!(
            turn.role,
            self.next_role(),
            "turns must alternate player/narrator"
        );
        self.turns.push(turn);
        self
    }

    /// Drop every turn and start a fresh loop.
    pub fn reset(self) -> Self {
        Self::new()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The role the next appended turn must have.
    pub fn next_role(&self) -> Role {
        match self.turns.last().map(Turn::role) {
            None | Some(Role::Narrator) => Role::Player,
            Some(Role::Player) => Role::Narrator,
        }
    }

    /// Whether turns strictly alternate, starting with the player.
    pub fn is_alternating(&self) -> bool {
        self.turns.iter().enumerate().all(|(i, turn)| {
            let expected = if i % 2 == 0 {
                Role::Player
            } else {
                Role::Narrator
            };
            turn.role == expected
        })
    }

    /// The transcript in the generation service's wire form.
    pub fn to_messages(&self) -> Vec<Content> {
        self.turns.iter().map(Content::from).collect()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
