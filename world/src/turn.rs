//! Two-state turn machine gating which agent may act.

use grid_duel_core::{Side, Turn};

use crate::MoveProgress;

/// Owns the active [`Turn`] for a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnController {
    turn: Turn,
    completed_turns: u64,
}

impl TurnController {
    /// Creates a controller that starts on the human's turn.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn currently in effect.
    #[must_use]
    pub const fn current(&self) -> Turn {
        self.turn
    }

    /// Number of times control changed hands.
    #[must_use]
    pub const fn completed_turns(&self) -> u64 {
        self.completed_turns
    }

    /// Reports whether `side` may act.
    #[must_use]
    pub fn permits(&self, side: Side) -> bool {
        self.turn.permits(side)
    }

    /// Hands control to the other side and returns the new turn.
    pub fn toggle(&mut self) -> Turn {
        self.turn = self.turn.next();
        self.completed_turns = self.completed_turns.saturating_add(1);
        log::debug!("turn changed to {:?}", self.turn);
        self.turn
    }

    /// Feeds one movement outcome of the active agent. Only
    /// [`MoveProgress::Completed`] toggles the turn.
    pub fn observe(&mut self, progress: MoveProgress) -> Option<Turn> {
        match progress {
            MoveProgress::Completed => Some(self.toggle()),
            MoveProgress::Idle | MoveProgress::Moving => None,
        }
    }
}
