//! Session types: one game instance and the registry's configuration.
//!
//! A [`Session`] is the server's authoritative record of a game. It tracks:
//! - the board and whose turn it is
//! - how the current round ended (if it has)
//! - whether a second player has ever joined
//! - the running score, which survives resets

use std::time::Duration;

use noughts_protocol::{Mark, Scores, SessionSnapshot, Winner};

use crate::game::{self, Board, CELLS, Evaluation};
use crate::Rejection;

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Configuration for the session registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a session may sit without activity and without any
    /// connected player before the reaper evicts it.
    ///
    /// Default: 30 minutes.
    pub session_ttl: Duration,

    /// Upper bound on live sessions. Creation fails beyond it.
    ///
    /// Default: 10 000.
    pub max_sessions: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(30 * 60),
            max_sessions: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single game instance.
///
/// The round moves through two states:
///
/// ```text
///   InProgress(X) ──move──→ InProgress(O) ──move──→ … ──winning/filling move──→ Concluded
///        ↑                                                                         │
///        └──────────────────────────────── reset ─────────────────────────────────┘
/// ```
///
/// `current_turn` is `Some` exactly while the round is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    board: Board,
    current_turn: Option<Mark>,
    outcome: Option<Winner>,
    winning_line: Option<[usize; 3]>,
    joined: bool,
    scores: Scores,
}

impl Session {
    /// Creates a fresh session: empty board, `X` to move, no scores.
    pub fn new() -> Self {
        Self {
            board: [None; CELLS],
            current_turn: Some(Mark::X),
            outcome: None,
            winning_line: None,
            joined: false,
            scores: Scores::default(),
        }
    }

    /// Places `mark` on `cell` and advances the round.
    ///
    /// # Errors
    /// Returns a [`Rejection`] and leaves the session untouched if the
    /// round is over, `mark` is not due to move, or `cell` is out of
    /// bounds or occupied.
    pub fn apply_move(&mut self, cell: usize, mark: Mark) -> Result<(), Rejection> {
        let expected = self.current_turn.ok_or(Rejection::GameOver)?;
        if mark != expected {
            return Err(Rejection::NotYourTurn {
                expected,
                got: mark,
            });
        }
        let slot = self.board.get_mut(cell).ok_or(Rejection::OutOfBounds(cell))?;
        if slot.is_some() {
            return Err(Rejection::Occupied(cell));
        }
        *slot = Some(mark);

        match game::evaluate(&self.board) {
            Evaluation::Win { mark, line } => {
                self.outcome = Some(Winner::from(mark));
                self.winning_line = Some(line);
                self.current_turn = None;
                self.scores.record_win(mark);
            }
            Evaluation::Draw => {
                self.outcome = Some(Winner::Draw);
                self.current_turn = None;
            }
            Evaluation::Ongoing => {
                self.current_turn = Some(mark.other());
            }
        }
        Ok(())
    }

    /// Starts a new round. Keeps `joined` and `scores`.
    pub fn reset(&mut self) {
        self.board = [None; CELLS];
        self.current_turn = Some(Mark::X);
        self.outcome = None;
        self.winning_line = None;
    }

    /// Records that a second player has joined. Idempotent.
    pub fn mark_joined(&mut self) {
        self.joined = true;
    }

    /// Builds the wire representation sent in `STATE_UPDATE`.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board,
            current_player: self.current_turn,
            winner: self.outcome,
            winning_line: self.winning_line,
            player_joined: self.joined,
            scores: self.scores,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_turn(&self) -> Option<Mark> {
        self.current_turn
    }

    pub fn outcome(&self) -> Option<Winner> {
        self.outcome
    }

    pub fn winning_line(&self) -> Option<[usize; 3]> {
        self.winning_line
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
