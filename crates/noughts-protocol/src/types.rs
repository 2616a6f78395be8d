//! Core protocol types for the noughts wire format.
//!
//! Everything in this module travels on the wire: session ids in URLs and
//! HTTP bodies, the session snapshot inside `STATE_UPDATE`, and the two
//! client intents. The JSON shapes are fixed by the browser client, so the
//! serde attributes here are part of the contract.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Number of characters in a session id.
pub const SESSION_ID_LEN: usize = 5;

/// Characters a generated session id is drawn from.
pub const SESSION_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A short, human-shareable session identifier such as `"K3Q9Z"`.
///
/// Ids are case-insensitive: [`SessionId::parse`] upper-cases its input, so
/// `"k3q9z"` and `"K3Q9Z"` address the same session. The inner string is
/// always upper-case once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Parses and normalizes a session id.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidSessionId`] unless the input is
    /// exactly [`SESSION_ID_LEN`] ASCII letters or digits.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let valid = raw.len() == SESSION_ID_LEN
            && raw.bytes().all(|b| b.is_ascii_alphanumeric());
        if !valid {
            return Err(ProtocolError::InvalidSessionId(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    /// Draws a fresh id uniformly from [`SESSION_ID_ALPHABET`].
    ///
    /// 36^5 ≈ 60 million ids; collisions with live sessions are possible
    /// but rare, and the registry retries on one.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let id = (0..SESSION_ID_LEN)
            .map(|_| {
                let i = rng.random_range(0..SESSION_ID_ALPHABET.len());
                char::from(SESSION_ID_ALPHABET[i])
            })
            .collect();
        Self(id)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Marks, outcome, scores
// ---------------------------------------------------------------------------

/// One of the two role markers. `X` always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// Both marks in seating order: the first connection plays `X`.
    pub const ALL: [Mark; 2] = [Mark::X, Mark::O];

    /// Returns the opposing mark.
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::O => f.write_str("O"),
        }
    }
}

/// How a finished game ended. Serialized as `"X"`, `"O"` or `"draw"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    #[serde(rename = "X")]
    X,
    #[serde(rename = "O")]
    O,
    #[serde(rename = "draw")]
    Draw,
}

impl From<Mark> for Winner {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Self::X,
            Mark::O => Self::O,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::O => f.write_str("O"),
            Self::Draw => f.write_str("draw"),
        }
    }
}

/// Win counts per mark, serialized as `{"X": n, "O": n}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(rename = "X")]
    pub x: u32,
    #[serde(rename = "O")]
    pub o: u32,
}

impl Scores {
    /// Returns the win count for `mark`.
    pub fn get(&self, mark: Mark) -> u32 {
        match mark {
            Mark::X => self.x,
            Mark::O => self.o,
        }
    }

    /// Records one more win for `mark`.
    pub fn record_win(&mut self, mark: Mark) {
        match mark {
            Mark::X => self.x += 1,
            Mark::O => self.o += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// The full session record sent to clients.
///
/// ```json
/// {
///   "board": [null, "X", null, null, "O", null, null, null, null],
///   "currentPlayer": "X",
///   "winner": null,
///   "winningLine": null,
///   "playerJoined": true,
///   "scores": { "X": 0, "O": 0 }
/// }
/// ```
///
/// `currentPlayer` is `null` while the game is concluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub board: [Option<Mark>; 9],
    pub current_player: Option<Mark>,
    pub winner: Option<Winner>,
    pub winning_line: Option<[usize; 3]>,
    pub player_joined: bool,
    pub scores: Scores,
}

impl Default for SessionSnapshot {
    /// A fresh game: empty board, `X` to move, nobody joined yet.
    fn default() -> Self {
        Self {
            board: [None; 9],
            current_player: Some(Mark::X),
            winner: None,
            winning_line: None,
            player_joined: false,
            scores: Scores::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Realtime messages
// ---------------------------------------------------------------------------

/// Client → server intents.
///
/// Internally tagged with SCREAMING_SNAKE_CASE names:
///   `{ "type": "MAKE_MOVE", "index": 4, "player": "X" }`
///   `{ "type": "RESET_GAME" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Place the sender's mark on cell `index` (0..9, row-major).
    ///
    /// `player` is the mark the client believes it holds. The server
    /// checks it against the role bound to the connection.
    MakeMove { index: usize, player: Mark },

    /// Clear the board and give the first move back to `X`.
    ResetGame,
}

/// Server → client messages.
///
/// Adjacently tagged: `{ "type": "STATE_UPDATE", "payload": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Authoritative state after admission or after any change.
    StateUpdate(SessionSnapshot),
}

// ---------------------------------------------------------------------------
// HTTP bodies
// ---------------------------------------------------------------------------

/// Response body of `POST /create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
}

/// Structured error body, e.g. `{"error": "Game not found"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Close codes
// ---------------------------------------------------------------------------

/// Application close codes sent when the server ends a realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// Unexpected server-side failure.
    UnknownError = 4000,
    /// Both seats of the session are taken.
    SessionFull = 4001,
    /// The registry is at capacity and could not create the session.
    RegistryFull = 4002,
    /// No message arrived within the idle timeout.
    IdleTimeout = 4003,
}

impl CloseCode {
    /// Returns the raw u16 value.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns a short human-readable reason for the close frame.
    pub fn reason(self) -> &'static str {
        match self {
            Self::UnknownError => "unknown error",
            Self::SessionFull => "session full",
            Self::RegistryFull => "server full",
            Self::IdleTimeout => "idle timeout",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The browser client parses these exact JSON shapes, so most tests
    //! here assert on `serde_json::Value` rather than round-tripping.

    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_id_parse_uppercases() {
        let id = SessionId::parse("ab3de").unwrap();
        assert_eq!(id.as_str(), "AB3DE");
        assert_eq!(id, SessionId::parse("AB3DE").unwrap());
    }

    #[test]
    fn test_session_id_parse_rejects_wrong_length_and_symbols() {
        for bad in ["", "ABCD", "ABCDEF", "AB-DE", "AB DE", "ÄBCDE"] {
            assert!(
                matches!(SessionId::parse(bad), Err(ProtocolError::InvalidSessionId(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_session_id_random_uses_alphabet() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let id = SessionId::random(&mut rng);
            assert_eq!(id.as_str().len(), SESSION_ID_LEN);
            assert!(id.as_str().bytes().all(|b| SESSION_ID_ALPHABET.contains(&b)));
            // A generated id always survives its own parser unchanged.
            assert_eq!(SessionId::parse(id.as_str()).unwrap(), id);
        }
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let id = SessionId::parse("K3Q9Z").unwrap();
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("K3Q9Z"));
    }

    #[test]
    fn test_session_id_deserialize_validates() {
        let ok: SessionId = serde_json::from_value(json!("k3q9z")).unwrap();
        assert_eq!(ok.as_str(), "K3Q9Z");
        let bad: Result<SessionId, _> = serde_json::from_value(json!("nope"));
        assert!(bad.is_err());
    }

    #[test]
    fn test_mark_other_flips() {
        assert_eq!(Mark::X.other(), Mark::O);
        assert_eq!(Mark::O.other(), Mark::X);
    }

    #[test]
    fn test_winner_json_values() {
        assert_eq!(serde_json::to_value(Winner::X).unwrap(), json!("X"));
        assert_eq!(serde_json::to_value(Winner::O).unwrap(), json!("O"));
        assert_eq!(serde_json::to_value(Winner::Draw).unwrap(), json!("draw"));
    }

    #[test]
    fn test_scores_record_win() {
        let mut scores = Scores::default();
        scores.record_win(Mark::O);
        scores.record_win(Mark::O);
        assert_eq!(scores.get(Mark::X), 0);
        assert_eq!(scores.get(Mark::O), 2);
        assert_eq!(serde_json::to_value(scores).unwrap(), json!({"X": 0, "O": 2}));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut snap = SessionSnapshot::default();
        snap.board[0] = Some(Mark::X);
        snap.board[4] = Some(Mark::O);
        snap.player_joined = true;

        let value = serde_json::to_value(&snap).unwrap();

        assert_eq!(
            value,
            json!({
                "board": ["X", null, null, null, "O", null, null, null, null],
                "currentPlayer": "X",
                "winner": null,
                "winningLine": null,
                "playerJoined": true,
                "scores": {"X": 0, "O": 0}
            })
        );
    }

    #[test]
    fn test_snapshot_json_concluded_game() {
        let snap = SessionSnapshot {
            board: [Some(Mark::X); 9],
            current_player: None,
            winner: Some(Winner::X),
            winning_line: Some([0, 1, 2]),
            player_joined: true,
            scores: Scores { x: 1, o: 0 },
        };
        let value = serde_json::to_value(&snap).unwrap();
        assert!(value["currentPlayer"].is_null());
        assert_eq!(value["winner"], "X");
        assert_eq!(value["winningLine"], json!([0, 1, 2]));
    }

    #[test]
    fn test_client_message_make_move_from_json() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "MAKE_MOVE", "index": 8, "player": "O"}))
                .unwrap();
        assert_eq!(msg, ClientMessage::MakeMove { index: 8, player: Mark::O });
    }

    #[test]
    fn test_client_message_reset_from_json() {
        let msg: ClientMessage = serde_json::from_value(json!({"type": "RESET_GAME"})).unwrap();
        assert_eq!(msg, ClientMessage::ResetGame);
    }

    #[test]
    fn test_client_message_rejects_unknown_type_and_bad_fields() {
        let unknown = json!({"type": "FLY_TO_MOON"});
        assert!(serde_json::from_value::<ClientMessage>(unknown).is_err());

        let negative = json!({"type": "MAKE_MOVE", "index": -1, "player": "X"});
        assert!(serde_json::from_value::<ClientMessage>(negative).is_err());

        let bad_mark = json!({"type": "MAKE_MOVE", "index": 1, "player": "Z"});
        assert!(serde_json::from_value::<ClientMessage>(bad_mark).is_err());
    }

    #[test]
    fn test_server_message_state_update_shape() {
        let msg = ServerMessage::StateUpdate(SessionSnapshot::default());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "STATE_UPDATE");
        assert_eq!(value["payload"]["currentPlayer"], "X");
        assert_eq!(value["payload"]["board"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_create_session_response_shape() {
        let body = CreateSessionResponse {
            session_id: SessionId::parse("AAAAA").unwrap(),
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"sessionId": "AAAAA"}));
    }

    #[test]
    fn test_close_code_values() {
        assert_eq!(CloseCode::SessionFull.as_u16(), 4001);
        assert_eq!(CloseCode::IdleTimeout.as_u16(), 4003);
        assert_eq!(CloseCode::SessionFull.reason(), "session full");
    }
}
