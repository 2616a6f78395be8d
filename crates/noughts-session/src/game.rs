//! Board evaluation for 3×3 tic-tac-toe.

use noughts_protocol::Mark;

/// Number of cells on the board, indexed row-major.
pub const CELLS: usize = 9;

/// A board: each cell is empty or holds a mark.
pub type Board = [Option<Mark>; CELLS];

/// The eight winning triples: rows, then columns, then diagonals.
///
/// The order matters: when several triples are complete, the first one
/// listed here is reported.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// The result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// `mark` holds all three cells of `line`.
    Win { mark: Mark, line: [usize; 3] },
    /// Every cell is taken and no line is complete.
    Draw,
    /// The game continues.
    Ongoing,
}

/// Evaluates a board against [`WINNING_LINES`].
pub fn evaluate(board: &Board) -> Evaluation {
    for line in WINNING_LINES {
        let [a, b, c] = line;
        if let Some(mark) = board[a] {
            if board[b] == Some(mark) && board[c] == Some(mark) {
                return Evaluation::Win { mark, line };
            }
        }
    }
    if board.iter().all(Option::is_some) {
        Evaluation::Draw
    } else {
        Evaluation::Ongoing
    }
}
