//! Connect-k game logic with a sparse column-stack board representation.
//!
//! # Board Layout
//!
//! ```text
//! The board is a one-dimensional array of columns, unbounded in both
//! directions, keyed by signed column index. Each column is an independent
//! stack of marks. New marks are inserted at the BOTTOM of a column, so
//! stack position 0 is always the most recently placed mark there and the
//! marks above it shift up by one on every insertion:
//!
//!   position 2:        B          <- first mark ever played in column 0
//!   position 1:        A
//!   position 0:        A          <- newest mark (bottom of the column)
//!   column:   ... -1   0   1 ...
//!
//! Only columns holding at least one mark are present in the map; a column
//! whose stack empties is removed entirely.
//! ```
//!
//! A player wins with a contiguous line of length `k`, either vertically
//! within one column (a run from stack position 0) or horizontally across
//! adjacent columns at the same stack position. Because insertion shifts a
//! column's existing marks upward, a move can complete a horizontal line
//! for the *other* player; the session layer treats a simultaneous win for
//! both colors as a draw.
//!
//! # Move History
//!
//! `moves` records every column ever played, most recent first, mirroring
//! the union of all column stacks in play order. It identifies the last
//! move and drives [`Board::undo`], which must exactly reverse
//! [`Board::play`]: the current player flips back *before* the history and
//! column heads are popped, so replaying on the restored state reproduces
//! the color that made the undone move.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Player identifier.
///
/// Display labels ("Red"/"Blue") are a presentation concern and stay
/// outside the engine.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

/// Computer opponent difficulty tier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Hard,
}

/// Who the configured player is up against.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Opponent {
    Human,
    Computer(Difficulty),
}

// ============================================================================
// Board
// ============================================================================

/// Sparse Connect-k board: per-column stacks plus the move history.
///
/// See the module documentation for the layout and the play/undo ordering
/// contract. `game_over` and `winner` are set only by a non-forecast
/// [`Board::check_win`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    k: u32,
    columns: BTreeMap<i64, Vec<Player>>,
    moves: Vec<i64>,
    current: Player,
    game_over: bool,
    winner: Option<Player>,
}

impl Board {
    /// Create an empty board. `k` is the winning line length (>= 1,
    /// validated at the boundary); `first` moves first.
    pub fn new(k: u32, first: Player) -> Board {
        debug_assert!(k >= 1);
        Board {
            k,
            columns: BTreeMap::new(),
            moves: Vec::new(),
            current: first,
            game_over: false,
            winner: None,
        }
    }

    /// The winning line length.
    #[inline]
    pub fn k(&self) -> u32 {
        self.k
    }

    /// The player whose turn it is.
    #[inline]
    pub fn current_player(&self) -> Player {
        self.current
    }

    /// Flip the current player without moving.
    ///
    /// Used by the search to simulate the opponent's turn; a caller must
    /// always flip back after unwinding the simulation.
    #[inline]
    pub fn switch_player(&mut self) {
        self.current = self.current.opponent();
    }

    /// The stack of marks in a column, newest first.
    /// Returns None for columns holding no marks.
    #[inline]
    pub fn column(&self, column: i64) -> Option<&[Player]> {
        self.columns.get(&column).map(Vec::as_slice)
    }

    /// Every column ever played, most recent first.
    #[inline]
    pub fn moves(&self) -> &[i64] {
        &self.moves
    }

    /// The most recently played column, if any move has been made.
    #[inline]
    pub fn last_move(&self) -> Option<i64> {
        self.moves.first().copied()
    }

    /// The lowest and highest occupied column index.
    /// Returns None for an empty board.
    pub fn column_span(&self) -> Option<(i64, i64)> {
        let (&lo, _) = self.columns.first_key_value()?;
        let (&hi, _) = self.columns.last_key_value()?;
        Some((lo, hi))
    }

    /// Whether a non-forecast win check has declared the game over.
    #[inline]
    pub fn is_over(&self) -> bool {
        self.game_over
    }

    /// The winner recorded by the most recent non-forecast win check.
    #[inline]
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    // ========== Play & Undo ==========

    /// Play the current player's mark into a column.
    ///
    /// Any `i64` column index is legal; the grid is unbounded and the
    /// column is created on first use. The mark is inserted at stack
    /// position 0 (the bottom), the column is prepended to the move
    /// history, and the current player flips.
    pub fn play(&mut self, column: i64) {
        self.moves.insert(0, column);
        self.columns.entry(column).or_default().insert(0, self.current);
        self.current = self.current.opponent();
    }

    /// Undo the most recent move. No-op on an empty history.
    ///
    /// Ordering contract: the player flips back first, then the history
    /// head and the column's newest mark are removed. A column emptied by
    /// the removal is deleted from the map.
    pub fn undo(&mut self) {
        if self.moves.is_empty() {
            return;
        }
        self.current = self.current.opponent();
        let column = self.moves.remove(0);
        if let Some(stack) = self.columns.get_mut(&column) {
            stack.remove(0);
            if stack.is_empty() {
                self.columns.remove(&column);
            }
        }
    }

    // ========== Win Detection ==========

    /// Check whether `player` has a contiguous line of length `k`.
    ///
    /// Scans every occupied column in ascending index order, so any win on
    /// the board is detectable, not just one produced by the latest move.
    /// Per column, the vertical run from stack position 0 is checked
    /// first; then, for each stack position `i` holding `player`'s mark, a
    /// horizontal count seeded at 1 extends into the left and right
    /// neighbor columns at the same stack position `i`. Columns of unequal
    /// height are compared at matching stack position, not at a normalized
    /// row.
    ///
    /// Returns the winner and the winning stack position for the first win
    /// found (column order, vertical before horizontal, then increasing
    /// position), or None.
    ///
    /// A non-forecast detection records the terminal state (`is_over`,
    /// `winner`). With `forecast` set the check is read-only and is used
    /// by the search for lookahead; it never mutates terminal state.
    pub fn check_win(&mut self, player: Player, forecast: bool) -> Option<(Player, usize)> {
        let k = self.k as usize;
        let mut found = None;

        'scan: for (&column, stack) in &self.columns {
            // vertical: run of `player` marks from the newest downward
            let run = stack
                .iter()
                .take(k)
                .take_while(|&&mark| mark == player)
                .count();
            if run == k {
                found = Some(0);
                break 'scan;
            }

            // horizontal: extend left and right at each stack position
            for (i, &mark) in stack.iter().enumerate() {
                if mark != player {
                    continue;
                }
                let mut count = 1;
                let mut left = column - 1;
                while self.mark_at(left, i) == Some(player) {
                    count += 1;
                    left -= 1;
                }
                let mut right = column + 1;
                while self.mark_at(right, i) == Some(player) {
                    count += 1;
                    right += 1;
                }
                if count >= k {
                    found = Some(i);
                    break 'scan;
                }
            }
        }

        let position = found?;
        if !forecast {
            self.game_over = true;
            self.winner = Some(player);
        }
        Some((player, position))
    }

    /// The mark at a stack position of a column, if both exist.
    #[inline]
    fn mark_at(&self, column: i64, position: usize) -> Option<Player> {
        self.columns.get(&column)?.get(position).copied()
    }

    // ========== Adjacency Counting ==========

    /// Count `player`'s adjacent marks around the most recently played
    /// column. A heuristic signal for the search, not a win condition.
    ///
    /// Counts the pairwise-equal vertical run of `player` marks from stack
    /// position 0, plus one for each immediate left or right neighbor
    /// column holding `player` at the same stack position, for every
    /// position in the column that holds `player`'s mark. Pure; returns 0
    /// when no move has been played.
    pub fn count_adjacent_blocks(&self, player: Player) -> u32 {
        let Some(last) = self.last_move() else {
            return 0;
        };
        let Some(stack) = self.columns.get(&last) else {
            return 0;
        };

        let mut count = 0;

        // vertical pairs from the newest mark
        let mut i = 0;
        while i + 1 < stack.len() && stack[i] == player && stack[i] == stack[i + 1] {
            count += 1;
            i += 1;
        }

        // horizontal neighbor matches at the same stack position
        for (i, &mark) in stack.iter().enumerate() {
            if mark != player {
                continue;
            }
            for neighbor in [last - 1, last + 1] {
                if self.mark_at(neighbor, i) == Some(player) {
                    count += 1;
                }
            }
        }

        count
    }
}

// ============================================================================
// Viewport (display-only derived state)
// ============================================================================

/// Display grid dimensions. Derived presentation state only; the viewport
/// never affects win logic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Viewport {
    /// Grid rows, including the bottom label row. Grows to fit the
    /// tallest stack, never shrinks outside a reset.
    pub rows: usize,
    /// Grid columns, including the left label column.
    pub cols: usize,
}

impl Viewport {
    pub const DEFAULT_ROWS: usize = 10;
    pub const DEFAULT_COLS: usize = 17;
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            rows: Self::DEFAULT_ROWS,
            cols: Self::DEFAULT_COLS,
        }
    }
}

/// One cell of the rendered display grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ViewportCell {
    Blank,
    /// Bottom-row label: the board column this grid column shows.
    ColumnLabel(i64),
    /// Left-edge label: the stack position this grid row shows.
    HeightLabel(usize),
    Mark(Player),
}

impl Viewport {
    /// Render the `rows x cols` grid around a center column.
    ///
    /// The bottom row carries column labels, the left edge carries height
    /// labels, and the remaining cells show the marks of the columns in
    /// view (stack position 0 on the next-to-bottom row, growing upward).
    /// A pure function of the board and the center; requires `rows >= 2`.
    pub fn grid(&self, board: &Board, center: i64) -> Vec<Vec<ViewportCell>> {
        debug_assert!(self.rows >= 2);
        let (rows, cols) = (self.rows, self.cols);
        let mut grid = vec![vec![ViewportCell::Blank; cols]; rows];

        for j in 1..cols {
            let column = center - (cols / 2) as i64 + j as i64;
            grid[rows - 1][j] = ViewportCell::ColumnLabel(column);
        }
        for i in 0..=rows - 2 {
            grid[(rows - 2) - i][0] = ViewportCell::HeightLabel(i);
        }

        for j in 1..cols {
            let column = center - (cols / 2) as i64 + j as i64;
            if let Some(stack) = board.column(column) {
                for (i, &mark) in stack.iter().enumerate() {
                    if i <= rows - 2 {
                        grid[rows - 2 - i][j] = ViewportCell::Mark(mark);
                    }
                }
            }
        }

        grid
    }
}

// ============================================================================
// Game (session state)
// ============================================================================

/// One game session: the board plus the configuration the session layer
/// persists alongside it.
///
/// The session layer owns exactly one `Game` at a time and round-trips it
/// through [`SavedGame`] between requests. All state is explicit; nothing
/// in the engine reads ambient or global state.
#[derive(Clone, PartialEq, Debug)]
pub struct Game {
    board: Board,
    human: Player,
    first: Player,
    opponent: Opponent,
    thinking: bool,
    viewport: Viewport,
}

impl Game {
    /// Start a fresh game. `k >= 1` is a boundary-validated precondition.
    pub fn new(k: u32, human: Player, first: Player, opponent: Opponent) -> Game {
        Game {
            board: Board::new(k, first),
            human,
            first,
            opponent,
            thinking: false,
            viewport: Viewport::default(),
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable board access for the search crate's simulate-then-undo
    /// lookahead.
    #[inline]
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// The human player's color.
    #[inline]
    pub fn human(&self) -> Player {
        self.human
    }

    /// The computer's color, when a computer opponent is configured.
    #[inline]
    pub fn computer(&self) -> Option<Player> {
        match self.opponent {
            Opponent::Computer(_) => Some(self.human.opponent()),
            Opponent::Human => None,
        }
    }

    #[inline]
    pub fn first_player(&self) -> Player {
        self.first
    }

    #[inline]
    pub fn opponent(&self) -> Opponent {
        self.opponent
    }

    /// The "computer is thinking" interstitial flag.
    #[inline]
    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    #[inline]
    pub fn set_thinking(&mut self, thinking: bool) {
        self.thinking = thinking;
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Play a move for the current player. Rejected (returns false, no
    /// mutation) once the game is over; resuming requires [`Game::reset`].
    pub fn play(&mut self, column: i64) -> bool {
        if self.board.game_over {
            return false;
        }
        self.board.play(column);
        true
    }

    /// Non-forecast win check for one color.
    ///
    /// The session layer runs this for both colors after every move: an
    /// insertion shifts the opposing marks upward, so one move can
    /// complete a line for either side, and a simultaneous win for both
    /// is a draw.
    pub fn check_win(&mut self, player: Player) -> Option<(Player, usize)> {
        self.board.check_win(player, false)
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.board.game_over
    }

    #[inline]
    pub fn winner(&self) -> Option<Player> {
        self.board.winner
    }

    /// Clear the board and history, clear terminal state, restore the
    /// default viewport dimensions, and hand the turn back to the
    /// configured first player.
    pub fn reset(&mut self) {
        self.board.columns.clear();
        self.board.moves.clear();
        self.board.game_over = false;
        self.board.winner = None;
        self.board.current = self.first;
        self.thinking = false;
        self.viewport = Viewport::default();
    }

    /// Grow the viewport rows to fit the tallest stack plus one.
    /// No-op before the first move.
    pub fn update_viewport(&mut self) {
        let Some(tallest) = self.board.columns.values().map(Vec::len).max() else {
            return;
        };
        self.viewport.rows = self.viewport.rows.max(tallest + 1);
    }

    /// Render the display grid centered on the last move (column 0 before
    /// the first move).
    pub fn viewport_grid(&self) -> Vec<Vec<ViewportCell>> {
        let center = self.board.last_move().unwrap_or(0);
        self.viewport.grid(&self.board, center)
    }

    // ========== Serialized State ==========

    /// Project the session fields for persistence. The winner is derived
    /// state and is not persisted; the session layer re-runs the win
    /// checks after restoring.
    pub fn to_saved(&self) -> SavedGame {
        SavedGame {
            k: self.board.k,
            human: self.human,
            current: self.board.current,
            first: self.first,
            opponent: self.opponent,
            thinking: self.thinking,
            rows: self.viewport.rows,
            cols: self.viewport.cols,
            columns: self.board.columns.clone(),
            moves: self.board.moves.clone(),
            game_over: self.board.game_over,
        }
    }

    /// Rebuild a game from persisted session fields. Inverse of
    /// [`Game::to_saved`].
    ///
    /// The viewport dimensions arrive from session storage and are
    /// clamped to the smallest renderable grid (2 rows, 1 column); every
    /// other field is trusted as written by [`Game::to_saved`].
    pub fn from_saved(saved: SavedGame) -> Game {
        Game {
            board: Board {
                k: saved.k,
                columns: saved.columns,
                moves: saved.moves,
                current: saved.current,
                game_over: saved.game_over,
                winner: None,
            },
            human: saved.human,
            first: saved.first,
            opponent: saved.opponent,
            thinking: saved.thinking,
            viewport: Viewport {
                rows: saved.rows.max(2),
                cols: saved.cols.max(1),
            },
        }
    }
}

/// The exact field set the session layer persists between requests.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SavedGame {
    pub k: u32,
    pub human: Player,
    pub current: Player,
    pub first: Player,
    pub opponent: Opponent,
    pub thinking: bool,
    pub rows: usize,
    pub cols: usize,
    pub columns: BTreeMap<i64, Vec<Player>>,
    pub moves: Vec<i64>,
    pub game_over: bool,
}
