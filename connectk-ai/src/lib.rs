//! Computer-opponent move selection for Connect-k.
//!
//! Both difficulty tiers look ahead by simulating candidate moves against
//! the one mutable [`Board`] and undoing them, never by copying state.
//! Every simulated `play` is paired with an `undo` on every exit path, and
//! simulations are strictly nested, so the board handed back to the caller
//! is bit-identical to the board handed in.
//!
//! Candidates are the columns from one below the lowest occupied column to
//! one above the highest; on an empty board the sole candidate is column 0.
//!
//! The tiers share the immediate-win pass. `Hard` otherwise replays the
//! last-played column, while `Easy` adds an opponent-block pass and a
//! weighted positional heuristic (see [`Weights`]). Hard's fallback is
//! deliberately kept as-is even though it makes Hard the weaker tier in
//! quiet positions; changing it would change established game behavior.

use connectk_core::{Board, Difficulty, Game, Opponent, Player};

/// Coefficients for the easy tier's positional score.
///
/// A candidate is scored `own * own_blocks - opponent * opponent_blocks`,
/// plus `displace_bonus` when the move stacks directly onto an opponent
/// mark, where the block counts come from
/// [`Board::count_adjacent_blocks`] after the simulated move.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Weights {
    /// Reward for the computer's own adjacent blocks. Zero by default:
    /// the stock opponent plays purely defensively. Raising it is the
    /// tuning knob for a more aggressive computer.
    pub own: f64,
    /// Penalty for the human's adjacent blocks after the move.
    pub opponent: f64,
    /// Small tiebreak awarded for displacing an opponent mark upward.
    pub displace_bonus: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            own: 0.0,
            opponent: 1.0,
            displace_bonus: 1e-5,
        }
    }
}

/// Pick the next move for a configured computer opponent.
///
/// Returns None when the game is over or no computer is configured.
/// Expects to be called on the computer's turn.
pub fn next_computer_move(game: &mut Game) -> Option<i64> {
    if game.is_over() {
        return None;
    }
    let Opponent::Computer(difficulty) = game.opponent() else {
        return None;
    };
    let computer = game.human().opponent();
    let human = game.human();
    Some(compute_move(game.board_mut(), computer, human, difficulty))
}

/// Pick a column for `computer` with the stock [`Weights`].
///
/// Precondition: it is `computer`'s turn (`board.current_player()`).
/// The board is left exactly as it was handed in.
pub fn compute_move(
    board: &mut Board,
    computer: Player,
    human: Player,
    difficulty: Difficulty,
) -> i64 {
    compute_move_weighted(board, computer, human, difficulty, &Weights::default())
}

/// [`compute_move`] with caller-supplied heuristic coefficients.
pub fn compute_move_weighted(
    board: &mut Board,
    computer: Player,
    human: Player,
    difficulty: Difficulty,
    weights: &Weights,
) -> i64 {
    if board.moves().is_empty() {
        return 0;
    }
    match difficulty {
        Difficulty::Hard => hard(board, computer),
        Difficulty::Easy => easy(board, computer, human, weights),
    }
}

/// Hard tier: take an immediate win if one exists, otherwise replay the
/// most recently played column.
fn hard(board: &mut Board, computer: Player) -> i64 {
    if let Some(column) = winning_move(board, computer) {
        return column;
    }
    board.last_move().unwrap_or(0)
}

/// Easy tier: immediate win, then block, then positional heuristic.
fn easy(board: &mut Board, computer: Player, human: Player, weights: &Weights) -> i64 {
    if let Some(column) = winning_move(board, computer) {
        return column;
    }
    if let Some(column) = blocking_move(board, human) {
        return column;
    }
    best_heuristic_move(board, computer, human, weights)
}

/// Columns worth considering: one beyond the occupied footprint on each
/// side, or just column 0 on an empty board.
fn candidate_range(board: &Board) -> (i64, i64) {
    match board.column_span() {
        Some((lo, hi)) => (lo.saturating_sub(1), hi.saturating_add(1)),
        None => (0, 0),
    }
}

/// First candidate column, ascending, that wins for `color` when played by
/// the current player.
fn winning_move(board: &mut Board, color: Player) -> Option<i64> {
    let (lo, hi) = candidate_range(board);
    for column in lo..=hi {
        board.play(column);
        let win = board.check_win(color, true);
        board.undo();
        if win.is_some() {
            return Some(column);
        }
    }
    None
}

/// Find a column that blocks the human's one-move win, if any threat
/// exists.
///
/// Each candidate simulates the *human's* turn: flip, play, forecast,
/// undo, flip back. On a threat at `j`, the actual blocking column is `j`
/// itself when `j`'s top mark already belongs to the human and the winning
/// stack position was 0 (a vertical threat, or a horizontal one through
/// the newest marks); otherwise whichever side of `j` carries the human's
/// mark at the reported winning position, preferring the left.
fn blocking_move(board: &mut Board, human: Player) -> Option<i64> {
    let (lo, hi) = candidate_range(board);
    for column in lo..=hi {
        board.switch_player();
        board.play(column);
        let threat = board.check_win(human, true);
        board.undo();
        board.switch_player();

        let Some((_, position)) = threat else {
            continue;
        };
        let top_is_human = board
            .column(column)
            .is_some_and(|stack| stack.first() == Some(&human));
        let block = if top_is_human && position == 0 {
            column
        } else if marks_at(board, column - 1, position, human) {
            column - 1
        } else {
            column + 1
        };
        return Some(block);
    }
    None
}

/// Whether `player` holds the given stack position of a column.
fn marks_at(board: &Board, column: i64, position: usize, player: Player) -> bool {
    board
        .column(column)
        .is_some_and(|stack| stack.get(position) == Some(&player))
}

/// Score every candidate and keep the strictly best one that does not
/// leave the human a win on the resulting board. Defaults to column 0
/// when nothing improves on the starting score.
fn best_heuristic_move(
    board: &mut Board,
    computer: Player,
    human: Player,
    weights: &Weights,
) -> i64 {
    let (lo, hi) = candidate_range(board);
    let mut best_move = 0;
    let mut score = f64::NEG_INFINITY;

    for column in lo..=hi {
        board.play(column);
        let own_blocks = board.count_adjacent_blocks(computer) as f64;
        let opponent_blocks = board.count_adjacent_blocks(human) as f64;
        let displaced = board
            .column(column)
            .is_some_and(|stack| stack.len() >= 2 && stack[1] == human);

        let best_so_far = score;
        let bonus = if displaced { weights.displace_bonus } else { 0.0 };
        score = (weights.own * own_blocks - weights.opponent * opponent_blocks + bonus)
            .max(best_so_far);

        let human_wins = board.check_win(human, true).is_some();
        if score > best_so_far && !human_wins {
            best_move = column;
        }
        board.undo();
    }

    best_move
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Place a mark for `player` regardless of whose turn it is.
    /// Leaves `player`'s opponent to move.
    fn place(board: &mut Board, player: Player, column: i64) {
        if board.current_player() != player {
            board.switch_player();
        }
        board.play(column);
    }

    #[test]
    fn test_first_move_is_column_zero() {
        let mut board = Board::new(3, Player::One);
        assert_eq!(
            compute_move(&mut board, Player::One, Player::Two, Difficulty::Hard),
            0
        );
        assert_eq!(
            compute_move(&mut board, Player::One, Player::Two, Difficulty::Easy),
            0
        );
    }

    #[test]
    fn test_candidate_range_saturates_at_extreme_columns() {
        // widening the footprint must not step past the column index range
        let mut board = Board::new(3, Player::One);
        place(&mut board, Player::One, i64::MAX);
        assert_eq!(candidate_range(&board), (i64::MAX - 1, i64::MAX));

        let mut board = Board::new(3, Player::One);
        place(&mut board, Player::One, i64::MIN);
        assert_eq!(candidate_range(&board), (i64::MIN, i64::MIN + 1));
    }

    #[test]
    fn test_hard_takes_immediate_win() {
        let mut board = Board::new(3, Player::One);
        // computer One has two in a row at 0 and 1; 2 and -1 both complete
        place(&mut board, Player::One, 0);
        place(&mut board, Player::One, 1);
        place(&mut board, Player::Two, 6);

        let column = compute_move(&mut board, Player::One, Player::Two, Difficulty::Hard);
        // candidates ascend, so the left completion is found first
        assert_eq!(column, -1);
    }

    #[test]
    fn test_hard_fallback_replays_last_column() {
        let mut board = Board::new(4, Player::Two);
        place(&mut board, Player::One, 3);
        place(&mut board, Player::Two, 5);
        place(&mut board, Player::One, 8);

        assert_eq!(board.last_move(), Some(8));
        let column = compute_move(&mut board, Player::Two, Player::One, Difficulty::Hard);
        assert_eq!(column, 8);
    }

    #[test]
    fn test_easy_takes_immediate_win_over_block() {
        let mut board = Board::new(3, Player::Two);
        // both sides have two in a row; the win at -1 beats any block
        place(&mut board, Player::Two, 0);
        place(&mut board, Player::Two, 1);
        place(&mut board, Player::One, 5);
        place(&mut board, Player::One, 6);

        let column = compute_move(&mut board, Player::Two, Player::One, Difficulty::Easy);
        assert_eq!(column, -1);
    }

    #[test]
    fn test_easy_blocks_vertical_threat() {
        let mut board = Board::new(3, Player::Two);
        // human One is one move from a vertical win in column 3
        place(&mut board, Player::Two, 8);
        place(&mut board, Player::One, 3);
        place(&mut board, Player::One, 3);

        let column = compute_move(&mut board, Player::Two, Player::One, Difficulty::Easy);
        assert_eq!(column, 3);
    }

    #[test]
    fn test_easy_blocks_horizontal_threat() {
        let mut board = Board::new(3, Player::Two);
        // human One threatens -1,0,1 by playing -1; the computer cannot
        // occupy -1 usefully and stacks onto 0 to break the alignment
        place(&mut board, Player::Two, 5);
        place(&mut board, Player::One, 0);
        place(&mut board, Player::One, 1);

        let column = compute_move(&mut board, Player::Two, Player::One, Difficulty::Easy);
        assert_eq!(column, 0);
    }

    #[test]
    fn test_easy_heuristic_prefers_displacing() {
        let mut board = Board::new(4, Player::Two);
        // no wins or threats anywhere; stacking onto the lone human mark
        // collects the displacement bonus
        place(&mut board, Player::One, 0);

        let column = compute_move(&mut board, Player::Two, Player::One, Difficulty::Easy);
        assert_eq!(column, 0);
        assert_eq!(board.column(0), Some(&[Player::One][..]));
    }

    #[test]
    fn test_heuristic_rejects_move_that_exposes_win() {
        let mut board = Board::new(3, Player::Two);
        // human One holds position 1 of columns -1 and 1 and position 0 of
        // column 0; any insertion at column 0 lifts One's mark into a
        // horizontal line at position 1
        place(&mut board, Player::One, -1);
        place(&mut board, Player::Two, -1);
        place(&mut board, Player::One, 1);
        place(&mut board, Player::Two, 1);
        place(&mut board, Player::One, 0);

        // with only the displacement bonus active, column 0 would score
        // best; it must be rejected for exposing the win
        let weights = Weights {
            own: 0.0,
            opponent: 0.0,
            displace_bonus: 1e-5,
        };
        let column = best_heuristic_move(&mut board, Player::Two, Player::One, &weights);
        assert_ne!(column, 0);

        board.play(column);
        assert_eq!(board.check_win(Player::One, true), None);
        board.undo();
    }

    #[test]
    fn test_easy_result_never_hands_over_a_win() {
        let mut board = Board::new(3, Player::Two);
        place(&mut board, Player::Two, 4);
        place(&mut board, Player::One, 0);
        place(&mut board, Player::One, 1);

        let column = compute_move(&mut board, Player::Two, Player::One, Difficulty::Easy);
        board.play(column);
        // no human win on the board the human moves into
        assert_eq!(board.check_win(Player::One, true), None);
        // and no human one-move completion either
        assert_eq!(winning_move(&mut board, Player::One), None);
    }

    #[test]
    fn test_lookahead_leaves_board_untouched() {
        let mut rng = rand::rng();
        for difficulty in [Difficulty::Easy, Difficulty::Hard] {
            let mut board = Board::new(4, Player::One);
            for _ in 0..rng.random_range(4..=16) {
                board.play(rng.random_range(-3..=3));
            }
            let snapshot = board.clone();
            let mover = board.current_player();
            compute_move(&mut board, mover, mover.opponent(), difficulty);
            assert_eq!(board, snapshot);
        }
    }

    #[test]
    fn test_next_computer_move_game_flow() {
        let mut game = Game::new(
            3,
            Player::One,
            Player::One,
            Opponent::Computer(Difficulty::Easy),
        );
        // human opens, computer answers, board stays consistent
        assert!(game.play(0));
        let column = next_computer_move(&mut game).unwrap();
        assert!(game.play(column));
        assert_eq!(game.board().moves().len(), 2);
        assert_eq!(game.board().current_player(), Player::One);
    }

    #[test]
    fn test_next_computer_move_refuses_finished_game() {
        let mut game = Game::new(
            2,
            Player::One,
            Player::One,
            Opponent::Computer(Difficulty::Hard),
        );
        game.play(0);
        game.board_mut().switch_player();
        game.play(1);
        game.board_mut().switch_player();
        game.check_win(Player::One);
        assert_eq!(next_computer_move(&mut game), None);
    }

    #[test]
    fn test_next_computer_move_requires_computer_opponent() {
        let mut game = Game::new(3, Player::One, Player::Two, Opponent::Human);
        game.play(0);
        assert_eq!(next_computer_move(&mut game), None);
    }
}
