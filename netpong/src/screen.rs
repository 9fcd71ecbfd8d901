use std::{
    io::{stdout, Write},
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::Print,
    terminal::{self, disable_raw_mode, enable_raw_mode},
};
use shared::game_state::{
    GameState, BOARD_HEIGHT, BOARD_WIDTH, LEFT_PADDLE_X, PADDLE_HEIGHT, RIGHT_PADDLE_X,
};

const BLOCK: char = '█';

/// puts the terminal into game mode: raw input, alternate screen, no
/// cursor.
pub fn init() {
    enable_raw_mode().unwrap();
    execute!(
        stdout(),
        terminal::EnterAlternateScreen,
        Hide,
        MoveTo(0, 0)
    )
    .unwrap();
}

/// hands the terminal back to the shell.
pub fn shutdown() {
    disable_raw_mode().unwrap();
    execute!(stdout(), terminal::LeaveAlternateScreen, Show).unwrap();
}

/// draws the whole play field, centered in the terminal.
pub fn draw_board(w: &mut impl Write, state: &GameState) {
    let (origin_x, origin_y) = board_origin();
    for (y, row) in board_rows(state).into_iter().enumerate() {
        execute!(w, MoveTo(origin_x, origin_y + y as u16), Print(row)).unwrap();
    }
}

/// blocks while a bordered announcement sits over the board, counting down
/// the given number of seconds. returns early once shutdown is flagged.
/// the popup wipes its own rectangle before returning.
pub fn popup(w: &mut impl Write, lines: &[&str], seconds: u8, shutdown: &AtomicBool) {
    let width = lines.iter().map(|line| line.len()).max().unwrap_or(0) as u16 + 4;
    let height = lines.len() as u16 + 3;
    let (cols, rows) = terminal::size().unwrap();
    let left = cols.saturating_sub(width) / 2;
    let top = rows.saturating_sub(height) / 2;

    let bar = "─".repeat(width as usize - 2);
    execute!(w, MoveTo(left, top), Print(format!("┌{bar}┐"))).unwrap();
    for y in 1..height - 1 {
        let blank = " ".repeat(width as usize - 2);
        execute!(w, MoveTo(left, top + y), Print(format!("│{blank}│"))).unwrap();
    }
    execute!(w, MoveTo(left, top + height - 1), Print(format!("└{bar}┘"))).unwrap();
    for (i, line) in lines.iter().enumerate() {
        let inset = (width as usize - line.len()) / 2;
        execute!(w, MoveTo(left + inset as u16, top + 1 + i as u16), Print(line)).unwrap();
    }

    for remaining in (1..=seconds).rev() {
        execute!(w, MoveTo(left + width / 2, top + height - 2), Print(remaining)).unwrap();
        thread::sleep(Duration::from_secs(1));
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
    }

    // wipe the rectangle; the next board draw repaints whatever sat under it.
    for y in 0..height {
        let blank = " ".repeat(width as usize);
        execute!(w, MoveTo(left, top + y), Print(blank)).unwrap();
    }
}

/// top left corner that centers the board, pinned to the terminal's corner
/// when the window is smaller than the play field.
fn board_origin() -> (u16, u16) {
    let (cols, rows) = terminal::size().unwrap();
    (
        cols.saturating_sub(BOARD_WIDTH as u16) / 2,
        rows.saturating_sub(BOARD_HEIGHT as u16) / 2,
    )
}

/// renders the play field into one string per row: the frame with its
/// center line tees, both scores, the ball and the two paddles.
fn board_rows(state: &GameState) -> Vec<String> {
    let width = BOARD_WIDTH as usize;
    let center_x = (BOARD_WIDTH / 2) as usize;
    let mut rows = Vec::with_capacity(BOARD_HEIGHT as usize);
    for y in 0..BOARD_HEIGHT {
        let mut row: Vec<char> = vec![' '; width];
        if y == 0 || y == BOARD_HEIGHT - 1 {
            for cell in row.iter_mut() {
                *cell = '─';
            }
            row[0] = if y == 0 { '┌' } else { '└' };
            row[width - 1] = if y == 0 { '┐' } else { '┘' };
            row[center_x] = if y == 0 { '┬' } else { '┴' };
        } else {
            row[0] = '│';
            row[width - 1] = '│';
            row[center_x] = '│';
            if y == 1 {
                // scores sit on the top interior row either side of the
                // center line; the left one is right-aligned against it.
                for (i, digit) in format!("{:2}", state.left_score).chars().enumerate() {
                    row[center_x - 3 + i] = digit;
                }
                for (i, digit) in state.right_score.to_string().chars().enumerate() {
                    row[center_x + 2 + i] = digit;
                }
            }
            if state.ball.y == y {
                row[state.ball.x as usize] = BLOCK;
            }
            if (y - state.left_paddle).abs() <= PADDLE_HEIGHT / 2 {
                row[LEFT_PADDLE_X as usize] = BLOCK;
            }
            if (y - state.right_paddle).abs() <= PADDLE_HEIGHT / 2 {
                row[RIGHT_PADDLE_X as usize] = BLOCK;
            }
        }
        rows.push(row.into_iter().collect());
    }
    rows
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use shared::game_state::{GameState, BOARD_HEIGHT, BOARD_WIDTH, LEFT_PADDLE_X, RIGHT_PADDLE_X};

    use crate::screen::{board_rows, BLOCK};

    fn state() -> GameState {
        GameState::new(&mut StdRng::seed_from_u64(1))
    }

    #[test]
    fn rows_cover_the_whole_board() {
        let rows = board_rows(&state());
        assert_eq!(rows.len(), BOARD_HEIGHT as usize);
        for row in &rows {
            assert_eq!(row.chars().count(), BOARD_WIDTH as usize);
        }
    }

    #[test]
    fn frame_and_center_line_are_drawn() {
        let rows = board_rows(&state());
        let center = (BOARD_WIDTH / 2) as usize;
        assert!(rows[0].starts_with('┌') && rows[0].ends_with('┐'));
        let bottom = rows.last().unwrap();
        assert!(bottom.starts_with('└') && bottom.ends_with('┘'));
        assert_eq!(rows[0].chars().nth(center), Some('┬'));
        assert_eq!(bottom.chars().nth(center), Some('┴'));
        assert_eq!(rows[5].chars().nth(center), Some('│'));
    }

    #[test]
    fn ball_and_paddles_are_drawn_where_the_state_says() {
        let mut state = state();
        state.ball.x = 5;
        state.ball.y = 4;
        state.left_paddle = 10;
        state.right_paddle = 6;
        let rows = board_rows(&state);
        assert_eq!(rows[4].chars().nth(5), Some(BLOCK));
        // a paddle spans two cells either side of its center.
        for y in 8..=12 {
            assert_eq!(rows[y].chars().nth(LEFT_PADDLE_X as usize), Some(BLOCK));
        }
        assert_eq!(rows[7].chars().nth(LEFT_PADDLE_X as usize), Some(' '));
        assert_eq!(rows[13].chars().nth(LEFT_PADDLE_X as usize), Some(' '));
        for y in 4..=8 {
            assert_eq!(rows[y].chars().nth(RIGHT_PADDLE_X as usize), Some(BLOCK));
        }
    }

    #[test]
    fn scores_sit_either_side_of_the_center_line() {
        let mut state = state();
        state.left_score = 1;
        state.right_score = 0;
        let rows = board_rows(&state);
        let center = (BOARD_WIDTH / 2) as usize;
        let row: Vec<char> = rows[1].chars().collect();
        assert_eq!(row[center - 3], ' ');
        assert_eq!(row[center - 2], '1');
        assert_eq!(row[center + 2], '0');
    }
}
