use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use shared::game_state::{GameState, PointScored, Side};
use tracing::info;

use crate::screen;

/// steps the simulation at the session's tick rate until shutdown is
/// flagged, redrawing the board after every step.
pub fn run(board: Arc<Mutex<GameState>>, tick_interval: Duration, shutdown: Arc<AtomicBool>) {
    let mut rng = rand::thread_rng();
    let mut stdout = io::stdout();

    {
        let board = board.lock().unwrap();
        screen::draw_board(&mut stdout, &board);
    }
    screen::popup(&mut stdout, &["Starting Game"], 3, &shutdown);
    {
        let mut board = board.lock().unwrap();
        resume_play(&mut board, false);
        screen::draw_board(&mut stdout, &board);
    }

    while !shutdown.load(Ordering::Relaxed) {
        let tick_started = Instant::now();
        let scored = {
            let mut board = board.lock().unwrap();
            let scored = board.step(&mut rng);
            screen::draw_board(&mut stdout, &board);
            scored.map(|point| (point, board.round))
        };
        if let Some((point, round)) = scored {
            announce(&mut stdout, &board, point, round, &shutdown);
        }
        thread::sleep(tick_sleep(tick_interval, tick_started.elapsed()));
    }
}

/// announces a scored point over the board. the board lock stays released
/// while the popup blocks, so the peer's paddle reports keep landing; the
/// outcome is then applied under a fresh lock.
fn announce(
    stdout: &mut impl Write,
    board: &Mutex<GameState>,
    point: PointScored,
    round: u8,
    shutdown: &AtomicBool,
) {
    let round_line;
    let lines: Vec<&str> = if point.wins_round {
        info!(round, "round won");
        round_line = format!("Round {round}");
        let banner = match point.scorer {
            Side::Left => "<-- WIN",
            Side::Right => "WIN -->",
        };
        vec![round_line.as_str(), banner]
    } else {
        vec![match point.scorer {
            Side::Left => "<-- SCORE",
            Side::Right => "SCORE -->",
        }]
    };
    screen::popup(stdout, &lines, 3, shutdown);
    let mut board = board.lock().unwrap();
    resume_play(&mut board, point.wins_round);
    screen::draw_board(stdout, &board);
}

/// re-centers the paddles for the next rally, wiping any moves made while
/// a popup blocked. a won round also rolls its scores over.
fn resume_play(board: &mut GameState, round_won: bool) {
    if round_won {
        board.start_next_round();
    } else {
        board.recenter_paddles();
    }
}

/// sleep needed to finish out the tick after `elapsed` spent stepping. a
/// tick interrupted by an announcement runs seconds long; it gets one full
/// interval rather than an underflow.
fn tick_sleep(tick_interval: Duration, elapsed: Duration) -> Duration {
    tick_interval.checked_sub(elapsed).unwrap_or(tick_interval)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::{rngs::StdRng, SeedableRng};
    use shared::game_state::{GameState, Side, BOARD_HEIGHT};

    use crate::game_loop::{resume_play, tick_sleep};

    #[test]
    fn paddle_moves_made_under_a_popup_are_wiped_when_play_resumes() {
        let mut board = GameState::new(&mut StdRng::seed_from_u64(3));
        board.nudge_paddle(Side::Left, -2);
        board.nudge_paddle(Side::Right, 1);
        resume_play(&mut board, false);
        assert_eq!(board.left_paddle, BOARD_HEIGHT / 2);
        assert_eq!(board.right_paddle, BOARD_HEIGHT / 2);
    }

    #[test]
    fn a_won_round_rolls_over_when_play_resumes() {
        let mut board = GameState::new(&mut StdRng::seed_from_u64(3));
        board.left_score = 2;
        board.nudge_paddle(Side::Left, 2);
        resume_play(&mut board, true);
        assert_eq!((board.left_score, board.right_score), (0, 0));
        assert_eq!(board.round, 2);
        assert_eq!(board.left_paddle, BOARD_HEIGHT / 2);
    }

    #[test]
    fn tick_sleep_fills_out_the_interval() {
        let interval = Duration::from_millis(40);
        assert_eq!(
            tick_sleep(interval, Duration::from_millis(15)),
            Duration::from_millis(25)
        );
        assert_eq!(tick_sleep(interval, Duration::ZERO), interval);
        assert_eq!(tick_sleep(interval, interval), Duration::ZERO);
    }

    #[test]
    fn overlong_ticks_sleep_one_full_interval() {
        let interval = Duration::from_millis(40);
        assert_eq!(tick_sleep(interval, Duration::from_secs(3)), interval);
    }
}
