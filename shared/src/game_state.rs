use rand::Rng;

pub const BOARD_WIDTH: i16 = 43;
pub const BOARD_HEIGHT: i16 = 21;
pub const PADDLE_HEIGHT: i16 = 5;
pub const LEFT_PADDLE_X: i16 = 1;
pub const RIGHT_PADDLE_X: i16 = BOARD_WIDTH - 2;
/// the band of paddle centers that keeps a whole paddle inside the play
/// field.
pub const PADDLE_MIN_Y: i16 = 1 + PADDLE_HEIGHT / 2;
pub const PADDLE_MAX_Y: i16 = BOARD_HEIGHT - 2 - PADDLE_HEIGHT / 2;
/// points needed to take a round.
pub const WINNING_SCORE: u8 = 2;
/// scores and the round number wrap here to stay two digits wide.
const COUNTER_WRAP: u8 = 100;

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(Debug))]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct GameState {
    pub ball: Ball,
    pub velocity: Velocity,
    pub left_paddle: i16,
    pub right_paddle: i16,
    pub left_score: u8,
    pub right_score: u8,
    pub round: u8,
}

#[derive(Clone)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Ball {
    pub x: i16,
    pub y: i16,
}

#[derive(Clone)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Velocity {
    pub dx: i16,
    pub dy: i16,
}

/// reported by [`GameState::step`] when the ball left the board.
#[derive(Clone, Copy)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct PointScored {
    pub scorer: Side,
    pub wins_round: bool,
}

impl GameState {
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut state = Self {
            ball: Ball { x: 0, y: 0 },
            velocity: Velocity { dx: 1, dy: 0 },
            left_paddle: 0,
            right_paddle: 0,
            left_score: 0,
            right_score: 0,
            round: 1,
        };
        state.reset(rng);
        state
    }

    /// advances the simulation by one tick: ball movement, paddle and wall
    /// bounces, then scoring. reports the point if one was scored.
    pub fn step(&mut self, rng: &mut impl Rng) -> Option<PointScored> {
        self.ball.x += self.velocity.dx;
        self.ball.y += self.velocity.dy;
        // only the paddle on the ball's half of the board can be hit this
        // tick.
        let (paddle_y, collision_x) = if self.ball.x < BOARD_WIDTH / 2 {
            (self.left_paddle, LEFT_PADDLE_X + 1)
        } else {
            (self.right_paddle, RIGHT_PADDLE_X - 1)
        };
        if self.ball.x == collision_x && (self.ball.y - paddle_y).abs() <= PADDLE_HEIGHT / 2 {
            self.velocity.dx = -self.velocity.dx;
            // bounce angle follows where the ball struck the paddle.
            self.velocity.dy = (self.ball.y - paddle_y).signum();
        }
        if self.ball.y == 1 {
            self.velocity.dy = 1;
        } else if self.ball.y == BOARD_HEIGHT - 2 {
            self.velocity.dy = -1;
        }
        if self.ball.x == 0 {
            self.right_score = (self.right_score + 1) % COUNTER_WRAP;
            self.reset(rng);
            Some(PointScored {
                scorer: Side::Right,
                wins_round: self.right_score == WINNING_SCORE,
            })
        } else if self.ball.x == BOARD_WIDTH - 1 {
            self.left_score = (self.left_score + 1) % COUNTER_WRAP;
            self.reset(rng);
            Some(PointScored {
                scorer: Side::Left,
                wins_round: self.left_score == WINNING_SCORE,
            })
        } else {
            None
        }
    }

    /// re-centers the ball and both paddles and serves the ball in a random
    /// horizontal direction. scores and the round number are untouched.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        self.ball.x = BOARD_WIDTH / 2;
        self.ball.y = BOARD_HEIGHT / 2;
        self.velocity.dx = if rng.gen() { 1 } else { -1 };
        self.velocity.dy = 0;
        self.recenter_paddles();
    }

    /// moves a paddle by `delta`, keeping its center inside the playable
    /// band. returns the new position, or `None` if the paddle was already
    /// at the edge.
    pub fn nudge_paddle(&mut self, side: Side, delta: i16) -> Option<i16> {
        let paddle = match side {
            Side::Left => &mut self.left_paddle,
            Side::Right => &mut self.right_paddle,
        };
        let moved = (*paddle + delta).clamp(PADDLE_MIN_Y, PADDLE_MAX_Y);
        if moved == *paddle {
            return None;
        }
        *paddle = moved;
        Some(moved)
    }

    /// places a paddle where the peer reported it. the center is held to
    /// the same playable band as local moves.
    pub fn set_paddle(&mut self, side: Side, y: i16) {
        let y = y.clamp(PADDLE_MIN_Y, PADDLE_MAX_Y);
        match side {
            Side::Left => self.left_paddle = y,
            Side::Right => self.right_paddle = y,
        }
    }

    pub fn recenter_paddles(&mut self) {
        self.left_paddle = BOARD_HEIGHT / 2;
        self.right_paddle = BOARD_HEIGHT / 2;
    }

    /// closes out a won round: both scores return to zero, the round
    /// counter advances and the paddles re-center.
    pub fn start_next_round(&mut self) {
        self.left_score = 0;
        self.right_score = 0;
        self.round = (self.round + 1) % COUNTER_WRAP;
        self.recenter_paddles();
    }
}
