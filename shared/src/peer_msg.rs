use std::{
    error::Error,
    fmt::Display,
    io::{self, BufRead},
};

use crate::game_state::Side;

const PAD_LEFT: &str = "PAD_L";
const PAD_RIGHT: &str = "PAD_R";
const EXIT: &str = "EXIT";
const BALL: &str = "BALL";
const SCORE_LEFT: &str = "SCORE_L";
const SCORE_RIGHT: &str = "SCORE_R";

/// messages exchanged between peers once a game is underway.
#[cfg_attr(test, derive(Clone, Debug, PartialEq))]
pub enum PeerMessage {
    /// the sender moved its own paddle to the given row.
    PaddleMoved { side: Side, y: i16 },
    /// graceful goodbye; the session ends.
    Exit,
    /// reserved sync kinds: recognised on the wire but never acted on.
    Ball,
    ScoreLeft,
    ScoreRight,
}

impl From<PeerMessage> for String {
    fn from(value: PeerMessage) -> Self {
        match value {
            PeerMessage::PaddleMoved {
                side: Side::Left,
                y,
            } => format!("{PAD_LEFT}\n{y}\n"),
            PeerMessage::PaddleMoved {
                side: Side::Right,
                y,
            } => format!("{PAD_RIGHT}\n{y}\n"),
            PeerMessage::Exit => format!("{EXIT}\n"),
            PeerMessage::Ball => format!("{BALL}\n"),
            PeerMessage::ScoreLeft => format!("{SCORE_LEFT}\n"),
            PeerMessage::ScoreRight => format!("{SCORE_RIGHT}\n"),
        }
    }
}

#[derive(Debug)]
pub enum ReadMessageError {
    PeerClosed,
    UnrecognisedMessage(String),
    InvalidPaddlePosition(String),
    Io(io::Error),
}

impl ReadMessageError {
    /// true when the underlying stream hit its read timeout and the call
    /// should simply be retried.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ReadMessageError::Io(err)
                if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        )
    }
}

impl Display for ReadMessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadMessageError::PeerClosed => Display::fmt("the peer closed the connection", f),
            ReadMessageError::UnrecognisedMessage(kind) => {
                write!(f, "unrecognised message {kind:?}")
            }
            ReadMessageError::InvalidPaddlePosition(value) => {
                write!(f, "invalid paddle position {value:?}")
            }
            ReadMessageError::Io(err) => Display::fmt(err, f),
        }
    }
}

impl Error for ReadMessageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadMessageError::PeerClosed
            | ReadMessageError::UnrecognisedMessage(_)
            | ReadMessageError::InvalidPaddlePosition(_) => None,
            ReadMessageError::Io(source) => Some(source),
        }
    }
}

/// reads newline-delimited peer messages off the underlying stream.
///
/// a read timeout on the stream surfaces as [`ReadMessageError::Io`] with a
/// `WouldBlock` kind (`TimedOut` on some platforms); the partially read
/// line and any pending paddle report survive the error, so the next call
/// resumes exactly where reading stopped.
pub struct MessageReader<R> {
    inner: R,
    line: String,
    pending: Option<Side>,
}

impl<R: BufRead> MessageReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: String::new(),
            pending: None,
        }
    }

    /// blocks until the next full message arrives or the stream closes.
    pub fn read_message(&mut self) -> Result<PeerMessage, ReadMessageError> {
        loop {
            if self
                .inner
                .read_line(&mut self.line)
                .map_err(ReadMessageError::Io)?
                == 0
            {
                return Err(ReadMessageError::PeerClosed);
            }
            if !self.line.ends_with('\n') {
                // the stream ended mid-line; the next read reports it.
                continue;
            }
            if let Some(side) = self.pending {
                let value = self.line.trim().to_owned();
                self.line.clear();
                if value.is_empty() {
                    // a bare newline is not a position. keep waiting for
                    // the real value.
                    continue;
                }
                self.pending = None;
                return match value.parse::<i16>() {
                    Ok(y) => Ok(PeerMessage::PaddleMoved { side, y }),
                    Err(_) => Err(ReadMessageError::InvalidPaddlePosition(value)),
                };
            }
            let kind = self.line.trim_end().to_owned();
            self.line.clear();
            match kind.as_str() {
                PAD_LEFT => {
                    self.pending = Some(Side::Left);
                    continue;
                }
                PAD_RIGHT => {
                    self.pending = Some(Side::Right);
                    continue;
                }
                EXIT => return Ok(PeerMessage::Exit),
                BALL => return Ok(PeerMessage::Ball),
                SCORE_LEFT => return Ok(PeerMessage::ScoreLeft),
                SCORE_RIGHT => return Ok(PeerMessage::ScoreRight),
                _ => return Err(ReadMessageError::UnrecognisedMessage(kind)),
            }
        }
    }
}
