use std::{
    error::Error,
    fmt::Display,
    io::{self, BufRead, Write},
    str::FromStr,
    time::Duration,
};

const CHALLENGE_EXTENDED: &str = "CHALLENGE EXTENDED";
const CHALLENGE_ACCEPTED: &str = "CHALLENGE ACCEPTED";

/// the tick rate both peers play at, picked by the host and announced to
/// the challenger during the handshake.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(Debug))]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// time between simulation ticks at this level.
    pub fn tick_interval(&self) -> Duration {
        match self {
            Difficulty::Easy => Duration::from_millis(80),
            Difficulty::Medium => Duration::from_millis(40),
            Difficulty::Hard => Duration::from_millis(20),
        }
    }
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct InvalidDifficulty(String);

impl Display for InvalidDifficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid difficulty {:?} (want easy, medium or hard)", self.0)
    }
}

impl Error for InvalidDifficulty {}

impl FromStr for Difficulty {
    type Err = InvalidDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(InvalidDifficulty(s.to_owned())),
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        Display::fmt(level, f)
    }
}

#[derive(Debug)]
pub enum HandshakeError {
    PeerClosed,
    UnexpectedMessage(String),
    InvalidDifficulty(String),
    Io(io::Error),
}

impl Display for HandshakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandshakeError::PeerClosed => {
                Display::fmt("the peer closed the connection during the handshake", f)
            }
            HandshakeError::UnexpectedMessage(message) => {
                write!(f, "unexpected handshake message {message:?}")
            }
            HandshakeError::InvalidDifficulty(level) => {
                write!(f, "invalid difficulty {level:?} (want easy, medium or hard)")
            }
            HandshakeError::Io(err) => Display::fmt(err, f),
        }
    }
}

impl Error for HandshakeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HandshakeError::PeerClosed
            | HandshakeError::UnexpectedMessage(_)
            | HandshakeError::InvalidDifficulty(_) => None,
            HandshakeError::Io(source) => Some(source),
        }
    }
}

/// host side of the session-open exchange: waits for the challenge, then
/// acknowledges it and announces the difficulty the session will run at.
pub fn accept_challenge<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    difficulty: Difficulty,
) -> Result<(), HandshakeError> {
    let request = read_handshake_line(reader)?;
    if request != CHALLENGE_EXTENDED {
        return Err(HandshakeError::UnexpectedMessage(request));
    }
    writer
        .write_all(format!("{CHALLENGE_ACCEPTED}\n{difficulty}\n").as_bytes())
        .map_err(HandshakeError::Io)?;
    writer.flush().map_err(HandshakeError::Io)?;
    Ok(())
}

/// challenger side: extends the challenge and learns which difficulty the
/// host picked.
pub fn extend_challenge<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> Result<Difficulty, HandshakeError> {
    writer
        .write_all(format!("{CHALLENGE_EXTENDED}\n").as_bytes())
        .map_err(HandshakeError::Io)?;
    writer.flush().map_err(HandshakeError::Io)?;
    let reply = read_handshake_line(reader)?;
    if reply != CHALLENGE_ACCEPTED {
        return Err(HandshakeError::UnexpectedMessage(reply));
    }
    let level = read_handshake_line(reader)?;
    level
        .parse()
        .map_err(|InvalidDifficulty(level)| HandshakeError::InvalidDifficulty(level))
}

fn read_handshake_line<R: BufRead>(reader: &mut R) -> Result<String, HandshakeError> {
    let mut line = String::new();
    if reader.read_line(&mut line).map_err(HandshakeError::Io)? == 0 {
        return Err(HandshakeError::PeerClosed);
    }
    Ok(line.trim_end().to_owned())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::handshake::{accept_challenge, extend_challenge, Difficulty, HandshakeError};

    #[test]
    fn host_accepts_a_challenge_and_announces_the_difficulty() {
        let mut input = "CHALLENGE EXTENDED\n".as_bytes();
        let mut output = Vec::new();
        accept_challenge(&mut input, &mut output, Difficulty::Medium).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "CHALLENGE ACCEPTED\nmedium\n"
        );
    }

    #[test]
    fn host_rejects_anything_but_a_challenge() {
        let mut input = "HELLO\n".as_bytes();
        let mut output = Vec::new();
        match accept_challenge(&mut input, &mut output, Difficulty::Easy) {
            Err(HandshakeError::UnexpectedMessage(message)) => {
                assert_eq!(message, "HELLO")
            }
            other => panic!("expected an unexpected message error, got {other:?}"),
        }
        assert!(output.is_empty());
    }

    #[test]
    fn challenger_learns_the_difficulty_from_the_host() {
        let mut input = "CHALLENGE ACCEPTED\nmedium\n".as_bytes();
        let mut output = Vec::new();
        let difficulty = extend_challenge(&mut input, &mut output).unwrap();
        assert_eq!(difficulty, Difficulty::Medium);
        assert_eq!(String::from_utf8(output).unwrap(), "CHALLENGE EXTENDED\n");
        // both ends of the wire agree on the tick rate.
        assert_eq!(difficulty.tick_interval(), Duration::from_millis(40));
    }

    #[test]
    fn challenger_rejects_an_unexpected_reply() {
        let mut input = "BUSY\nmedium\n".as_bytes();
        let mut output = Vec::new();
        match extend_challenge(&mut input, &mut output) {
            Err(HandshakeError::UnexpectedMessage(message)) => assert_eq!(message, "BUSY"),
            other => panic!("expected an unexpected message error, got {other:?}"),
        }
    }

    #[test]
    fn challenger_rejects_an_unknown_difficulty() {
        let mut input = "CHALLENGE ACCEPTED\nbrutal\n".as_bytes();
        let mut output = Vec::new();
        match extend_challenge(&mut input, &mut output) {
            Err(HandshakeError::InvalidDifficulty(level)) => assert_eq!(level, "brutal"),
            other => panic!("expected an invalid difficulty error, got {other:?}"),
        }
    }

    #[test]
    fn hanging_up_mid_handshake_is_fatal() {
        let mut input = "".as_bytes();
        let mut output = Vec::new();
        assert!(matches!(
            extend_challenge(&mut input, &mut output),
            Err(HandshakeError::PeerClosed)
        ));

        // the host acknowledged but never sent the difficulty.
        let mut input = "CHALLENGE ACCEPTED\n".as_bytes();
        let mut output = Vec::new();
        assert!(matches!(
            extend_challenge(&mut input, &mut output),
            Err(HandshakeError::PeerClosed)
        ));
    }

    #[test]
    fn difficulty_levels_map_to_tick_intervals() {
        assert_eq!(
            Difficulty::Easy.tick_interval(),
            Duration::from_millis(80)
        );
        assert_eq!(
            Difficulty::Medium.tick_interval(),
            Duration::from_millis(40)
        );
        assert_eq!(
            Difficulty::Hard.tick_interval(),
            Duration::from_millis(20)
        );
    }

    #[test]
    fn difficulty_parses_its_own_display() {
        for level in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(level.to_string().parse(), Ok(level));
        }
        assert!("EASY".parse::<Difficulty>().is_err());
        assert!("".parse::<Difficulty>().is_err());
    }
}
