use std::{
    error::Error,
    fmt::Display,
    io::{self, BufReader, Write},
    net::{TcpListener, TcpStream},
    sync::{Arc, Mutex},
    time::Duration,
};

use shared::{
    handshake::{self, Difficulty, HandshakeError},
    peer_msg::{MessageReader, PeerMessage},
};
use tracing::{info, warn};

/// how long a read may sit idle before surfacing a timeout, so the thread
/// draining the stream can observe the shutdown flag between messages.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// an established session with the opposing player, not yet split into its
/// read and write halves.
pub struct TcpPeer {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl TcpPeer {
    fn new(stream: TcpStream) -> Result<Self, SetupError> {
        // paddle reports are tiny and latency-sensitive; never batch them.
        stream.set_nodelay(true).map_err(SetupError::Io)?;
        let reader = BufReader::new(stream.try_clone().map_err(SetupError::Io)?);
        Ok(Self {
            reader,
            writer: stream,
        })
    }

    /// splits the session into a message reader with a read timeout and a
    /// writer that can be shared across threads.
    pub fn into_split(
        self,
        poll_interval: Duration,
    ) -> io::Result<(MessageReader<BufReader<TcpStream>>, PeerWriter)> {
        self.reader
            .get_ref()
            .set_read_timeout(Some(poll_interval))?;
        Ok((
            MessageReader::new(self.reader),
            PeerWriter(Arc::new(Mutex::new(self.writer))),
        ))
    }
}

/// write half of the session. one locked write per message keeps
/// concurrent senders from interleaving lines on the wire.
#[derive(Clone)]
pub struct PeerWriter(Arc<Mutex<TcpStream>>);

impl PeerWriter {
    pub fn send(&self, message: PeerMessage) -> io::Result<()> {
        let encoded = String::from(message);
        let mut stream = self.0.lock().unwrap();
        stream.write_all(encoded.as_bytes())?;
        stream.flush()
    }
}

/// binds the given port, waits for a challenger and settles the session
/// difficulty with them.
pub fn host(port: u16, difficulty: Difficulty) -> Result<TcpPeer, SetupError> {
    let listener = TcpListener::bind(("0.0.0.0", port)).map_err(SetupError::Io)?;
    info!(port, "listening for a challenger");
    let mut peer = TcpPeer::new(accept_peer(&listener))?;
    handshake::accept_challenge(&mut peer.reader, &mut peer.writer, difficulty)
        .map_err(SetupError::Handshake)?;
    info!(%difficulty, "challenge accepted");
    Ok(peer)
}

/// connects to a waiting host and learns which difficulty they picked.
pub fn challenge(hostname: &str, port: u16) -> Result<(TcpPeer, Difficulty), SetupError> {
    let stream = TcpStream::connect((hostname, port)).map_err(SetupError::Io)?;
    let mut peer = TcpPeer::new(stream)?;
    let difficulty = handshake::extend_challenge(&mut peer.reader, &mut peer.writer)
        .map_err(SetupError::Handshake)?;
    info!(%difficulty, "challenge extended and accepted");
    Ok((peer, difficulty))
}

fn accept_peer(listener: &TcpListener) -> TcpStream {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                info!(%addr, "connection established");
                return stream;
            }
            Err(err) => warn!("failed to accept a connection: {err}"),
        }
    }
}

#[derive(Debug)]
pub enum SetupError {
    Io(io::Error),
    Handshake(HandshakeError),
}

impl Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::Io(err) => Display::fmt(err, f),
            SetupError::Handshake(err) => Display::fmt(err, f),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SetupError::Io(source) => Some(source),
            SetupError::Handshake(source) => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{net::TcpListener, thread, time::Duration};

    use shared::{
        game_state::Side,
        handshake::{self, Difficulty},
        peer_msg::PeerMessage,
    };

    use crate::tcp_peer::{accept_peer, challenge, TcpPeer};

    #[test]
    fn peers_shake_hands_and_trade_messages_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let host = thread::spawn(move || {
            let mut peer = TcpPeer::new(accept_peer(&listener)).unwrap();
            handshake::accept_challenge(&mut peer.reader, &mut peer.writer, Difficulty::Hard)
                .unwrap();
            peer
        });
        let (peer, difficulty) = challenge("127.0.0.1", port).unwrap();
        assert!(difficulty == Difficulty::Hard);
        let host_peer = host.join().unwrap();

        let (mut host_reader, host_writer) =
            host_peer.into_split(Duration::from_millis(10)).unwrap();
        let (mut reader, writer) = peer.into_split(Duration::from_millis(10)).unwrap();
        writer
            .send(PeerMessage::PaddleMoved {
                side: Side::Left,
                y: 6,
            })
            .unwrap();
        assert!(matches!(
            host_reader.read_message().unwrap(),
            PeerMessage::PaddleMoved {
                side: Side::Left,
                y: 6,
            }
        ));
        host_writer.send(PeerMessage::Exit).unwrap();
        assert!(matches!(reader.read_message().unwrap(), PeerMessage::Exit));
        // nothing left to read: the poll timeout fires.
        match reader.read_message() {
            Err(err) => assert!(err.is_timeout()),
            Ok(_) => panic!("expected the read to time out"),
        }
    }
}
