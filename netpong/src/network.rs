use std::{
    io::BufReader,
    net::TcpStream,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc, Mutex,
    },
};

use shared::{
    game_state::GameState,
    peer_msg::{MessageReader, PeerMessage, ReadMessageError},
};
use tracing::{debug, warn};

use crate::Quit;

/// applies the peer's messages to the board until they leave, the
/// connection drops or shutdown is flagged.
pub fn listen(
    mut reader: MessageReader<BufReader<TcpStream>>,
    board: Arc<Mutex<GameState>>,
    shutdown: Arc<AtomicBool>,
    quit_tx: Sender<Quit>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        match reader.read_message() {
            Ok(PeerMessage::PaddleMoved { side, y }) => {
                board.lock().unwrap().set_paddle(side, y);
            }
            Ok(PeerMessage::Exit) => {
                debug!("peer announced their exit");
                let _ = quit_tx.send(Quit::PeerExit);
                return;
            }
            Ok(PeerMessage::Ball | PeerMessage::ScoreLeft | PeerMessage::ScoreRight) => {
                // both sides simulate every tick themselves, so the sync
                // messages older builds sent carry nothing we need.
                debug!("ignoring a state sync message");
            }
            Err(err) if err.is_timeout() => {}
            Err(
                err @ (ReadMessageError::UnrecognisedMessage(_)
                | ReadMessageError::InvalidPaddlePosition(_)),
            ) => {
                warn!("discarding a message from the peer: {err}");
            }
            Err(err) => {
                debug!("the peer's stream is gone: {err}");
                let _ = quit_tx.send(Quit::ConnectionLost);
                return;
            }
        }
    }
}
