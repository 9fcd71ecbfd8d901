use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
    Arc, Mutex,
};

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use shared::{
    game_state::{GameState, Side},
    peer_msg::PeerMessage,
};
use tracing::debug;

use crate::{
    tcp_peer::{PeerWriter, POLL_INTERVAL},
    Quit,
};

/// turns keystrokes into paddle movement until shutdown is flagged. the
/// arrow keys drive the right paddle and 'w'/'s' the left one, but only
/// the locally owned paddle responds.
pub fn listen(
    local_side: Side,
    board: Arc<Mutex<GameState>>,
    writer: PeerWriter,
    shutdown: Arc<AtomicBool>,
    quit_tx: Sender<Quit>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        if !event::poll(POLL_INTERVAL).unwrap() {
            continue;
        }
        if let Event::Key(key_event) = event::read().unwrap() {
            if key_event.modifiers == KeyModifiers::CONTROL
                && key_event.code == KeyCode::Char('c')
            {
                let _ = quit_tx.send(Quit::CtrlC);
                return;
            } else if key_event.modifiers == KeyModifiers::NONE {
                let (side, delta) = match key_event.code {
                    KeyCode::Up => (Side::Right, -1),
                    KeyCode::Down => (Side::Right, 1),
                    KeyCode::Char('w') => (Side::Left, -1),
                    KeyCode::Char('s') => (Side::Left, 1),
                    _ => continue,
                };
                if side != local_side {
                    continue;
                }
                // the lock is released before the report goes on the wire.
                let moved = board.lock().unwrap().nudge_paddle(side, delta);
                if let Some(y) = moved {
                    if let Err(err) = writer.send(PeerMessage::PaddleMoved { side, y }) {
                        debug!("failed to report a paddle move: {err}");
                        let _ = quit_tx.send(Quit::ConnectionLost);
                        return;
                    }
                }
            }
        }
    }
}
