use std::{
    fs::File,
    io::{self, stdout, Write},
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::channel,
        Arc, Mutex,
    },
    thread::Builder,
};

use clap::Parser;
use shared::{
    game_state::{GameState, Side},
    handshake::Difficulty,
    peer_msg::PeerMessage,
};
use tracing_subscriber::EnvFilter;

mod game_loop;
mod input;
mod network;
mod screen;
mod tcp_peer;

#[derive(Parser)]
struct Cli {
    /// Host a game on this port and wait for a challenger
    #[arg(long, value_name = "PORT", conflicts_with_all = ["hostname", "port"])]
    host: Option<u16>,
    /// Hostname of a waiting host to challenge
    #[arg(required_unless_present = "host")]
    hostname: Option<String>,
    /// Port that host is listening on
    #[arg(required_unless_present = "host")]
    port: Option<u16>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // usage problems exit with 1, not clap's default 2.
            let _ = err.print();
            process::exit(1);
        }
    };
    init_debug_log();
    let setup = match cli.host {
        Some(port) => {
            let difficulty = prompt_difficulty();
            tcp_peer::host(port, difficulty).map(|peer| (peer, difficulty, Side::Right))
        }
        None => {
            // clap has already insisted on both once --host is absent.
            let hostname = cli.hostname.unwrap();
            tcp_peer::challenge(&hostname, cli.port.unwrap())
                .map(|(peer, difficulty)| (peer, difficulty, Side::Left))
        }
    };
    let (peer, difficulty, local_side) = match setup {
        Ok(setup) => setup,
        Err(err) => {
            eprintln!("netpong: {err}");
            process::exit(1);
        }
    };
    let (reader, writer) = match peer.into_split(tcp_peer::POLL_INTERVAL) {
        Ok(halves) => halves,
        Err(err) => {
            eprintln!("netpong: {err}");
            process::exit(1);
        }
    };

    let board = Arc::new(Mutex::new(GameState::new(&mut rand::thread_rng())));
    let shutdown = Arc::new(AtomicBool::new(false));
    let (quit_tx, quit_rx) = channel();

    screen::init();

    let board_clone = Arc::clone(&board);
    let shutdown_clone = Arc::clone(&shutdown);
    let scheduler = Builder::new()
        .name("scheduler".to_owned())
        .spawn(move || game_loop::run(board_clone, difficulty.tick_interval(), shutdown_clone))
        .unwrap();
    let board_clone = Arc::clone(&board);
    let shutdown_clone = Arc::clone(&shutdown);
    let quit_tx_clone = quit_tx.clone();
    let writer_clone = writer.clone();
    let input_listener = Builder::new()
        .name("input_listener".to_owned())
        .spawn(move || {
            input::listen(
                local_side,
                board_clone,
                writer_clone,
                shutdown_clone,
                quit_tx_clone,
            )
        })
        .unwrap();
    let board_clone = Arc::clone(&board);
    let shutdown_clone = Arc::clone(&shutdown);
    let network_listener = Builder::new()
        .name("network_listener".to_owned())
        .spawn(move || network::listen(reader, board_clone, shutdown_clone, quit_tx))
        .unwrap();

    let quit = quit_rx.recv().unwrap();
    shutdown.store(true, Ordering::Relaxed);
    if let Quit::CtrlC = quit {
        // tell the peer we are leaving; they may already be gone.
        let _ = writer.send(PeerMessage::Exit);
    }
    let _ = scheduler.join();
    let _ = input_listener.join();
    let _ = network_listener.join();

    screen::shutdown();
    match quit {
        Quit::CtrlC => println!("^C"),
        Quit::PeerExit => println!("opponent left"),
        Quit::ConnectionLost => println!("connection to opponent lost"),
    }
}

/// asks the hosting player for a difficulty until they name one.
fn prompt_difficulty() -> Difficulty {
    loop {
        print!("Please select the difficulty level (easy, medium or hard): ");
        stdout().flush().unwrap();
        let mut line = String::new();
        if io::stdin().read_line(&mut line).unwrap() == 0 {
            // stdin is gone; nobody is left to re-prompt.
            eprintln!("netpong: no difficulty selected");
            process::exit(1);
        }
        match line.trim().parse() {
            Ok(difficulty) => return difficulty,
            Err(err) => eprintln!("{err}"),
        }
    }
}

/// the session runs behind an alternate screen, so diagnostics go to a
/// file instead. RUST_LOG narrows or widens what lands there.
fn init_debug_log() {
    let file = match File::create("netpong-debug.log") {
        Ok(file) => file,
        Err(_) => return,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();
}

enum Quit {
    CtrlC,
    PeerExit,
    ConnectionLost,
}
