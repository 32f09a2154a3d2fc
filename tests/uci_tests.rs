//! Scripted UCI conversations against the full engine stack.

use meridian::board::Board;
use meridian::config::Config;
use meridian::moves::movegen::generate_legal;
use meridian::uci::UciSession;
use std::io::Write;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn session_with_buffer() -> (UciSession, Arc<Mutex<Vec<u8>>>) {
    let buffer: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let sink: Arc<Mutex<dyn Write + Send>> = buffer.clone();
    let session = UciSession::new(
        Config {
            hash_mb: 8,
            ..Config::default()
        },
        sink,
    );
    (session, buffer)
}

fn output_lines(buffer: &Arc<Mutex<Vec<u8>>>) -> Vec<String> {
    String::from_utf8(buffer.lock().unwrap().clone())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn scripted_handshake_and_fixed_depth_search() {
    let (mut session, buffer) = session_with_buffer();

    assert!(session.handle_line("uci"));
    assert!(session.handle_line("isready"));
    assert!(session.handle_line("position startpos moves e2e4 e7e5"));
    assert!(session.handle_line("go depth 4"));
    session.wait_for_search();

    let lines = output_lines(&buffer);

    let uciok = lines.iter().position(|l| l == "uciok").expect("uciok");
    assert!(lines[..uciok].iter().any(|l| l.starts_with("id name ")));
    assert!(lines[..uciok].iter().any(|l| l.starts_with("id author ")));
    assert!(lines[..uciok]
        .iter()
        .any(|l| l.starts_with("option name Hash type spin")));

    let readyok = lines.iter().position(|l| l == "readyok").expect("readyok");
    assert!(uciok < readyok, "uciok precedes readyok");

    let info = lines
        .iter()
        .position(|l| l.starts_with("info depth 4 "))
        .expect("an info line for the final depth");
    assert!(readyok < info);

    let bestmove_line = lines.last().expect("output ends with bestmove");
    assert!(bestmove_line.starts_with("bestmove "), "{}", bestmove_line);

    // The reported move must be legal for white after 1. e4 e5.
    let uci_move = bestmove_line.split_whitespace().nth(1).unwrap().to_string();
    let mut board = Board::from_str(
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
    )
    .unwrap();
    assert!(
        generate_legal(&mut board)
            .iter()
            .any(|m| m.to_uci() == uci_move),
        "bestmove {} is not legal",
        uci_move
    );
}

#[test]
fn stop_ends_an_infinite_search_with_a_bestmove() {
    let (mut session, buffer) = session_with_buffer();

    session.handle_line("position startpos");
    session.handle_line("go infinite");
    std::thread::sleep(Duration::from_millis(100));
    session.handle_line("stop");
    session.wait_for_search();

    let lines = output_lines(&buffer);
    let bestmoves: Vec<_> = lines
        .iter()
        .filter(|l| l.starts_with("bestmove "))
        .collect();
    assert_eq!(bestmoves.len(), 1, "exactly one bestmove per go");
    assert_ne!(*bestmoves[0], "bestmove 0000");
}

#[test]
fn invalid_position_command_reports_and_keeps_prefix() {
    let (mut session, buffer) = session_with_buffer();

    session.handle_line("position startpos moves e2e4 e9e5");
    let lines = output_lines(&buffer);
    assert!(
        lines.iter().any(|l| l.starts_with("info string error:")),
        "diagnostic for the bad move"
    );
    // The applied prefix stays on the board.
    assert!(session.engine().board().to_fen().contains("4P3"));
}

#[test]
fn unknown_commands_are_ignored() {
    let (mut session, buffer) = session_with_buffer();
    assert!(session.handle_line("flarble 12"));
    assert!(session.handle_line(""));
    assert!(output_lines(&buffer).is_empty());
}

#[test]
fn setoption_rejects_out_of_range_hash() {
    let (mut session, buffer) = session_with_buffer();
    session.handle_line("setoption name Hash value 0");
    assert!(output_lines(&buffer)
        .iter()
        .any(|l| l.starts_with("info string error:")));

    session.handle_line("setoption name Hash value 16");
    let lines = output_lines(&buffer);
    assert_eq!(
        lines
            .iter()
            .filter(|l| l.starts_with("info string error:"))
            .count(),
        1,
        "the in-range value is accepted silently"
    );
}

#[test]
fn quit_ends_the_session() {
    let (mut session, _buffer) = session_with_buffer();
    assert!(!session.handle_line("quit"));
}
