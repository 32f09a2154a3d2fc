//! The UCI adapter: line parsing, command dispatch and engine-to-GUI
//! reporting. The engine core stays protocol-agnostic; everything wire-level
//! lives here.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Config;
use crate::engine::{Engine, GoParams};
use crate::eval::{is_mate_eval, mate_in_moves, Eval};
use crate::moves::types::Move;
use crate::search::observer::SearchObserver;
use crate::search::pv::Pv;
use crate::search::SearchStats;

pub const ENGINE_NAME: &str = concat!("Meridian ", env!("CARGO_PKG_VERSION"));
pub const ENGINE_AUTHOR: &str = "the Meridian authors";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go(GoParamsText),
    Stop,
    SetOption {
        name: String,
        value: Option<String>,
    },
    Quit,
}

/// `go` arguments as parsed from the wire, before reduction to the side to
/// move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoParamsText {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u32>,
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
    pub movetime: Option<u64>,
    pub infinite: bool,
}

impl GoParamsText {
    pub fn into_go_params(self) -> GoParams {
        GoParams {
            wtime: self.wtime.map(Duration::from_millis),
            btime: self.btime.map(Duration::from_millis),
            winc: self.winc.map(Duration::from_millis),
            binc: self.binc.map(Duration::from_millis),
            moves_to_go: self.movestogo,
            depth: self.depth,
            nodes: self.nodes,
            move_time: self.movetime.map(Duration::from_millis),
            infinite: self.infinite,
        }
    }
}

/// Tokenize one input line. Unknown commands yield `None`; the caller logs
/// and ignores them.
pub fn parse_command(line: &str) -> Option<UciCommand> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (&first, rest) = tokens.split_first()?;

    match first {
        "uci" => Some(UciCommand::Uci),
        "isready" => Some(UciCommand::IsReady),
        "ucinewgame" => Some(UciCommand::UciNewGame),
        "position" => parse_position(rest),
        "go" => Some(UciCommand::Go(parse_go(rest))),
        "stop" => Some(UciCommand::Stop),
        "setoption" => parse_setoption(rest),
        "quit" => Some(UciCommand::Quit),
        _ => None,
    }
}

fn parse_position(tokens: &[&str]) -> Option<UciCommand> {
    let moves_at = tokens.iter().position(|&t| t == "moves");
    let moves = moves_at
        .map(|i| tokens[i + 1..].iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();
    let spec = &tokens[..moves_at.unwrap_or(tokens.len())];

    let fen = match spec.first() {
        Some(&"startpos") | None => None,
        Some(&"fen") => Some(spec[1..].join(" ")),
        // A bare FEN is accepted as a convenience.
        Some(_) => Some(spec.join(" ")),
    };
    Some(UciCommand::Position { fen, moves })
}

fn parse_go(tokens: &[&str]) -> GoParamsText {
    let mut params = GoParamsText::default();
    let mut iter = tokens.iter();
    while let Some(&token) = iter.next() {
        let mut number = |_name: &str| iter.next().and_then(|v| v.parse::<u64>().ok());
        match token {
            "wtime" => params.wtime = number("wtime"),
            "btime" => params.btime = number("btime"),
            "winc" => params.winc = number("winc"),
            "binc" => params.binc = number("binc"),
            "movestogo" => params.movestogo = number("movestogo").map(|v| v as u32),
            "depth" => params.depth = number("depth").map(|v| v.min(255) as u8),
            "nodes" => params.nodes = number("nodes"),
            "movetime" => params.movetime = number("movetime"),
            "infinite" => params.infinite = true,
            other => tracing::debug!(token = other, "ignored go token"),
        }
    }
    params
}

fn parse_setoption(tokens: &[&str]) -> Option<UciCommand> {
    if tokens.first() != Some(&"name") {
        return None;
    }
    let value_at = tokens.iter().position(|&t| t == "value");
    let name = tokens[1..value_at.unwrap_or(tokens.len())].join(" ");
    if name.is_empty() {
        return None;
    }
    let value = value_at.map(|i| tokens[i + 1..].join(" "));
    Some(UciCommand::SetOption { name, value })
}

// ---- Output side.

/// Where engine output goes: stdout in production, a buffer in tests.
pub type Sink = Arc<Mutex<dyn Write + Send>>;

fn emit(sink: &Sink, line: &str) {
    let mut out = sink.lock().unwrap();
    let _ = writeln!(out, "{}", line);
    let _ = out.flush();
}

fn format_score(eval: Eval) -> String {
    if is_mate_eval(eval) {
        format!("mate {}", mate_in_moves(eval))
    } else {
        format!("cp {}", eval)
    }
}

fn format_info(pv: &Pv, eval: Eval, depth: u8, time: f64, nodes: u64) -> String {
    let millis = (time * 1000.0) as u64;
    let nps = if time > 0.0 {
        (nodes as f64 / time) as u64
    } else {
        0
    };
    let mut line = format!(
        "info depth {} time {} nodes {} nps {} score {}",
        depth,
        millis,
        nodes,
        nps,
        format_score(eval)
    );
    if !pv.is_empty() {
        line.push_str(&format!(" pv {}", pv));
    }
    line
}

/// Prints `info` lines as the search progresses and the final `bestmove`.
struct Reporter {
    sink: Sink,
}

impl SearchObserver for Reporter {
    fn on_new_best_move(&self, pv: &Pv, eval: Eval, depth: u8, time: f64, nodes: u64) {
        emit(&self.sink, &format_info(pv, eval, depth, time, nodes));
    }

    fn on_iteration_completed(&self, pv: &Pv, eval: Eval, depth: u8, time: f64, nodes: u64) {
        emit(&self.sink, &format_info(pv, eval, depth, time, nodes));
    }

    fn on_search_completed(&self, pv: &Pv, _time: f64, _stats: &SearchStats) {
        let best = pv.first().unwrap_or(Move::NONE);
        emit(&self.sink, &format!("bestmove {}", best));
    }
}

/// One UCI conversation: owns the engine and writes every reply to the sink.
pub struct UciSession {
    engine: Engine,
    sink: Sink,
}

impl UciSession {
    pub fn new(config: Config, sink: Sink) -> Self {
        let engine = Engine::new(config);
        engine.attach_observer(Arc::new(Reporter {
            sink: Arc::clone(&sink),
        }));
        UciSession { engine, sink }
    }

    /// Process one input line. Returns false when the session should end.
    pub fn handle_line(&mut self, line: &str) -> bool {
        let command = match parse_command(line) {
            Some(command) => command,
            None => {
                if !line.trim().is_empty() {
                    tracing::warn!(line, "unknown UCI command ignored");
                }
                return true;
            }
        };

        match command {
            UciCommand::Uci => {
                emit(&self.sink, &format!("id name {}", ENGINE_NAME));
                emit(&self.sink, &format!("id author {}", ENGINE_AUTHOR));
                emit(
                    &self.sink,
                    &format!(
                        "option name Hash type spin default {} min {} max {}",
                        Config::default().hash_mb,
                        crate::config::MIN_HASH_MB,
                        crate::config::MAX_HASH_MB
                    ),
                );
                emit(
                    &self.sink,
                    &format!(
                        "option name MaxDepth type spin default {} min 1 max {}",
                        Config::default().max_depth,
                        crate::config::MAX_DEPTH
                    ),
                );
                emit(&self.sink, "uciok");
            }
            UciCommand::IsReady => emit(&self.sink, "readyok"),
            UciCommand::UciNewGame => self.engine.new_game(),
            UciCommand::Position { fen, moves } => {
                let refs: Vec<&str> = moves.iter().map(String::as_str).collect();
                if let Err(err) = self.engine.set_position(fen.as_deref(), &refs) {
                    tracing::warn!(%err, "position command rejected");
                    emit(&self.sink, &format!("info string error: {}", err));
                }
            }
            UciCommand::Go(params) => self.engine.go(params.into_go_params()),
            UciCommand::Stop => self.engine.stop(),
            UciCommand::SetOption { name, value } => {
                if let Err(err) = self.engine.set_option(&name, value.as_deref()) {
                    tracing::warn!(%err, option = %name, "setoption rejected");
                    emit(&self.sink, &format!("info string error: {}", err));
                }
            }
            UciCommand::Quit => {
                self.engine.stop();
                self.engine.wait_until_idle();
                return false;
            }
        }
        true
    }

    /// Block until an in-flight search has emitted its `bestmove`.
    pub fn wait_for_search(&self) {
        self.engine.wait_until_idle();
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}
