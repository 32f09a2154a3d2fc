//! The engine façade: owns the board being played, the transposition table
//! and the searcher, and exposes the operations the UCI layer drives.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::board::{Board, Color, FenError};
use crate::config::{check_range, Config, ConfigError, MAX_DEPTH, MAX_HASH_MB, MIN_HASH_MB};
use crate::eval::psqt;
use crate::moves::execute::make;
use crate::moves::san;
use crate::search::observer::SearchObserver;
use crate::search::searcher::Searcher;
use crate::search::tt::TranspositionTable;
use crate::search::Search;
use crate::time::{TimeControl, TimeManager};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Fen(#[from] FenError),
    #[error("invalid move `{text}` at index {index}; preceding moves were applied")]
    InvalidMove { index: usize, text: String },
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("option `{0}` requires a value")]
    MissingValue(String),
    #[error("invalid value for `{name}`: {value}")]
    InvalidValue { name: String, value: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("engine is searching; command rejected")]
    Busy,
}

/// Search limits of a `go` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoParams {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub moves_to_go: Option<u32>,
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
    pub move_time: Option<Duration>,
    pub infinite: bool,
}

pub struct Engine {
    board: Board,
    tt: Arc<Mutex<TranspositionTable>>,
    searcher: Searcher,
    max_depth: u8,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        psqt::configure(&config);
        let tt = Arc::new(Mutex::new(TranspositionTable::new(config.hash_mb)));
        let searcher = Searcher::new(Arc::clone(&tt));
        Engine {
            board: Board::new(),
            tt,
            searcher,
            max_depth: config.max_depth,
        }
    }

    pub fn attach_observer(&self, observer: Arc<dyn SearchObserver>) {
        self.searcher.attach(observer);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_searching(&self) -> bool {
        self.searcher.is_searching()
    }

    pub fn new_game(&mut self) {
        self.searcher.stop();
        self.searcher.wait_until_idle();
        self.tt.lock().unwrap().clear();
        self.board = Board::new();
    }

    /// Reset the board to `fen` (or the start position) and apply the given
    /// long-algebraic moves. On an invalid move the remainder of the list is
    /// rejected and the board keeps the successfully applied prefix.
    pub fn set_position(&mut self, fen: Option<&str>, moves: &[&str]) -> Result<(), EngineError> {
        self.board = match fen {
            Some(text) => Board::from_fen(text)?,
            None => Board::new(),
        };

        for (index, text) in moves.iter().enumerate() {
            match san::parse(&mut self.board, text) {
                Some(mv) => {
                    make(&mut self.board, mv);
                }
                None => {
                    return Err(EngineError::InvalidMove {
                        index,
                        text: (*text).to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Start a search for the current position. Events arrive through the
    /// attached observers; `bestmove` follows the search-completed event.
    pub fn go(&mut self, params: GoParams) {
        let (time_left, increment) = match self.board.side_to_move {
            Color::White => (params.wtime, params.winc),
            Color::Black => (params.btime, params.binc),
        };
        let control = TimeControl {
            time_left,
            increment,
            moves_to_go: params.moves_to_go,
            move_time: params.move_time,
            // Without any limit at all, search forever as `go infinite` does.
            infinite: params.infinite
                || (time_left.is_none() && params.move_time.is_none()),
        };

        let max_depth = params.depth.unwrap_or(self.max_depth).min(MAX_DEPTH);
        let search = Search::new(
            self.board.clone(),
            TimeManager::new(control),
            max_depth,
            params.nodes,
        );
        self.searcher.start(search);
    }

    pub fn stop(&self) {
        self.searcher.stop();
    }

    /// Block until the current search (if any) has emitted its completion.
    pub fn wait_until_idle(&self) {
        self.searcher.wait_until_idle();
    }

    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), EngineError> {
        if self.is_searching() {
            return Err(EngineError::Busy);
        }

        match name.to_ascii_lowercase().as_str() {
            "hash" => {
                let text = value.ok_or_else(|| EngineError::MissingValue(name.to_string()))?;
                let mb: usize = text.parse().map_err(|_| EngineError::InvalidValue {
                    name: name.to_string(),
                    value: text.to_string(),
                })?;
                check_range("hash_mb", mb as i64, MIN_HASH_MB as i64, MAX_HASH_MB as i64)?;
                *self.tt.lock().unwrap() = TranspositionTable::new(mb);
                tracing::info!(mb, "transposition table resized");
                Ok(())
            }
            "maxdepth" => {
                let text = value.ok_or_else(|| EngineError::MissingValue(name.to_string()))?;
                let depth: u8 = text.parse().map_err(|_| EngineError::InvalidValue {
                    name: name.to_string(),
                    value: text.to_string(),
                })?;
                check_range("max_depth", depth as i64, 1, MAX_DEPTH as i64)?;
                self.max_depth = depth;
                Ok(())
            }
            _ => Err(EngineError::UnknownOption(name.to_string())),
        }
    }
}
