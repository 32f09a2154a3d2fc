use std::io::{self, BufRead};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use indicatif::ProgressBar;

use meridian::board::{Board, START_FEN};
use meridian::config::Config;
use meridian::moves::perft::{divide, perft};
use meridian::search::iterative;
use meridian::search::observer::NullObserver;
use meridian::search::tt::TranspositionTable;
use meridian::search::Search;
use meridian::time::{TimeControl, TimeManager};
use meridian::uci::UciSession;

const CONFIG_FILE: &str = "meridian.json";

fn main() {
    let log_file = std::env::var_os("MERIDIAN_LOG").map(PathBuf::from);
    meridian::logger::init(log_file.as_deref());

    // Builds and verifies every precomputed table; panics (nonzero exit) on
    // any inconsistency.
    meridian::init();

    let config = match Config::load(CONFIG_FILE) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("uci") => run_uci(config),
        Some("perft") => run_perft(&args[1..]),
        Some("bench") => run_bench(config, &args[1..]),
        Some(other) => {
            eprintln!("unknown mode `{}`", other);
            eprintln!("usage: meridian [uci | perft <depth> [fen] | bench [threads] [movetime-ms]]");
            std::process::exit(1);
        }
    }
}

fn run_uci(config: Config) {
    let sink: Arc<Mutex<dyn io::Write + Send>> = Arc::new(Mutex::new(io::stdout()));
    let mut session = UciSession::new(config, sink);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        if !session.handle_line(&line) {
            break;
        }
    }
}

fn run_perft(args: &[String]) {
    let depth: u32 = args
        .first()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            eprintln!("usage: meridian perft <depth> [fen]");
            std::process::exit(1);
        });
    let fen = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        START_FEN.to_string()
    };

    let mut board = match Board::from_str(&fen) {
        Ok(board) => board,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let started = Instant::now();
    let mut total = 0u64;
    for (mv, nodes) in divide(&mut board, depth) {
        println!("{} {}", mv, nodes);
        total += nodes;
    }
    let elapsed = started.elapsed();
    let nps = total as f64 / elapsed.as_secs_f64().max(1e-9);
    println!(
        "perft({}) = {} in {:.3}s ({:.0} nodes/s)",
        depth,
        total,
        elapsed.as_secs_f64(),
        nps
    );
}

/// Positions with varied character: opening, tactical middlegame, endgames.
const BENCH_SUITE: &[&str] = &[
    START_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
];

/// Run independent searches in parallel: each worker gets its own board and
/// transposition table and they never communicate.
fn run_bench(config: Config, args: &[String]) {
    let threads: usize = args
        .first()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(BENCH_SUITE.len())
        });
    let movetime_ms: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(1000);

    println!(
        "bench: {} threads, {} positions, {} ms each",
        threads,
        BENCH_SUITE.len(),
        movetime_ms
    );

    let progress = ProgressBar::new((threads * BENCH_SUITE.len()) as u64);
    let started = Instant::now();

    let mut handles = Vec::new();
    for _ in 0..threads {
        let hash_mb = config.hash_mb;
        let progress = progress.clone();
        handles.push(std::thread::spawn(move || {
            let mut nodes = 0u64;
            let mut tt = TranspositionTable::new(hash_mb);
            for fen in BENCH_SUITE {
                let board = Board::from_str(fen).expect("bench FEN is valid");
                let mut search = Search::new(
                    board,
                    TimeManager::new(TimeControl {
                        move_time: Some(Duration::from_millis(movetime_ms)),
                        ..Default::default()
                    }),
                    meridian::config::MAX_DEPTH,
                    None,
                );
                let result = iterative::run(&mut search, &mut tt, &NullObserver);
                nodes += result.stats.all_nodes();
                progress.inc(1);
            }
            nodes
        }));
    }

    let total_nodes: u64 = handles.into_iter().map(|h| h.join().unwrap_or(0)).sum();
    progress.finish_and_clear();

    let elapsed = started.elapsed();
    println!(
        "bench: {} nodes in {:.2}s, {:.0} nodes/s aggregate",
        total_nodes,
        elapsed.as_secs_f64(),
        total_nodes as f64 / elapsed.as_secs_f64().max(1e-9)
    );
}
