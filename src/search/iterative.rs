//! Iterative deepening: repeat the alpha-beta search with increasing depth,
//! promoting the previous best move to the front of the root list, until the
//! time manager declines another iteration or the depth limit is reached.

use crate::moves::movegen::generate_legal;
use crate::search::alpha_beta::AlphaBeta;
use crate::search::observer::SearchObserver;
use crate::search::tt::TranspositionTable;
use crate::search::{ResultKind, Search, SearchResult};

pub fn run(
    search: &mut Search,
    tt: &mut TranspositionTable,
    observer: &dyn SearchObserver,
) -> SearchResult {
    search.time_manager.on_search_started();
    observer.on_search_started();

    let root_moves = generate_legal(&mut search.board);
    let abort = search.abort_handle();

    let mut alpha_beta = AlphaBeta::new(
        search.board.clone(),
        root_moves,
        tt,
        &search.time_manager,
        &abort,
        search.node_limit,
        observer,
    );

    let mut accumulated = SearchResult::empty();

    let mut depth = 1u8;
    while depth <= search.max_depth && search.time_manager.can_start_new_iteration() {
        search.time_manager.on_iteration_started();
        observer.on_iteration_started();

        let result = alpha_beta.start(depth);

        if result.kind == ResultKind::Complete {
            search.time_manager.on_iteration_completed();
            observer.on_iteration_completed(
                &result.pv,
                result.eval,
                depth,
                0.0,
                result.stats.all_nodes(),
            );

            // Searching last iteration's best move first both speeds up the
            // next iteration and makes partial results usable.
            if let Some(best) = result.pv.first() {
                alpha_beta.promote_root_move(best);
            }
        }

        accumulated.merge(&result);

        if result.kind != ResultKind::Complete {
            break;
        }
        depth += 1;
    }

    accumulated
}
