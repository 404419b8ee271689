//! Parallel execution of independent runs.
//!
//! A run owns all of its mutable state, so parallelism stays outside the
//! replay: each engine gets its own broker and the bar/signal slices are
//! shared read-only.

use rayon::prelude::*;

use backcast_core::domain::{Bar, Signal};

use crate::engine::Engine;
use crate::result::RunResult;

/// Run every engine over the same input streams, in parallel. Results come
/// back in engine order.
pub fn run_batch(engines: &[Engine], bars: &[Bar], signals: &[Signal]) -> Vec<RunResult> {
    engines
        .par_iter()
        .map(|engine| engine.run(bars, signals))
        .collect()
}
