//! Filling all score tables of a lattice, in an order where every state comes after its
//! predecessors.

use std::sync::OnceLock;
use std::thread;

use tracing::debug;

use crate::aligner::fill::{fill_state, FillContext};
use crate::aligner::scoring::ScoreType;
use crate::aligner::table::ScoreTable;
use crate::errors::GlocalError;

pub(crate) type Tables<S> = Vec<OnceLock<ScoreTable<S>>>;

fn empty_tables<S>(num_states: usize) -> Tables<S> {
    (0..num_states).map(|_| OnceLock::new()).collect()
}

fn publish<S>(tables: &[OnceLock<ScoreTable<S>>], state_ix: usize, table: ScoreTable<S>) -> Result<(), GlocalError> {
    tables[state_ix].set(table)
        .map_err(|_| GlocalError::GraphError)
}

pub(crate) fn fill_tables<S>(ctx: &FillContext<S>, threads: usize) -> Result<Tables<S>, GlocalError>
where
    S: ScoreType
{
    if threads <= 1 || ctx.lattice.len() == 1 {
        fill_sequential(ctx)
    } else {
        fill_parallel(ctx, threads)
    }
}

pub(crate) fn fill_sequential<S>(ctx: &FillContext<S>) -> Result<Tables<S>, GlocalError>
where
    S: ScoreType
{
    let tables = empty_tables(ctx.lattice.len());

    for state_ix in ctx.lattice.topological_order()? {
        let table = fill_state(ctx, state_ix, &tables)?;
        publish(&tables, state_ix, table)?;
    }

    Ok(tables)
}

/// Fill tables on a pool of worker threads. A state is handed to a worker as soon as all
/// states it can be reached from are filled.
pub(crate) fn fill_parallel<S>(ctx: &FillContext<S>, threads: usize) -> Result<Tables<S>, GlocalError>
where
    S: ScoreType
{
    let lattice = ctx.lattice;

    // Rejects cyclic lattices before any worker starts waiting on them
    lattice.topological_order()?;

    let tables = empty_tables(lattice.len());
    let mut waiting_on: Vec<usize> = lattice.states().iter()
        .map(|s| s.previous().len())
        .collect();

    thread::scope(|scope| -> Result<(), GlocalError> {
        // Workers stop once the job sender goes out of scope
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<usize>();
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<(usize, Result<(), GlocalError>)>();

        for worker in 0..threads.min(lattice.len()) {
            let thread_rx = job_rx.clone();
            let thread_tx = done_tx.clone();
            let tables = &tables;

            scope.spawn(move || {
                while let Ok(state_ix) = thread_rx.recv() {
                    debug!(worker, state = state_ix, "Filling table");

                    let result = fill_state(ctx, state_ix, tables)
                        .and_then(|table| publish(tables, state_ix, table));

                    if thread_tx.send((state_ix, result)).is_err() {
                        break;
                    }
                }
            });
        }

        drop(done_tx);

        let dispatch = |state_ix: usize| job_tx.send(state_ix)
            .map_err(|_| GlocalError::GraphError);

        for (state_ix, count) in waiting_on.iter().enumerate() {
            if *count == 0 {
                dispatch(state_ix)?;
            }
        }

        let mut filled = 0;
        while filled < lattice.len() {
            let (state_ix, result) = done_rx.recv()
                .map_err(|_| GlocalError::GraphError)?;
            result?;
            filled += 1;

            for next in lattice.get(state_ix).following() {
                waiting_on[*next] -= 1;
                if waiting_on[*next] == 0 {
                    dispatch(*next)?;
                }
            }
        }

        Ok(())
    })?;

    Ok(tables)
}
