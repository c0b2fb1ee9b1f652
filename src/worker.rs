//! The fixed worker-thread pool that pulls tasks off the
//! [`crate::queue::WorkQueue`] and runs them through the interpreter.
//!
//! A fixed set of `thread::spawn` workers draining one shared
//! `Mutex`+`Condvar` queue for the lifetime of the pool.

use crate::environment::Environment;
use crate::interpreter::{Interpreter, SharedContext};
use crate::queue::SubtreeTask;
use crate::value_item::OverridePolicy;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// A fixed set of OS threads draining one [`crate::queue::WorkQueue`].
///
/// Workers never enqueue work and then wait on their own queue pop — they
/// either run a spawned batch's remaining members inline or hand work to the
/// shared queue for a sibling worker to pick up, then block only on the
/// batch's [`crate::barrier::Barrier`]. This prevents the pool from
/// deadlocking itself for fan-out depths up to the pool size; deeper nesting
/// still relies on the inline fallback.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    context: Arc<SharedContext>,
}

impl WorkerPool {
    /// Spawn `worker_count` threads pulling from `context.queue`.
    #[must_use]
    pub fn start(context: Arc<SharedContext>, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let context = Arc::clone(&context);
            handles.push(
                thread::Builder::new()
                    .name(format!("sakura-worker-{worker_id}"))
                    .spawn(move || worker_loop(worker_id, &context))
                    .expect("failed to spawn sakura worker thread"),
            );
        }
        WorkerPool { handles, context }
    }

    /// Number of live worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Signal the queue to drain and shut down, then join every worker
    /// thread.
    pub fn shutdown(self) {
        self.context.queue.shutdown();
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

fn worker_loop(worker_id: usize, context: &SharedContext) {
    crate::interpreter::mark_current_thread_as_worker();
    debug!(worker_id, "worker started");
    while let Some(task) = context.queue.pop() {
        run_task(worker_id, context, task);
    }
    debug!(worker_id, "worker shutting down");
}

/// Execute one queued [`SubtreeTask`] to completion and report it to its
/// batch barrier.
pub(crate) fn run_task(worker_id: usize, context: &SharedContext, mut task: SubtreeTask) {
    debug!(
        worker_id,
        hierarchy = %task.hierarchy.join(" -> "),
        "worker picked up task"
    );
    let mut env = Environment::from_map(task.inputs_snapshot);
    let interpreter = Interpreter::new(context);
    match interpreter.execute(&mut task.subtree, &mut env, &task.hierarchy) {
        Ok(()) => {
            task.results
                .lock()
                .expect("batch results lock poisoned")
                .push(env.snapshot());
            task.barrier.increment();
        }
        Err(err) => {
            warn!(worker_id, error = %err, "task failed");
            task.barrier.register_error(err.message());
            task.barrier.increment();
        }
    }
}

/// Merge every completed task's environment snapshot (in completion order)
/// into `target` with [`OverridePolicy::All`] — the last-completed sibling
/// wins on a name collision.
pub(crate) fn merge_batch_results(
    target: &mut Environment,
    results: &std::sync::Mutex<Vec<crate::value_item::ValueItemMap>>,
) {
    let snapshots = std::mem::take(&mut *results.lock().expect("batch results lock poisoned"));
    for snapshot in snapshots {
        target.merge_from(&snapshot, OverridePolicy::All);
    }
}
