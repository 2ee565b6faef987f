//! Bounded worker pool over tags
//!
//! Scoped threads pull the next job index from a shared counter, so a slow
//! tag never holds up the others. Results come back in job order whatever
//! order they finished in, which keeps reports independent of scheduling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Run `work` over `jobs` on at most `max_workers` threads.
///
/// Returns once every job has finished. A panic in `work` is re-raised on
/// the calling thread.
pub fn run_bounded<T, R, F>(jobs: &[T], max_workers: usize, work: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = max_workers.max(1).min(jobs.len());
    if workers <= 1 {
        return jobs.iter().map(&work).collect();
    }

    let next = AtomicUsize::new(0);
    let mut indexed: Vec<(usize, R)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(job) = jobs.get(i) else {
                            break;
                        };
                        done.push((i, work(job)));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(done) => done,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, r)| r).collect()
}
