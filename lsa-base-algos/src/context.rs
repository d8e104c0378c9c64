//! Shared state of one alignment: the inputs, the thread budget, cancellation,
//! progress reporting and counters.
//!
//! Everything here is shared by reference between the worker threads of a
//! single alignment and must therefore be `Sync`.

use lsa_types::*;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Called with `(total, done)` work units. Returning `true` cancels the alignment.
pub type ProgressFn = dyn Fn(u64, u64) -> bool + Send + Sync;

/// Why the recursion stopped early.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Halt {
    Cancelled,
    Failed(AlignError),
}

impl From<AlignError> for Halt {
    fn from(e: AlignError) -> Self {
        Halt::Failed(e)
    }
}

impl Halt {
    /// Combines the results of two independent tasks. A failure wins over a
    /// cancellation.
    pub fn merge<A, B>(a: Result<A, Halt>, b: Result<B, Halt>) -> Result<(A, B), Halt> {
        match (a, b) {
            (Ok(a), Ok(b)) => Ok((a, b)),
            (Err(Halt::Failed(e)), _) | (_, Err(Halt::Failed(e))) => Err(Halt::Failed(e)),
            _ => Err(Halt::Cancelled),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Halt::Failed(AlignError::Internal(msg.into()))
    }
}

/// A cloneable handle that requests cancellation of a running alignment.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clears a previous request, so the token can be reused.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Tracks completed work and forwards it to the user callback.
pub(crate) struct Progress<'a> {
    total: u64,
    done: AtomicU64,
    callback: Option<&'a ProgressFn>,
}

impl<'a> Progress<'a> {
    pub fn new(total: u64, callback: Option<&'a ProgressFn>) -> Self {
        Progress {
            total,
            done: AtomicU64::new(0),
            callback,
        }
    }

    /// Records `units` of finished work. Returns true when the callback asks
    /// to stop.
    pub fn advance(&self, units: u64) -> bool {
        let done = self.done.fetch_add(units, Ordering::Relaxed) + units;
        match self.callback {
            // Work estimates are approximate; never report more than the total.
            Some(f) => f(self.total, done.min(self.total)),
            None => false,
        }
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}

/// Limits the number of threads working on one alignment.
///
/// The calling thread counts as the first one, so a budget of 1 never spawns.
#[derive(Debug)]
pub(crate) struct ThreadBudget {
    max: usize,
    live: AtomicUsize,
    spawned: AtomicUsize,
}

/// A claimed slot of a `ThreadBudget`. Released on drop.
pub(crate) struct Permit<'a>(&'a ThreadBudget);

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ThreadBudget {
    pub fn new(max_threads: usize) -> Self {
        ThreadBudget {
            max: max_threads.max(1),
            live: AtomicUsize::new(1),
            spawned: AtomicUsize::new(0),
        }
    }

    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < self.max).then_some(live + 1)
            })
            .ok()?;
        self.spawned.fetch_add(1, Ordering::Relaxed);
        Some(Permit(self))
    }

    /// Runs both closures, `a` on a new thread when a slot is free and
    /// otherwise inline before `b`.
    pub fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB,
        RA: Send,
    {
        let Some(permit) = self.try_acquire() else {
            let ra = a();
            let rb = b();
            return (ra, rb);
        };
        let result = crossbeam::scope(|s| {
            let handle = s.spawn(move |_| {
                let _permit = permit;
                a()
            });
            let rb = b();
            let ra = match handle.join() {
                Ok(ra) => ra,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            (ra, rb)
        });
        match result {
            Ok(r) => r,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }
}

/// Work counters, summed over all threads.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub splits: AtomicUsize,
    pub terminals: AtomicUsize,
    pub cells: AtomicU64,
}

impl Counters {
    pub fn split(&self) {
        self.splits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn terminal(&self) {
        self.terminals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cells(&self, n: u64) {
        self.cells.fetch_add(n, Ordering::Relaxed);
    }
}

/// Everything a sub-problem needs besides its rectangle.
pub(crate) struct AlignContext<'a> {
    pub a: Seq<'a>,
    pub b: Seq<'a>,
    pub model: &'a ScoreModel,
    pub budget: ThreadBudget,
    pub cancel: &'a CancelToken,
    /// Set when the progress callback asks to stop. Unlike `cancel`, this
    /// does not outlive the alignment.
    stopped: AtomicBool,
    pub progress: Progress<'a>,
    pub counters: Counters,
}

impl<'a> AlignContext<'a> {
    pub fn new(
        a: Seq<'a>,
        b: Seq<'a>,
        model: &'a ScoreModel,
        max_threads: usize,
        cancel: &'a CancelToken,
        progress: Progress<'a>,
    ) -> Self {
        AlignContext {
            a,
            b,
            model,
            budget: ThreadBudget::new(max_threads),
            cancel,
            stopped: AtomicBool::new(false),
            progress,
            counters: Counters::default(),
        }
    }

    /// Fails with `Halt::Cancelled` once cancellation was requested.
    #[inline]
    pub fn check(&self) -> Result<(), Halt> {
        if self.cancel.is_cancelled() || self.stopped.load(Ordering::Relaxed) {
            Err(Halt::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Records a finished DP row of `cells` cells and polls for cancellation.
    pub fn row_done(&self, cells: u64) -> Result<(), Halt> {
        self.counters.cells(cells);
        if self.progress.advance(cells) {
            self.stopped.store(true, Ordering::Relaxed);
        }
        self.check()
    }

    pub fn stats(&self) -> AlignStats {
        AlignStats {
            len1: self.a.len(),
            len2: self.b.len(),
            splits: self.counters.splits.load(Ordering::Relaxed),
            terminals: self.counters.terminals.load(Ordering::Relaxed),
            spawned: self.budget.spawned(),
            cells: self.counters.cells.load(Ordering::Relaxed),
            bands: 0,
            duration: 0.,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn budget_of_one_runs_inline() {
        let budget = ThreadBudget::new(1);
        assert!(budget.try_acquire().is_none());
        let main = std::thread::current().id();
        let (a, b) = budget.join(|| std::thread::current().id(), || 2);
        assert_eq!(a, main);
        assert_eq!(b, 2);
        assert_eq!(budget.spawned(), 0);
    }

    #[test]
    fn permits_are_released() {
        let budget = ThreadBudget::new(3);
        let p1 = budget.try_acquire();
        let p2 = budget.try_acquire();
        assert!(p1.is_some() && p2.is_some());
        assert!(budget.try_acquire().is_none());
        assert_eq!(budget.live(), 3);
        drop(p1);
        assert_eq!(budget.live(), 2);
        assert!(budget.try_acquire().is_some());
        drop(p2);
        assert_eq!(budget.live(), 1);
        assert_eq!(budget.spawned(), 3);
    }

    #[test]
    fn join_spawns_when_possible() {
        let budget = ThreadBudget::new(2);
        // Both sides wait for each other, which only terminates when they run concurrently.
        let barrier = Barrier::new(2);
        let (a, b) = budget.join(
            || {
                barrier.wait();
                1
            },
            || {
                barrier.wait();
                2
            },
        );
        assert_eq!((a, b), (1, 2));
        assert_eq!(budget.spawned(), 1);
        assert_eq!(budget.live(), 1);
    }

    #[test]
    fn halt_merge_prefers_failure() {
        let failed = Halt::internal("boom");
        assert_eq!(
            Halt::merge::<(), ()>(Err(Halt::Cancelled), Err(failed.clone())),
            Err(failed)
        );
        assert_eq!(
            Halt::merge::<(), ()>(Ok(()), Err(Halt::Cancelled)),
            Err(Halt::Cancelled)
        );
        assert_eq!(Halt::merge::<i32, i32>(Ok(1), Ok(2)), Ok((1, 2)));
    }

    #[test]
    fn callback_cancels() {
        let model = ScoreModel::new(Alphabet::Nucleotide, 1, -1, -2, -1, EndGaps::NONE).unwrap();
        let cancel = CancelToken::new();
        let stop_after_two: &ProgressFn = &|_total: u64, done: u64| done >= 2;
        let ctx = AlignContext::new(
            b"",
            b"",
            &model,
            1,
            &cancel,
            Progress::new(10, Some(stop_after_two)),
        );
        assert_eq!(ctx.row_done(1), Ok(()));
        assert_eq!(ctx.row_done(1), Err(Halt::Cancelled));
        assert!(!cancel.is_cancelled());
        assert_eq!(ctx.check(), Err(Halt::Cancelled));
        assert_eq!(ctx.progress.done(), 2);
    }
}
