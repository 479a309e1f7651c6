//! Locks guarding the `current` and `next` pools of a run.
//!
//! A [`PoolLock`] owns both pools. Access is scoped to a closure: the lock for
//! the requested role and mode is taken, the closure runs, and the lock is
//! released, so one differentiation call can make several reads of the
//! current pool against a stable snapshot while writes stay one `set` long.
//!
//! Under [`PoolReplacement::Immediately`] both roles alias the same pool behind
//! the same lock; under [`PoolReplacement::After`] they are distinct pools with
//! distinct locks.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Pool;
use crate::evolution::options::{EvolutionSettings, LockFairness, PoolReplacement};

/// The logical role of a pool within one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolRole {
    /// The pool parents and differentiation samples are read from.
    Current,
    /// The pool accepted candidates are written to.
    Next,
}

/// Role- and mode-aware access to the pools of a run.
pub trait PoolLock: Sized {
    /// Creates the lock together with an empty current pool sized from `settings`.
    fn create(settings: &EvolutionSettings) -> Self;

    /// Runs `f` while holding the read lock of `role`.
    fn read<R>(&self, role: PoolRole, f: impl FnOnce(&Pool) -> R) -> R;

    /// Like [`PoolLock::read`], but may be taken while the calling thread already
    /// holds a read lock on the same pool.
    fn read_recursive<R>(&self, role: PoolRole, f: impl FnOnce(&Pool) -> R) -> R {
        self.read(role, f)
    }

    /// Runs `f` while holding the write lock of `role`.
    fn write<R>(&self, role: PoolRole, f: impl FnOnce(&mut Pool) -> R) -> R;

    /// Sets up the next pool before an iteration: the current pool itself under
    /// immediate replacement, a fresh empty pool otherwise.
    fn prepare_next(&mut self);

    /// Makes the next pool the current one.
    fn promote(&mut self);

    /// Returns `true` when the current and next roles refer to the same pool.
    fn is_aliased(&self) -> bool;
}

/// A pool lock for single-threaded back-ends.
///
/// No synchronization primitive is involved; the pools sit in `RefCell`s and the
/// type is neither `Send` nor `Sync`, so it cannot leak into worker threads.
#[derive(Debug)]
pub struct NoOpPoolLock {
    current: Rc<RefCell<Pool>>,
    next: Rc<RefCell<Pool>>,
    size: usize,
    replacement: PoolReplacement,
}

impl PoolLock for NoOpPoolLock {
    fn create(settings: &EvolutionSettings) -> Self {
        let size = settings.candidate_pool_size();
        let replacement = settings.pool_replacement();
        let current = Rc::new(RefCell::new(Pool::new(size)));
        let next = match replacement {
            PoolReplacement::Immediately => Rc::clone(&current),
            PoolReplacement::After => Rc::new(RefCell::new(Pool::new(size))),
        };

        Self {
            current,
            next,
            size,
            replacement,
        }
    }

    fn read<R>(&self, role: PoolRole, f: impl FnOnce(&Pool) -> R) -> R {
        f(&*self.pool(role).borrow())
    }

    fn write<R>(&self, role: PoolRole, f: impl FnOnce(&mut Pool) -> R) -> R {
        f(&mut *self.pool(role).borrow_mut())
    }

    fn prepare_next(&mut self) {
        self.next = match self.replacement {
            PoolReplacement::Immediately => Rc::clone(&self.current),
            PoolReplacement::After => Rc::new(RefCell::new(Pool::new(self.size))),
        };
    }

    fn promote(&mut self) {
        self.current = Rc::clone(&self.next);
    }

    fn is_aliased(&self) -> bool {
        Rc::ptr_eq(&self.current, &self.next)
    }
}

impl NoOpPoolLock {
    fn pool(&self, role: PoolRole) -> &RefCell<Pool> {
        match role {
            PoolRole::Current => &self.current,
            PoolRole::Next => &self.next,
        }
    }
}

/// A pool lock backed by `parking_lot` read/write locks, one per pool.
///
/// Readers of a pool run concurrently; a writer excludes readers of the same
/// pool only for the duration of one closure. With [`LockFairness::Fair`] every
/// release hands the lock directly to the next waiter.
#[derive(Debug)]
pub struct ReadWritePoolLock {
    current: Arc<RwLock<Pool>>,
    next: Arc<RwLock<Pool>>,
    size: usize,
    replacement: PoolReplacement,
    fairness: LockFairness,
}

impl PoolLock for ReadWritePoolLock {
    fn create(settings: &EvolutionSettings) -> Self {
        let size = settings.candidate_pool_size();
        let replacement = settings.pool_replacement();
        let current = Arc::new(RwLock::new(Pool::new(size)));
        let next = match replacement {
            PoolReplacement::Immediately => Arc::clone(&current),
            PoolReplacement::After => Arc::new(RwLock::new(Pool::new(size))),
        };

        Self {
            current,
            next,
            size,
            replacement,
            fairness: settings.pool_lock_fairness(),
        }
    }

    fn read<R>(&self, role: PoolRole, f: impl FnOnce(&Pool) -> R) -> R {
        let guard = self.pool(role).read();
        let result = f(&*guard);
        self.release_read(guard);
        result
    }

    fn read_recursive<R>(&self, role: PoolRole, f: impl FnOnce(&Pool) -> R) -> R {
        let guard = self.pool(role).read_recursive();
        let result = f(&*guard);
        self.release_read(guard);
        result
    }

    fn write<R>(&self, role: PoolRole, f: impl FnOnce(&mut Pool) -> R) -> R {
        let mut guard = self.pool(role).write();
        let result = f(&mut *guard);
        match self.fairness {
            LockFairness::Fair => RwLockWriteGuard::unlock_fair(guard),
            LockFairness::Unfair => drop(guard),
        }
        result
    }

    fn prepare_next(&mut self) {
        self.next = match self.replacement {
            PoolReplacement::Immediately => Arc::clone(&self.current),
            PoolReplacement::After => Arc::new(RwLock::new(Pool::new(self.size))),
        };
    }

    fn promote(&mut self) {
        self.current = Arc::clone(&self.next);
    }

    fn is_aliased(&self) -> bool {
        Arc::ptr_eq(&self.current, &self.next)
    }
}

impl ReadWritePoolLock {
    fn pool(&self, role: PoolRole) -> &RwLock<Pool> {
        match role {
            PoolRole::Current => &self.current,
            PoolRole::Next => &self.next,
        }
    }

    fn release_read(&self, guard: RwLockReadGuard<'_, Pool>) {
        match self.fairness {
            LockFairness::Fair => RwLockReadGuard::unlock_fair(guard),
            LockFairness::Unfair => drop(guard),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use std::thread;

    fn settings(replacement: PoolReplacement, fairness: LockFairness) -> EvolutionSettings {
        EvolutionSettings::builder()
            .candidate_pool_size(4)
            .pool_replacement(replacement)
            .pool_lock_fairness(fairness)
            .build()
            .unwrap()
    }

    fn check_aliasing<L: PoolLock>() {
        let mut lock = L::create(&settings(PoolReplacement::Immediately, LockFairness::Unfair));
        assert!(lock.is_aliased());
        lock.write(PoolRole::Next, |pool| {
            pool.set(0, Candidate::feasible(vec![1.0], 1.0)).unwrap()
        });
        assert!(lock.read(PoolRole::Current, |pool| pool.get(0).is_ok()));

        let mut lock = L::create(&settings(PoolReplacement::After, LockFairness::Fair));
        assert!(!lock.is_aliased());
        lock.write(PoolRole::Current, |pool| {
            pool.set(0, Candidate::feasible(vec![1.0], 1.0)).unwrap()
        });
        lock.prepare_next();
        lock.write(PoolRole::Next, |pool| {
            pool.set(1, Candidate::feasible(vec![2.0], 2.0)).unwrap()
        });
        assert!(lock.read(PoolRole::Current, |pool| pool.get(1).is_err()));

        lock.promote();
        assert!(lock.is_aliased());
        assert!(lock.read(PoolRole::Current, |pool| pool.get(0).is_err()));
        assert!(lock.read(PoolRole::Current, |pool| pool.get(1).is_ok()));
    }

    #[test]
    fn test_no_op_lock_aliasing() {
        check_aliasing::<NoOpPoolLock>();
    }

    #[test]
    fn test_read_write_lock_aliasing() {
        check_aliasing::<ReadWritePoolLock>();
    }

    #[test]
    fn test_read_recursive_inside_read() {
        let lock =
            ReadWritePoolLock::create(&settings(PoolReplacement::Immediately, LockFairness::Fair));
        let size = lock.read(PoolRole::Current, |_| {
            lock.read_recursive(PoolRole::Current, |pool| pool.size())
        });
        assert_eq!(size, 4);
    }

    #[test]
    fn test_concurrent_writers_to_distinct_slots() {
        let lock =
            ReadWritePoolLock::create(&settings(PoolReplacement::Immediately, LockFairness::Unfair));

        thread::scope(|scope| {
            for index in 0..4 {
                let lock = &lock;
                scope.spawn(move || {
                    for step in 0..100 {
                        let fitness = (index * 100 + step) as f64;
                        lock.write(PoolRole::Next, |pool| {
                            pool.set(index, Candidate::feasible(vec![fitness], fitness)).unwrap()
                        });
                        lock.read(PoolRole::Current, |pool| assert!(pool.get(index).is_ok()));
                    }
                });
            }
        });

        lock.read(PoolRole::Current, |pool| {
            assert!(pool.is_complete());
            assert!(pool.best().is_some());
        });
    }
}
