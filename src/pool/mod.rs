//! # Pool
//!
//! The `Pool` is the population of one generation: a fixed number of candidate
//! slots plus the index of the best feasible candidate, maintained
//! incrementally as candidates are stored.
//!
//! Concurrent access to pools goes through a [`PoolLock`], which owns the
//! `current` and `next` pools of a run.
//!
//! ## Example
//!
//! ```rust
//! use diffevo::candidate::Candidate;
//! use diffevo::pool::Pool;
//! use diffevo::rng::RandomNumberGenerator;
//!
//! let mut pool = Pool::new(4);
//! for index in 0..4 {
//!     pool.set(index, Candidate::feasible(vec![index as f64], index as f64)).unwrap();
//! }
//!
//! assert_eq!(pool.best_index(), Some(0));
//!
//! let mut rng = RandomNumberGenerator::from_seed(1);
//! let picked = pool.select(&mut rng, 2, &[0]).unwrap();
//! assert_eq!(picked.len(), 2);
//! ```

pub mod lock;

use crate::candidate::Candidate;
use crate::error::{EvolutionError, Result};
use crate::rng::RandomSource;

pub use lock::{NoOpPoolLock, PoolLock, PoolRole, ReadWritePoolLock};

/// A fixed-capacity population of candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    slots: Vec<Option<Candidate>>,
    best_index: Option<usize>,
}

impl Pool {
    /// Creates an empty pool with `size` slots.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
            best_index: None,
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Returns the candidate stored at `index`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `index` is outside the pool and `EmptySlot`
    /// if nothing has been stored there yet.
    pub fn get(&self, index: usize) -> Result<&Candidate> {
        match self.slots.get(index) {
            Some(Some(candidate)) => Ok(candidate),
            Some(None) => Err(EvolutionError::EmptySlot(index)),
            None => Err(EvolutionError::InvalidArgument(format!(
                "Index {} is outside a pool of size {}",
                index,
                self.size()
            ))),
        }
    }

    /// Stores `candidate` at `index` and updates the best index.
    ///
    /// A feasible candidate becomes the best only when it is strictly better than
    /// the current best, so the first of several equal candidates keeps the
    /// title. When the best slot itself is overwritten by something that is not
    /// strictly better, the best index is recomputed from the whole pool.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `index` is outside the pool; the pool is
    /// left unchanged.
    pub fn set(&mut self, index: usize, candidate: Candidate) -> Result<()> {
        if index >= self.size() {
            return Err(EvolutionError::InvalidArgument(format!(
                "Index {} is outside a pool of size {}",
                index,
                self.size()
            )));
        }

        let improves = candidate.is_feasible()
            && match self.best() {
                Some(best) => candidate.fitness() < best.fitness(),
                None => true,
            };

        self.slots[index] = Some(candidate);

        if improves {
            self.best_index = Some(index);
        } else if self.best_index == Some(index) {
            self.best_index = self.scan_best();
        }
        Ok(())
    }

    /// The index of the best feasible candidate, if any feasible candidate is stored.
    pub fn best_index(&self) -> Option<usize> {
        self.best_index
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best_index
            .and_then(|index| self.slots.get(index))
            .and_then(Option::as_ref)
    }

    /// Returns `true` once every slot holds a candidate.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Iterates over the stored candidates in slot order, skipping empty slots.
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.slots.iter().flatten()
    }

    /// Draws `count` distinct slot indices uniformly at random, never returning
    /// an index listed in `exclude`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `count + exclude.len()` exceeds the pool size.
    pub fn select_indices(
        &self,
        rng: &mut dyn RandomSource,
        count: usize,
        exclude: &[usize],
    ) -> Result<Vec<usize>> {
        let size = self.size();
        if count + exclude.len() > size {
            return Err(EvolutionError::InvalidArgument(format!(
                "Cannot select {} candidates excluding {} from a pool of size {}",
                count,
                exclude.len(),
                size
            )));
        }

        let mut selected = Vec::with_capacity(count);
        while selected.len() < count {
            let index = rng.next_int(size);
            if !selected.contains(&index) && !exclude.contains(&index) {
                selected.push(index);
            }
        }

        Ok(selected)
    }

    /// Draws `count` distinct candidates, see [`Pool::select_indices`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if too many candidates are requested and
    /// `EmptySlot` if a drawn slot has not been filled.
    pub fn select(
        &self,
        rng: &mut dyn RandomSource,
        count: usize,
        exclude: &[usize],
    ) -> Result<Vec<&Candidate>> {
        self.select_indices(rng, count, exclude)?
            .into_iter()
            .map(|index| self.get(index))
            .collect()
    }

    fn scan_best(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(candidate) = slot.as_ref().filter(|c| c.is_feasible()) {
                if best.map_or(true, |(_, fitness)| candidate.fitness() < fitness) {
                    best = Some((index, candidate.fitness()));
                }
            }
        }
        best.map(|(index, _)| index)
    }
}
