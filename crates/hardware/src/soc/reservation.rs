//! LR/SC Reservation Sets.
//!
//! One slot per hart holding the word-aligned physical address of its outstanding
//! `LR.W`, or nothing. All slots sit behind a single mutex, which is what makes
//! `SC.W` and AMOs linearizable: the reservation check, the memory write, and the
//! invalidation of every matching reservation happen in one critical section.
//!
//! Lock order is always reservations first, then memory.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::common::PhysAddr;

/// Reservation table shared by all harts.
#[derive(Debug)]
pub struct ReservationSets {
    slots: Mutex<Vec<Option<PhysAddr>>>,
}

impl ReservationSets {
    /// Creates a table with one empty slot per hart.
    pub fn new(harts: usize) -> Self {
        Self {
            slots: Mutex::new(vec![None; harts]),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Option<PhysAddr>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invalidate_locked(slots: &mut [Option<PhysAddr>], addr: PhysAddr) {
        for slot in slots.iter_mut().filter(|s| **s == Some(addr)) {
            *slot = None;
        }
    }

    /// Installs a reservation for `hart`, replacing any previous one.
    pub fn reserve(&self, hart: usize, addr: PhysAddr) {
        self.lock()[hart] = Some(addr.word_aligned());
        trace!(hart, addr = %addr, "reservation installed");
    }

    /// Runs the load of `LR.W` and installs the reservation in one critical
    /// section, so no store can slip between the two.
    ///
    /// # Errors
    ///
    /// Propagates the error of `load`; no reservation is installed in that case.
    pub fn load_reserved<T, E>(
        &self,
        hart: usize,
        addr: PhysAddr,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        let mut slots = self.lock();
        let val = load()?;
        slots[hart] = Some(addr.word_aligned());
        trace!(hart, addr = %addr, "reservation installed");
        Ok(val)
    }

    /// Returns the reservation currently held by `hart`.
    pub fn reservation(&self, hart: usize) -> Option<PhysAddr> {
        self.lock()[hart]
    }

    /// Returns `true` if `hart` holds a reservation on the word containing `addr`.
    pub fn holds(&self, hart: usize, addr: PhysAddr) -> bool {
        self.lock()[hart] == Some(addr.word_aligned())
    }

    /// Drops the reservation of `hart`, if any.
    pub fn clear(&self, hart: usize) {
        self.lock()[hart] = None;
    }

    /// Invalidates every reservation on the word containing `addr`.
    ///
    /// Called for every store that reaches a data cache or memory.
    pub fn invalidate(&self, addr: PhysAddr) {
        Self::invalidate_locked(&mut self.lock(), addr.word_aligned());
    }

    /// Performs the check-and-store of `SC.W`.
    ///
    /// If `hart` holds a reservation on `addr`, runs `store` and invalidates every
    /// reservation on that word. The reservation of `hart` is cleared whether or not
    /// the store happens.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the store was performed, `Ok(false)` if the reservation was lost.
    ///
    /// # Errors
    ///
    /// Propagates the error of `store`. The reservation is still cleared.
    pub fn store_conditional<E>(
        &self,
        hart: usize,
        addr: PhysAddr,
        store: impl FnOnce() -> Result<(), E>,
    ) -> Result<bool, E> {
        let addr = addr.word_aligned();
        let mut slots = self.lock();
        let held = slots[hart] == Some(addr);
        slots[hart] = None;
        if !held {
            return Ok(false);
        }
        store()?;
        Self::invalidate_locked(&mut slots, addr);
        Ok(true)
    }

    /// Runs an AMO read-modify-write on `addr` inside the reservation lock and
    /// invalidates every reservation on that word once it succeeds.
    ///
    /// # Errors
    ///
    /// Propagates the error of `op`; reservations are left untouched in that case.
    pub fn read_modify_write<T, E>(
        &self,
        addr: PhysAddr,
        op: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        let mut slots = self.lock();
        let old = op()?;
        Self::invalidate_locked(&mut slots, addr.word_aligned());
        Ok(old)
    }
}
