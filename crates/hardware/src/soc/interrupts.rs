//! Inter-Processor Interrupt Matrix.
//!
//! An `(N+1)×(N+1)` grid of atomic 32-bit cells addressed `[to][from]`. A non-zero
//! cell is a pending interrupt code sent by `from` to `to`. Index `N` is the system:
//! row `N` collects interrupts addressed to the host and column `N` carries
//! system-to-hart interrupts. The diagonal `[h][h]` is the response mailbox of
//! requester `h`.
//!
//! The matrix only moves codes. The request/response protocol built on top of it
//! lives on the hart (`core::hart::interrupts`).

use std::sync::atomic::{AtomicU32, Ordering};

/// Shared interrupt grid.
#[derive(Debug)]
pub struct InterruptMatrix {
    harts: usize,
    cells: Box<[AtomicU32]>,
}

impl InterruptMatrix {
    /// Creates an empty grid for `harts` harts plus the system.
    pub fn new(harts: usize) -> Self {
        let dim = harts + 1;
        Self {
            harts,
            cells: (0..dim * dim).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Number of harts (the system index).
    pub const fn harts(&self) -> usize {
        self.harts
    }

    /// Index of the system row and column.
    pub const fn system(&self) -> usize {
        self.harts
    }

    #[inline]
    fn cell(&self, to: usize, from: usize) -> &AtomicU32 {
        assert!(
            to <= self.harts && from <= self.harts,
            "interrupt matrix index [{to}][{from}] outside {0}x{0} grid",
            self.harts + 1
        );
        &self.cells[to * (self.harts + 1) + from]
    }

    /// Tries to post `code` from `from` to `to`.
    ///
    /// # Returns
    ///
    /// `true` if the cell was empty and now holds `code`; `false` if an earlier
    /// interrupt from `from` is still pending at `to`.
    ///
    /// # Panics
    ///
    /// On a zero code, a self-addressed interrupt, or an out-of-range target.
    pub fn try_raise(&self, to: usize, from: usize, code: u32) -> bool {
        assert!(code != 0, "interrupt code 0 is reserved for an empty cell");
        assert!(to != from, "hart {from} cannot interrupt itself");
        assert!(to < self.harts, "interrupt target {to} is not a hart");
        self.cell(to, from)
            .compare_exchange(0, code, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Posts `code` from the system to hart `to`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`try_raise`](Self::try_raise).
    pub fn raise_from_system(&self, to: usize, code: u32) -> bool {
        self.try_raise(to, self.harts, code)
    }

    /// Reads the pending code in `[to][from]` without consuming it.
    pub fn peek(&self, to: usize, from: usize) -> u32 {
        self.cell(to, from).load(Ordering::Acquire)
    }

    /// Consumes the pending code in `[to][from]`, leaving the cell empty.
    pub fn take(&self, to: usize, from: usize) -> u32 {
        self.cell(to, from).swap(0, Ordering::AcqRel)
    }

    /// Writes a response into the mailbox of requester `to`.
    pub fn respond(&self, to: usize, code: u32) {
        self.cell(to, to).store(code, Ordering::Release);
    }

    /// Consumes the response waiting in the mailbox of `hart`, or 0 if none.
    pub fn take_response(&self, hart: usize) -> u32 {
        self.take(hart, hart)
    }
}
