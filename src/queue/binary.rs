/*
 *  Copyright 2017, 2022 Gianmarco Garrisi
 *
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU Lesser General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version, or (at your opinion) under the terms
 *  of the Mozilla Public License version 2.0.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU Lesser General Public License for more details.
 *
 *  You should have received a copy of the GNU Lesser General Public License
 *  along with this program.  If not, see <http://www.gnu.org/licenses/>.
 *
 */
//! Single-ended heap layouts: one implicit binary heap implementation that
//! serves both the min and the max discipline.
//!
//! The two disciplines differ only in the root-ward ordering of two slots:
//! `(priority, subpriority)` lexicographic for the min side,
//! `(priority reversed, subpriority)` for the max side. With the
//! subpriority direction kept the same on both, a run of equal priorities
//! drains in insertion order from either end.

use std::cmp::Ordering;
use std::mem::size_of;

use crate::compare::Compare;
use crate::queue::Depq;

/// Which end of the ordering the heap keeps at its root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Sense {
    Min,
    Max,
}

/// Compute the index of the parent element in the heap from its index
fn parent(i: usize) -> usize {
    (i - 1) / 2
}
/// Compute the index of the left child of an item from its index
fn left(i: usize) -> usize {
    (i * 2) + 1
}

fn log2_fast(x: usize) -> usize {
    8 * size_of::<usize>() - (x.leading_zeros() as usize) - 1
}

/// Decides between rebuilding the heap bottom-up and sifting each new tail
/// element up, by comparing worst-case move counts: a rebuild moves at most
/// `n - 1` entries, incremental integration about `(log2(n+1) - 1)` per new
/// entry. Shared by all three disciplines.
pub(crate) fn rebuild_wins(n: usize, heapsize: usize) -> bool {
    if n == 0 {
        return false;
    }
    n - 1 < (log2_fast(n + 1) - 1) * (n - heapsize + 1)
}

impl<V, P, C> Depq<V, P, C>
where
    C: Compare<P>,
{
    /// Root-ward comparison of two slots under `sense`: `Less` means slot
    /// `i` belongs closer to the root than slot `j`.
    fn heap_cmp(&self, sense: Sense, i: usize, j: usize) -> Ordering {
        match sense {
            Sense::Min => self.cmp_min_side(i, j),
            Sense::Max => self.cmp_max_side(i, j),
        }
    }

    /// Moves the entry at `i` toward the root until its parent ranks at
    /// least as root-ward. Returns the final position.
    pub(crate) fn sift_up(&mut self, sense: Sense, mut i: usize) -> usize {
        while i > 0 {
            let up = parent(i);
            if self.heap_cmp(sense, i, up) == Ordering::Less {
                self.swap_entries(i, up);
                i = up;
            } else {
                break;
            }
        }
        i
    }

    /// Moves the entry at `i` away from the root, always toward the more
    /// root-ward child, while a child outranks it. Returns the final
    /// position.
    pub(crate) fn sift_down(&mut self, sense: Sense, mut i: usize) -> usize {
        let end = self.heapsize;
        loop {
            let mut child = left(i);
            if child >= end {
                break;
            }
            let right = child + 1;
            if right < end && self.heap_cmp(sense, right, child) == Ordering::Less {
                child = right;
            }
            if self.heap_cmp(sense, child, i) == Ordering::Less {
                self.swap_entries(i, child);
                i = child;
            } else {
                break;
            }
        }
        i
    }

    /// Repairs the heap around slot `i` after its entry was replaced or its
    /// priority rewritten: one of the two directions applies, the other is
    /// a no-op.
    pub(crate) fn sift(&mut self, sense: Sense, i: usize) {
        if self.sift_up(sense, i) == i {
            self.sift_down(sense, i);
        }
    }

    /// Extends the heapified prefix over the whole store, choosing the
    /// cheaper of a bottom-up rebuild and per-element sift-up integration.
    pub(crate) fn heapify_binary(&mut self, sense: Sense) {
        let n = self.entries.len();
        if rebuild_wins(n, self.heapsize) {
            self.heapsize = n;
            if n > 1 {
                for i in (0..=parent(n - 1)).rev() {
                    self.sift_down(sense, i);
                }
            }
        } else {
            for i in self.heapsize..n {
                self.sift_up(sense, i);
            }
            self.heapsize = n;
        }
    }
}
