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
//! The double-ended heap layout: an implicit interval heap.
//!
//! Consecutive slots `(2k, 2k+1)` form an *interval* whose low slot holds a
//! min-side element and whose high slot holds the paired max-side element.
//! Every interval is contained in its parent interval, so the root interval
//! `(0, 1)` brackets the whole queue: slot 0 is the minimum, slot 1 the
//! maximum. With an odd number of elements the last slot is a lone min-side
//! element bounded by its parent interval.
//!
//! Priorities drive the structure. Subpriorities order runs of equal
//! priorities, within a pair and along both side chains, so that both
//! ends extract stably. The priority-driven passes repair paired ordering
//! as they move; a dedicated restoration stage then settles the
//! subpriority ordering among equal-priority neighbours of every slot the
//! passes touched.
//!
//! All maintenance is bounded by an explicit `[start, end)` range so the
//! same repair routine serves incremental tail integration, bottom-up
//! rebuilds and in-place repairs after updates and removals.

use std::cmp::Ordering;

use super::binary::rebuild_wins;
use crate::compare::Compare;
use crate::queue::Depq;

/// Min-side parent of any slot `j >= 2`.
pub(crate) fn minparent(j: usize) -> usize {
    ((j - 2) / 2) & !1
}

/// Max-side parent of any slot `j >= 2`.
pub(crate) fn maxparent(j: usize) -> usize {
    ((j - 2) / 2) | 1
}

/// Min slot of the first child interval of the interval `i` belongs to.
/// The second child interval starts two slots later.
fn child1_min(i: usize) -> usize {
    (i & !1) * 2 + 2
}

impl<V, P, C> Depq<V, P, C>
where
    C: Compare<P>,
{
    /// Slot of the maximum element. Slot 1, except in a queue of one and
    /// except when the root priorities tie: the stably-first element at
    /// slot 0 is then both minimum and maximum.
    pub(crate) fn iv_max_index(&self) -> usize {
        if self.heapsize <= 1 || self.pcmp(0, 1) == Ordering::Equal {
            0
        } else {
            1
        }
    }

    /// Extends the interval layout over the whole store, choosing between a
    /// bottom-up rebuild and per-element integration of the new tail with
    /// the same cost rule as the single-ended layouts.
    pub(crate) fn heapify_interval(&mut self) {
        let n = self.entries.len();
        if rebuild_wins(n, self.heapsize) {
            self.heapsize = n;
            for i in (0..n).rev() {
                self.iv_adjust(i, i, n);
            }
        } else {
            for i in self.heapsize..n {
                self.iv_adjust(i, 0, i + 1);
            }
            self.heapsize = n;
        }
    }

    /// Repairs the layout around slot `i` within `[start, end)` after the
    /// entry there was replaced or had its priority rewritten, assuming
    /// everything else in the range is valid.
    ///
    /// The interval the slot belongs to is normalised first; then each
    /// affected side runs its up pass and, when that does not move, its
    /// down pass; finally every slot the passes touched goes through the
    /// subpriority restoration stage.
    pub(crate) fn iv_adjust(&mut self, i: usize, start: usize, end: usize) {
        if end <= start + 1 {
            return;
        }
        let lo = i & !1;
        let hi = lo | 1;
        let mut touched: Vec<usize> = Vec::new();
        if lo >= start {
            self.iv_fix_pair(lo, end, &mut touched);
            let (j, moved) = self.iv_upheap_min(lo, start, &mut touched);
            let j = if moved {
                j
            } else {
                self.iv_downheap_min(lo, end, &mut touched)
            };
            touched.push(j);
        }
        // a lone last slot has no max partner but can still outgrow its
        // max-side parent, so it may climb the max chain itself
        let max_slot = if hi < end { hi } else { lo };
        if max_slot >= start {
            let (j, moved) = self.iv_upheap_max(max_slot, start, &mut touched);
            let j = if moved {
                j
            } else if hi < end {
                self.iv_downheap_max(hi, end, &mut touched)
            } else {
                j
            };
            touched.push(j);
        }
        self.iv_restore_sub(touched, start, end);
    }

    /// Puts the smaller priority of an interval on its low slot. Ties are
    /// left to the restoration stage.
    fn iv_fix_pair(&mut self, lo: usize, end: usize, touched: &mut Vec<usize>) {
        let hi = lo + 1;
        if hi < end && self.pcmp(lo, hi) == Ordering::Greater {
            self.swap_entries(lo, hi);
            touched.push(lo);
            touched.push(hi);
        }
    }

    /// Climbs the min-side chain while the slot's priority is strictly
    /// below its min-side parent's, keeping each interval it moves through
    /// priority-ordered. Returns the final slot and whether any move
    /// happened.
    fn iv_upheap_min(
        &mut self,
        mut j: usize,
        start: usize,
        touched: &mut Vec<usize>,
    ) -> (usize, bool) {
        let mut moved = false;
        while j >= 2 {
            let up = minparent(j);
            if up < start || self.pcmp(j, up) != Ordering::Less {
                break;
            }
            self.swap_entries(j, up);
            touched.push(j);
            j = up;
            moved = true;
        }
        if moved {
            touched.push(j);
        }
        (j, moved)
    }

    /// Climbs the max-side chain while the slot's priority is strictly
    /// above its max-side parent's. Also used from a lone last slot, which
    /// enters the chain through its max-side parent.
    fn iv_upheap_max(
        &mut self,
        mut j: usize,
        start: usize,
        touched: &mut Vec<usize>,
    ) -> (usize, bool) {
        let mut moved = false;
        while j >= 2 {
            let up = maxparent(j);
            if up < start || self.pcmp(j, up) != Ordering::Greater {
                break;
            }
            self.swap_entries(j, up);
            touched.push(j);
            j = up;
            moved = true;
        }
        if moved {
            touched.push(j);
        }
        (j, moved)
    }

    /// Descends the min side: while some child interval's min slot beats
    /// the current one, swap with the best such child (ties broken toward
    /// the smaller subpriority) and re-normalise the entered interval.
    fn iv_downheap_min(&mut self, mut j: usize, end: usize, touched: &mut Vec<usize>) -> usize {
        loop {
            let c1 = child1_min(j);
            if c1 >= end {
                break;
            }
            let c2 = c1 + 2;
            let best = if c2 < end && self.cmp_min_side(c2, c1) == Ordering::Less {
                c2
            } else {
                c1
            };
            if self.pcmp(best, j) != Ordering::Less {
                break;
            }
            self.swap_entries(j, best);
            touched.push(j);
            j = best;
            self.iv_fix_pair(j, end, touched);
        }
        j
    }

    /// Descends the max side. A lone min slot at the very end acts as the
    /// max side of its own interval and is a valid descent target.
    fn iv_downheap_max(&mut self, mut j: usize, end: usize, touched: &mut Vec<usize>) -> usize {
        loop {
            let base = child1_min(j);
            let c1 = Self::max_slot_of(base, end);
            let c2 = Self::max_slot_of(base + 2, end);
            let best = match (c1, c2) {
                (None, _) => break,
                (Some(a), None) => a,
                (Some(a), Some(b)) => {
                    if self.cmp_max_side(b, a) == Ordering::Less {
                        b
                    } else {
                        a
                    }
                }
            };
            if self.pcmp(best, j) != Ordering::Greater {
                break;
            }
            self.swap_entries(j, best);
            touched.push(j);
            j = best;
            self.iv_fix_pair(j & !1, end, touched);
        }
        j
    }

    /// The slot acting as max side of the interval starting at `lo`, if the
    /// interval exists within `end`.
    fn max_slot_of(lo: usize, end: usize) -> Option<usize> {
        if lo + 1 < end {
            Some(lo + 1)
        } else if lo < end {
            Some(lo)
        } else {
            None
        }
    }

    /// Restores the subpriority ordering among equal-priority neighbours:
    /// within a pair the smaller subpriority sits on the min side; along
    /// either side chain the smaller subpriority is the ancestor; and a
    /// min slot never undercuts an equal-priority max-side parent. That
    /// last rule is what keeps the stably-first element of a run of equal
    /// maxima reachable from the max root even when pairing parks it on a
    /// min slot.
    ///
    /// Runs a small worklist seeded with every slot the priority passes
    /// touched: one exchange can expose an inversion on a neighbouring
    /// chain, so each swap re-enqueues both slots involved. Every swap
    /// either moves a smaller subpriority strictly rootward or orders one
    /// interval, so the stage settles; with no equal priorities in play it
    /// checks the seeds and stops.
    fn iv_restore_sub(&mut self, seeds: Vec<usize>, start: usize, end: usize) {
        let mut work = seeds;
        while let Some(j) = work.pop() {
            if j < start || j >= end {
                continue;
            }
            // pair rule
            let lo = j & !1;
            let hi = lo + 1;
            if lo >= start
                && hi < end
                && self.pcmp(lo, hi) == Ordering::Equal
                && self.sub_at(lo) > self.sub_at(hi)
            {
                self.swap_entries(lo, hi);
                work.push(lo);
                work.push(hi);
            }
            // upward: an equal-priority ancestor must carry the smaller
            // subpriority. A min slot is bounded by both of its parents, a
            // max slot by its max-side parent only.
            if j >= 2 {
                let mut swapped = false;
                let ups = if j % 2 == 0 {
                    [Some(minparent(j)), Some(maxparent(j))]
                } else {
                    [Some(maxparent(j)), None]
                };
                for up in ups.iter().flatten().copied() {
                    if up >= start
                        && self.pcmp(j, up) == Ordering::Equal
                        && self.sub_at(j) < self.sub_at(up)
                    {
                        self.swap_entries(j, up);
                        work.push(j);
                        work.push(up);
                        swapped = true;
                        break;
                    }
                }
                if swapped {
                    continue;
                }
            }
            // downward: pull up the smallest equal-priority subpriority
            // this slot governs. A min slot governs the child min sides; a
            // max slot governs every slot of its child intervals.
            let base = child1_min(j);
            let candidates = if j % 2 == 0 {
                [Some(base), Some(base + 2), None, None]
            } else {
                [Some(base), Some(base + 1), Some(base + 2), Some(base + 3)]
            };
            let mut best: Option<usize> = None;
            for c in candidates.iter().flatten().copied() {
                if c < end && self.pcmp(c, j) == Ordering::Equal {
                    let better = match best {
                        None => true,
                        Some(b) => self.sub_at(c) < self.sub_at(b),
                    };
                    if better {
                        best = Some(c);
                    }
                }
            }
            if let Some(c) = best {
                if self.sub_at(c) < self.sub_at(j) {
                    self.swap_entries(j, c);
                    work.push(j);
                    work.push(c);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Depq;

    #[test]
    fn equal_priorities_drain_stably_from_both_ends() {
        let mut pq = Depq::new();
        for i in 0..12 {
            pq.insert(i, 7);
        }
        // force the interval layout
        pq.peek_min_max().unwrap();
        pq.assert_valid();
        let mut from_min = Vec::new();
        let mut from_max = Vec::new();
        while let Some((min, max)) = pq.peek_min_max() {
            assert_eq!(min, max, "all priorities tie, both ends share a root");
            from_min.push(*pq.pop_min().unwrap().value());
            pq.assert_valid();
            if let Some(loc) = pq.pop_max() {
                from_max.push(*loc.value());
                pq.assert_valid();
            }
        }
        assert_eq!(from_min, vec![0, 2, 4, 6, 8, 10]);
        assert_eq!(from_max, vec![1, 3, 5, 7, 9, 11]);
    }

    #[test]
    fn interval_layout_survives_mixed_duplicates() {
        use rand::prelude::*;

        let mut rng = StdRng::seed_from_u64(0x1417e6);
        for _ in 0..30 {
            let n = rng.gen_range(1..80);
            let mut pq = Depq::new();
            let mut model = Vec::new();
            for k in 0..n {
                let p = rng.gen_range(0..6);
                pq.insert(k, p);
                model.push((p, k));
            }
            assert!(pq.peek_min_max().is_some());
            pq.assert_valid();
            // drain from the max end: descending priority, insertion order
            // within each duplicate run
            let mut by_prio = model.clone();
            by_prio.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            let expected: Vec<i32> = by_prio.iter().map(|&(_, k)| k).collect();
            let mut got = Vec::new();
            while let Some(loc) = pq.pop_max() {
                pq.assert_valid();
                got.push(*loc.value());
            }
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn updates_amid_duplicates_stay_stable() {
        use rand::prelude::*;

        let mut rng = StdRng::seed_from_u64(0x0dd1e5);
        for _ in 0..20 {
            let mut pq = Depq::new();
            let mut locs = Vec::new();
            for k in 0..40 {
                locs.push(pq.insert(k, rng.gen_range(0..4)));
            }
            assert!(pq.peek_min_max().is_some());
            pq.assert_valid();
            for _ in 0..60 {
                let loc = &locs[rng.gen_range(0..locs.len())];
                if loc.is_in_queue() {
                    pq.change_priority(loc, rng.gen_range(0..4)).unwrap();
                    pq.assert_valid();
                }
            }
            // stability across the surviving elements: max-end drain visits
            // equal priorities in subpriority order
            let mut last: Option<(i32, u64)> = None;
            while let Some(loc) = pq.pop_max() {
                pq.assert_valid();
                let key = (*loc.priority(), loc.subpriority().unwrap());
                if let Some((lp, ls)) = last {
                    assert!(key.0 < lp || (key.0 == lp && key.1 > ls));
                }
                last = Some(key);
            }
        }
    }

    #[test]
    fn removals_in_the_middle_keep_the_layout() {
        use rand::prelude::*;

        let mut rng = StdRng::seed_from_u64(0xca11ab1e);
        let mut pq = Depq::new();
        let mut locs = Vec::new();
        for i in 0..64 {
            locs.push(pq.insert(i, rng.gen_range(0..16)));
        }
        assert!(pq.peek_min_max().is_some());
        pq.assert_valid();
        locs.shuffle(&mut rng);
        for loc in &locs {
            pq.remove(loc).unwrap();
            pq.assert_valid();
        }
        assert!(pq.is_empty());
    }
}
