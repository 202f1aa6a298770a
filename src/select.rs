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
//! Selection of the n largest or smallest items of an iterator, using a
//! [`Depq`] of bounded size as the workspace.
//!
//! The workspace normally holds the best `n` candidates seen so far; to
//! avoid popping on every admission it is allowed to grow up to
//! `max(1024, ceil(n * ln(1 + n)))` entries before it is pruned back.

use std::cmp::Ordering;

use crate::compare::{Compare, NaturalOrder};
use crate::queue::Depq;

/// Returns the `n` largest items of `iter`, in ascending order.
///
/// # Example
/// ```rust
/// assert_eq!(depq::n_largest(3, vec![4, 1, 7, 2, 9, 3]), vec![4, 7, 9]);
/// ```
pub fn n_largest<T, I>(n: usize, iter: I) -> Vec<T>
where
    T: Ord,
    I: IntoIterator<Item = T>,
{
    select(n, iter.into_iter().map(keyless), NaturalOrder, true)
        .map(|((), priority)| priority)
        .collect()
}

/// Returns the `n` smallest items of `iter`, in ascending order.
pub fn n_smallest<T, I>(n: usize, iter: I) -> Vec<T>
where
    T: Ord,
    I: IntoIterator<Item = T>,
{
    select(n, iter.into_iter().map(keyless), NaturalOrder, false)
        .map(|((), priority)| priority)
        .collect()
}

/// Returns the `n` largest items of `iter` under the given three-way
/// comparison, in ascending order.
pub fn n_largest_by<T, I, F>(n: usize, iter: I, cmp: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T, &T) -> Ordering,
{
    select(n, iter.into_iter().map(keyless), cmp, true)
        .map(|((), priority)| priority)
        .collect()
}

/// Returns the `n` smallest items of `iter` under the given three-way
/// comparison, in ascending order.
pub fn n_smallest_by<T, I, F>(n: usize, iter: I, cmp: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T, &T) -> Ordering,
{
    select(n, iter.into_iter().map(keyless), cmp, false)
        .map(|((), priority)| priority)
        .collect()
}

/// Returns the `n` items of `iter` with the largest keys, ascending by key.
/// The key is computed once per item.
pub fn n_largest_by_key<T, K, I, F>(n: usize, iter: I, key: F) -> Vec<T>
where
    K: Ord,
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> K,
{
    select(n, iter.into_iter().map(|v| keyed(v, &key)), NaturalOrder, true)
        .map(|(value, _)| value)
        .collect()
}

/// Returns the `n` items of `iter` with the smallest keys, ascending by key.
pub fn n_smallest_by_key<T, K, I, F>(n: usize, iter: I, key: F) -> Vec<T>
where
    K: Ord,
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> K,
{
    select(
        n,
        iter.into_iter().map(|v| keyed(v, &key)),
        NaturalOrder,
        false,
    )
    .map(|(value, _)| value)
    .collect()
}

fn keyless<T>(value: T) -> ((), T) {
    ((), value)
}

fn keyed<T, K, F: Fn(&T) -> K>(value: T, key: &F) -> (T, K) {
    let k = key(&value);
    (value, k)
}

fn workspace_limit(n: usize) -> usize {
    let grown = ((n as f64) * ((n + 1) as f64).ln()).ceil() as usize;
    grown.max(1024)
}

/// Core of the selection: feeds `(value, priority)` couples through a
/// bounded queue, keeping the `n` best toward the chosen end, and drains
/// the survivors in ascending priority order.
fn select<V, P, C, I>(n: usize, items: I, cmp: C, largest: bool) -> std::vec::IntoIter<(V, P)>
where
    C: Compare<P>,
    I: Iterator<Item = (V, P)>,
{
    if n == 0 {
        return Vec::new().into_iter();
    }
    let mut pq = Depq::with_comparator(cmp);
    let limit = workspace_limit(n);
    for (value, priority) in items {
        if pq.len() < n {
            pq.insert(value, priority);
            continue;
        }
        let admit = {
            let cutoff = if largest {
                pq.peek_min_locator()
            } else {
                pq.peek_max_locator()
            };
            match cutoff {
                Some(locator) => {
                    let edge = locator.priority();
                    let ord = pq.compare_priority(&priority, &edge);
                    if largest {
                        ord == Ordering::Greater
                    } else {
                        ord == Ordering::Less
                    }
                }
                None => true,
            }
        };
        if admit {
            pq.insert(value, priority);
            if pq.len() > limit {
                while pq.len() > n {
                    let _ = if largest { pq.pop_min() } else { pq.pop_max() };
                }
            }
        }
    }
    while pq.len() > n {
        let _ = if largest { pq.pop_min() } else { pq.pop_max() };
    }
    let mut out = Vec::with_capacity(pq.len());
    if largest {
        while let Some(locator) = pq.pop_min() {
            if let Ok((value, priority, _)) = locator.into_parts() {
                out.push((value, priority));
            }
        }
    } else {
        while let Some(locator) = pq.pop_max() {
            if let Ok((value, priority, _)) = locator.into_parts() {
                out.push((value, priority));
            }
        }
        out.reverse();
    }
    out.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n_largest_matches_sorted_tail() {
        let data = vec![4, 1, 7, 2, 9, 3, 9, 0];
        let mut sorted = data.clone();
        sorted.sort();
        for k in 0..=data.len() + 2 {
            let expected: Vec<i32> = sorted
                .iter()
                .skip(sorted.len().saturating_sub(k))
                .cloned()
                .collect();
            assert_eq!(n_largest(k, data.clone()), expected, "k = {}", k);
        }
    }

    #[test]
    fn n_smallest_matches_sorted_head() {
        let data = vec![4, 1, 7, 2, 9, 3, 9, 0];
        let mut sorted = data.clone();
        sorted.sort();
        for k in 0..=data.len() + 2 {
            let expected: Vec<i32> = sorted.iter().take(k).cloned().collect();
            assert_eq!(n_smallest(k, data.clone()), expected, "k = {}", k);
        }
    }

    #[test]
    fn by_key_keeps_whole_items() {
        let words = vec!["pear", "fig", "banana", "kiwi", "apple"];
        assert_eq!(
            n_largest_by_key(2, words.clone(), |w| w.len()),
            vec!["apple", "banana"]
        );
        assert_eq!(
            n_smallest_by_key(2, words, |w| w.len()),
            vec!["fig", "pear"]
        );
    }

    #[test]
    fn by_comparator_reverses() {
        let data = vec![5, 3, 8, 1];
        assert_eq!(n_largest_by(2, data, |a: &i32, b: &i32| b.cmp(a)), vec![3, 1]);
    }

    #[test]
    fn random_selection_agrees_with_sorting() {
        use rand::prelude::*;

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let len = rng.gen_range(0..300);
            let data: Vec<i32> = (0..len).map(|_| rng.gen_range(-50..50)).collect();
            let k = rng.gen_range(0..20);
            let mut sorted = data.clone();
            sorted.sort();
            let tail: Vec<i32> = sorted
                .iter()
                .skip(sorted.len().saturating_sub(k))
                .cloned()
                .collect();
            let head: Vec<i32> = sorted.iter().take(k).cloned().collect();
            assert_eq!(n_largest(k, data.clone()), tail);
            assert_eq!(n_smallest(k, data), head);
        }
    }
}
