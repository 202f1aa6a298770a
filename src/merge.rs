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
//! Lazy ordered merge of several iterators, driven by a [`Depq`].
//!
//! Each non-exhausted source is one queue element: the source iterator is
//! the element's value and its pending head the priority. Yielding pops the
//! least head, advances that source and re-prioritises its element in
//! place, so a merge of `k` sources costs **O(log(k))** per yielded item.
//!
//! When the inputs are sorted the output is their sorted union, and it is
//! *stable*: equal items appear in the order the sources were given.

use crate::locator::Locator;
use crate::queue::Depq;

/// Merges the given sources into one ordered lazy iterator.
///
/// # Example
/// ```rust
/// let merged: Vec<i32> = depq::merge(vec![1..5, 2..2, 3..6]).collect();
/// assert_eq!(merged, vec![1, 2, 3, 3, 4, 4, 5]);
/// ```
pub fn merge<I>(sources: impl IntoIterator<Item = I>) -> Merge<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Ord,
{
    let mut pq = Depq::new();
    for source in sources {
        let mut iter = source.into_iter();
        if let Some(head) = iter.next() {
            pq.insert(iter, head);
        }
    }
    Merge { pq }
}

/// Iterator returned by [`merge`].
pub struct Merge<I: Iterator> {
    pq: Depq<I, I::Item>,
}

impl<I> Iterator for Merge<I>
where
    I: Iterator,
    I::Item: Ord,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let front: Locator<I, I::Item> = self.pq.peek_min_locator()?;
        let advanced = front.value_mut().next();
        match advanced {
            // the old priority is the head being yielded
            Some(head) => self.pq.change_priority(&front, head).ok(),
            None => {
                self.pq.remove(&front).ok()?;
                front.into_parts().map(|(_, head, _)| head).ok()
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (mut lower, mut upper): (usize, Option<usize>) = (0, Some(0));
        for (source, _) in self.pq.iter() {
            let (l, u) = source.size_hint();
            lower += l + 1;
            upper = match (upper, u) {
                (Some(a), Some(b)) => b.checked_add(1).and_then(|b| a.checked_add(b)),
                _ => None,
            };
        }
        (lower, upper)
    }
}
