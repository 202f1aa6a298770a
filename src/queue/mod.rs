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
//! This module contains the [`Depq`] type and the related iterators.
//!
//! See the type level documentation for more details and examples.

pub(crate) mod binary;
pub(crate) mod interval;
pub mod iterators;

use std::cell::Ref;
use std::cmp::Ordering;
use std::fmt;
use std::iter::{Extend, FromIterator, IntoIterator};
use std::rc::Rc;

use crate::compare::{Compare, NaturalOrder};
use crate::error::Error;
use crate::locator::{Attachment, Locator, QueueToken};
use iterators::{IntoIter, IntoSortedIter, Iter, Locators};

/// The heap discipline currently imposed on the prefix `[0, heapsize)` of
/// the backing store. The queue starts with no discipline at all and picks
/// one lazily, on the first query that needs an extremum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Unordered,
    Min,
    Max,
    Interval,
}

/// A stable double-ended priority queue with locator handles.
///
/// The priority is of type `P`; by default it is compared with its
/// [`Ord`] instance, but any three-way comparator can be supplied through
/// [`with_comparator`](Depq::with_comparator).
///
/// Every element carries, besides its value and priority, a *subpriority*:
/// an integer that breaks ties between equal priorities. When not given
/// explicitly it is the element's insertion ordinal, which makes extraction
/// *stable*: equal elements leave in insertion order, from both the min
/// and the max end.
///
/// Implemented as a single array of entries over which one of three heap
/// layouts is maintained, depending on the queries actually performed:
/// a min-heap, a max-heap, or an interval heap once both ends are in use.
/// Insertions go to an unordered tail in **O(1)** and the layout is
/// restored lazily at the next query.
///
/// Every insertion returns a [`Locator`]: a handle that follows the element
/// through every internal move and allows changing its priority or removing
/// it in **O(log(N))** time.
///
/// # Example
/// ```rust
/// use depq::Depq;
///
/// let mut pq = Depq::new();
///
/// assert!(pq.is_empty());
/// pq.insert("Apples", 5);
/// let bananas = pq.insert("Bananas", 8);
/// pq.insert("Strawberries", 23);
///
/// assert_eq!(pq.peek_max().map(|(v, _)| *v), Some("Strawberries"));
/// assert_eq!(pq.peek_min().map(|(v, _)| *v), Some("Apples"));
///
/// pq.change_priority(&bananas, 25).unwrap();
/// assert_eq!(pq.peek_max().map(|(v, _)| *v), Some("Bananas"));
/// ```
pub struct Depq<V, P, C = NaturalOrder> {
    pub(crate) entries: Vec<Locator<V, P>>,
    cmp: C,
    mode: Mode,
    heapsize: usize,
    totalcount: u64,
    token: Rc<QueueToken>,
}

impl<V, P> Depq<V, P> {
    /// Creates an empty `Depq` ordering priorities by their `Ord` instance.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty `Depq` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, NaturalOrder)
    }
}

impl<V, P, C> Depq<V, P, C> {
    /// Creates an empty `Depq` with the specified comparator.
    ///
    /// The comparator can be any `Fn(&P, &P) -> Ordering` closure, or a
    /// custom [`Compare`] implementation.
    ///
    /// # Example
    /// ```rust
    /// use depq::Depq;
    ///
    /// // a queue that orders floats by their absolute value
    /// let mut pq = Depq::with_comparator(|a: &f64, b: &f64| {
    ///     a.abs().partial_cmp(&b.abs()).unwrap()
    /// });
    /// pq.insert("small", -0.5);
    /// pq.insert("large", 3.0);
    /// assert_eq!(pq.peek_min().map(|(v, _)| *v), Some("small"));
    /// ```
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_capacity_and_comparator(0, cmp)
    }

    /// Creates an empty `Depq` with the specified capacity and comparator.
    ///
    /// The backing store will be able to hold at least `capacity` elements
    /// without reallocating. If `capacity` is 0, it will not allocate.
    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        Depq {
            entries: Vec::with_capacity(capacity),
            cmp,
            mode: Mode::Unordered,
            heapsize: 0,
            totalcount: 0,
            token: Rc::new(QueueToken),
        }
    }

    /// Returns the number of elements in the queue.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the queue contains no elements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of insertions performed over the whole lifetime
    /// of the queue.
    ///
    /// The count never decreases: removals and [`clear`](Depq::clear) do
    /// not affect it. It is the source of the default subpriorities, and
    /// with them of the stability guarantee.
    pub fn total_count(&self) -> u64 {
        self.totalcount
    }

    /// Returns the number of elements the backing store can hold without
    /// reallocating.
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity overflows `usize`.
    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    /// Shrinks the capacity of the backing store as much as possible.
    pub fn shrink_to_fit(&mut self) {
        self.entries.shrink_to_fit();
    }

    /// Returns true if `locator` is attached to this queue.
    pub fn contains(&self, locator: &Locator<V, P>) -> bool {
        self.position_of(locator).is_ok()
    }

    /// Returns an iterator in arbitrary order over the
    /// (value, priority) couples in the queue.
    pub fn iter(&self) -> Iter<'_, V, P> {
        Iter::new(&self.entries)
    }

    /// Returns an iterator in arbitrary order over the locators of the
    /// queued elements. The handles stay attached.
    pub fn locators(&self) -> Locators<'_, V, P> {
        Locators::new(&self.entries)
    }

    /// Removes every element from the queue.
    ///
    /// Each locator detaches and keeps the value, priority and subpriority
    /// its element had. The insertion count is preserved.
    pub fn clear(&mut self) {
        for locator in self.entries.drain(..) {
            locator.detach();
        }
        self.mode = Mode::Unordered;
        self.heapsize = 0;
    }

    /*                          internal plumbing                         */

    /// Looks `locator` up in this queue, verifying both directions of the
    /// binding before anything is mutated.
    fn position_of(&self, locator: &Locator<V, P>) -> Result<usize, Error> {
        if !locator.is_in_queue() {
            return Err(Error::NotAttached);
        }
        let index = locator.index_in(&self.token).ok_or(Error::WrongLocator)?;
        match self.entries.get(index) {
            Some(entry) if entry == locator => Ok(index),
            _ => Err(Error::WrongLocator),
        }
    }

    /// Appends `locator` to the unordered tail. O(1); the heap discipline
    /// is restored lazily by the next extremum query.
    fn attach_tail(&mut self, locator: &Locator<V, P>) {
        let index = self.entries.len();
        locator.attach(Rc::clone(&self.token), index, self.totalcount);
        self.entries.push(locator.clone());
        self.totalcount += 1;
    }

    /// Swaps two slots of the backing store, rewriting the index stored in
    /// both moved locators.
    pub(crate) fn swap_entries(&mut self, i: usize, j: usize) {
        self.entries.swap(i, j);
        self.entries[i].set_index(i);
        self.entries[j].set_index(j);
    }

    pub(crate) fn sub_at(&self, i: usize) -> Option<u64> {
        self.entries[i].borrow_inner().subpriority
    }
}

impl<V, P, C> Depq<V, P, C>
where
    C: Compare<P>,
{
    /// Compares two priorities with this queue's comparator.
    pub fn compare_priority(&self, a: &P, b: &P) -> Ordering {
        self.cmp.compare(a, b)
    }

    /// Insert the value into the queue with the given priority.
    ///
    /// Returns the locator of the new element. The element's subpriority is
    /// its insertion ordinal, so that equal priorities are extracted in
    /// insertion order.
    ///
    /// Computes in **O(1)** time: the element goes to the unordered tail
    /// and the heap layout is restored at the next query.
    pub fn insert(&mut self, value: V, priority: P) -> Locator<V, P> {
        let locator = Locator::with_state(value, priority, None, None);
        self.attach_tail(&locator);
        locator
    }

    /// Insert the value with an explicit subpriority instead of the
    /// insertion ordinal.
    pub fn insert_with_subpriority(
        &mut self,
        value: V,
        priority: P,
        subpriority: u64,
    ) -> Locator<V, P> {
        let locator = Locator::with_state(value, priority, Some(subpriority), None);
        self.attach_tail(&locator);
        locator
    }

    /// Attaches a detached locator to this queue.
    ///
    /// A locator that already carries a subpriority keeps it; otherwise the
    /// insertion ordinal is assigned, like for [`insert`](Depq::insert).
    ///
    /// Fails with [`Error::AlreadyAttached`] if the locator is in a queue,
    /// this one included. Nothing is mutated on failure.
    pub fn insert_locator(&mut self, locator: &Locator<V, P>) -> Result<(), Error> {
        if locator.is_in_queue() {
            return Err(Error::AlreadyAttached);
        }
        self.attach_tail(locator);
        Ok(())
    }

    /// Returns the couple (value, priority) with the lowest priority in the
    /// queue, or None if it is empty.
    ///
    /// May reshape the internal heap layout, which is why it takes `&mut
    /// self`; once the layout matches the query pattern this is **O(1)**.
    pub fn peek_min(&mut self) -> Option<(Ref<'_, V>, Ref<'_, P>)> {
        let i = self.find_min_index()?;
        let entry = &self.entries[i];
        Some((entry.value(), entry.priority()))
    }

    /// Returns the couple (value, priority) with the greatest priority in
    /// the queue, or None if it is empty.
    pub fn peek_max(&mut self) -> Option<(Ref<'_, V>, Ref<'_, P>)> {
        let i = self.find_max_index()?;
        let entry = &self.entries[i];
        Some((entry.value(), entry.priority()))
    }

    /// Returns the locator of the element with the lowest priority, or
    /// None if the queue is empty. The element stays in the queue.
    pub fn peek_min_locator(&mut self) -> Option<Locator<V, P>> {
        let i = self.find_min_index()?;
        Some(self.entries[i].clone())
    }

    /// Returns the locator of the element with the greatest priority, or
    /// None if the queue is empty. The element stays in the queue.
    pub fn peek_max_locator(&mut self) -> Option<Locator<V, P>> {
        let i = self.find_max_index()?;
        Some(self.entries[i].clone())
    }

    /// Returns the locators of the minimum and maximum elements together,
    /// or None if the queue is empty.
    ///
    /// When every priority in the queue compares equal the *same* locator
    /// is returned twice: the stably-first element is both the minimum and
    /// the maximum.
    pub fn peek_min_max(&mut self) -> Option<(Locator<V, P>, Locator<V, P>)> {
        if self.entries.is_empty() {
            return None;
        }
        self.establish(Mode::Interval);
        let max = self.iv_max_index();
        Some((self.entries[0].clone(), self.entries[max].clone()))
    }

    /// Removes the element with the lowest priority and returns its
    /// locator, now detached, or None if the queue is empty.
    ///
    /// Among equal priorities the earliest-inserted element leaves first.
    ///
    /// Computes in **O(log(N))** time once the layout is established.
    pub fn pop_min(&mut self) -> Option<Locator<V, P>> {
        let i = self.find_min_index()?;
        Some(self.delete_index(i))
    }

    /// Removes the element with the greatest priority and returns its
    /// locator, now detached, or None if the queue is empty.
    ///
    /// Among equal priorities the earliest-inserted element leaves first,
    /// from this end too.
    pub fn pop_max(&mut self) -> Option<Locator<V, P>> {
        let i = self.find_max_index()?;
        Some(self.delete_index(i))
    }

    /// Removes an element whose choice is left to the queue (always the
    /// last slot of the backing store) and returns its locator, or None
    /// if the queue is empty.
    ///
    /// Removing the last slot never violates a heap invariant, so this is
    /// **O(1)** whether or not the tail has been heapified. It is the cheap
    /// way to drain a queue that is not being consulted for extrema.
    pub fn pop_unspecified(&mut self) -> Option<Locator<V, P>> {
        if self.entries.is_empty() {
            return None;
        }
        let i = self.entries.len() - 1;
        Some(self.delete_index(i))
    }

    /// Removes the element bound to `locator` from the queue.
    ///
    /// The locator detaches and keeps the value, priority and subpriority
    /// the element had.
    ///
    /// Fails with [`Error::NotAttached`] on a detached locator and
    /// [`Error::WrongLocator`] on a locator of a different queue; nothing
    /// is mutated on failure.
    ///
    /// Computes in **O(log(N))** time, **O(1)** when the element is still
    /// in the unordered tail.
    pub fn remove(&mut self, locator: &Locator<V, P>) -> Result<(), Error> {
        let i = self.position_of(locator)?;
        self.delete_index(i);
        Ok(())
    }

    /// Changes the priority of the element bound to `locator`, returning
    /// the previous priority. The subpriority is retained.
    ///
    /// The element moves toward the proper end of the queue as needed.
    ///
    /// Computes in **O(log(N))** time, **O(1)** when the element is still
    /// in the unordered tail.
    pub fn change_priority(&mut self, locator: &Locator<V, P>, priority: P) -> Result<P, Error> {
        let i = self.position_of(locator)?;
        let old = std::mem::replace(&mut locator.borrow_inner_mut().priority, priority);
        self.reposition(i);
        Ok(old)
    }

    /// Changes priority and subpriority together, returning the previous
    /// priority.
    pub fn change_priority_with_subpriority(
        &mut self,
        locator: &Locator<V, P>,
        priority: P,
        subpriority: u64,
    ) -> Result<P, Error> {
        let i = self.position_of(locator)?;
        let old = {
            let mut inner = locator.borrow_inner_mut();
            inner.subpriority = Some(subpriority);
            std::mem::replace(&mut inner.priority, priority)
        };
        self.reposition(i);
        Ok(old)
    }

    /// Changes value and priority of the element bound to `locator` in one
    /// step. The subpriority is retained.
    pub fn update(&mut self, locator: &Locator<V, P>, value: V, priority: P) -> Result<(), Error> {
        let i = self.position_of(locator)?;
        {
            let mut inner = locator.borrow_inner_mut();
            inner.value = value;
            inner.priority = priority;
        }
        self.reposition(i);
        Ok(())
    }

    /// Changes value, priority and subpriority of the element bound to
    /// `locator` in one step.
    pub fn update_with_subpriority(
        &mut self,
        locator: &Locator<V, P>,
        value: V,
        priority: P,
        subpriority: u64,
    ) -> Result<(), Error> {
        let i = self.position_of(locator)?;
        {
            let mut inner = locator.borrow_inner_mut();
            inner.value = value;
            inner.priority = priority;
            inner.subpriority = Some(subpriority);
        }
        self.reposition(i);
        Ok(())
    }

    /// Replaces the minimum element in place, reusing its locator, and
    /// returns that locator; None if the queue is empty.
    ///
    /// The replacement counts as an insertion: it takes the current
    /// insertion ordinal as subpriority and increments the total count.
    pub fn replace_min(&mut self, value: V, priority: P) -> Option<Locator<V, P>> {
        self.replace_extremum(true, value, priority)
    }

    /// Replaces the maximum element in place, reusing its locator, and
    /// returns that locator; None if the queue is empty.
    pub fn replace_max(&mut self, value: V, priority: P) -> Option<Locator<V, P>> {
        self.replace_extremum(false, value, priority)
    }

    /// Generates a double ended iterator that extracts the elements from
    /// the one with the lowest priority to the one with the highest:
    /// calling `next_back` extracts from the max end instead.
    pub fn into_sorted_iter(self) -> IntoSortedIter<V, P, C> {
        IntoSortedIter { pq: self }
    }

    /*                          internal functions                        */

    fn find_min_index(&mut self) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        match self.mode {
            Mode::Unordered | Mode::Min => self.establish(Mode::Min),
            Mode::Max | Mode::Interval => self.establish(Mode::Interval),
        }
        // both layouts keep the minimum at the root
        Some(0)
    }

    fn find_max_index(&mut self) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        match self.mode {
            Mode::Unordered | Mode::Max => self.establish(Mode::Max),
            Mode::Min | Mode::Interval => self.establish(Mode::Interval),
        }
        Some(match self.mode {
            Mode::Max => 0,
            _ => self.iv_max_index(),
        })
    }

    /// Puts the queue under `target` discipline, heapifying whatever is not
    /// covered yet: the whole store on a mode change, only the grown tail
    /// otherwise.
    fn establish(&mut self, target: Mode) {
        if self.mode != target {
            self.mode = target;
            self.heapsize = 0;
        }
        if self.heapsize < self.entries.len() {
            match target {
                Mode::Min => self.heapify_binary(binary::Sense::Min),
                Mode::Max => self.heapify_binary(binary::Sense::Max),
                Mode::Interval => self.heapify_interval(),
                Mode::Unordered => {}
            }
        }
    }

    /// Removes the entry at slot `i`: detaches its locator, fills the hole
    /// with the last entry and repairs the layout around the filled slot.
    fn delete_index(&mut self, i: usize) -> Locator<V, P> {
        let last = self.entries.len() - 1;
        if i < last {
            self.swap_entries(i, last);
        }
        let locator = match self.entries.pop() {
            Some(locator) => locator,
            None => unreachable!("delete_index on an empty queue"),
        };
        locator.detach();
        self.heapsize = self.heapsize.min(self.entries.len());
        if i < self.heapsize {
            self.repair(i);
        }
        locator
    }

    /// Restores the active discipline around slot `i` after its entry was
    /// replaced or its priority rewritten.
    fn repair(&mut self, i: usize) {
        match self.mode {
            Mode::Unordered => {}
            Mode::Min => self.sift(binary::Sense::Min, i),
            Mode::Max => self.sift(binary::Sense::Max, i),
            Mode::Interval => {
                let end = self.heapsize;
                self.iv_adjust(i, 0, end);
            }
        }
    }

    fn reposition(&mut self, i: usize) {
        // entries above the heapified prefix are repositioned for free at
        // the next heapify
        if i < self.heapsize {
            self.repair(i);
        }
    }

    fn replace_extremum(&mut self, min_end: bool, value: V, priority: P) -> Option<Locator<V, P>> {
        if self.entries.is_empty() {
            return None;
        }
        self.establish(Mode::Interval);
        let i = if min_end { 0 } else { self.iv_max_index() };
        let locator = self.entries[i].clone();
        {
            let mut inner = locator.borrow_inner_mut();
            inner.value = value;
            inner.priority = priority;
            inner.subpriority = Some(self.totalcount);
        }
        self.totalcount += 1;
        let end = self.heapsize;
        self.iv_adjust(i, 0, end);
        Some(locator)
    }

    pub(crate) fn pcmp(&self, i: usize, j: usize) -> Ordering {
        let a = self.entries[i].borrow_inner();
        let b = self.entries[j].borrow_inner();
        self.cmp.compare(&a.priority, &b.priority)
    }

    /// Root-ward order on the min side: by priority, ties broken toward
    /// the smaller subpriority.
    pub(crate) fn cmp_min_side(&self, i: usize, j: usize) -> Ordering {
        self.pcmp(i, j).then(self.sub_at(i).cmp(&self.sub_at(j)))
    }

    /// Root-ward order on the max side: by reversed priority; among equal
    /// priorities the smaller subpriority is still the more extreme one, so
    /// that the max end also drains in insertion order.
    pub(crate) fn cmp_max_side(&self, i: usize, j: usize) -> Ordering {
        self.pcmp(i, j)
            .reverse()
            .then(self.sub_at(i).cmp(&self.sub_at(j)))
    }
}

impl<V: Clone, C: Compare<V>> Depq<V, V, C> {
    /// Insert a value that is its own priority.
    pub fn insert_value(&mut self, value: V) -> Locator<V, V> {
        let priority = value.clone();
        self.insert(value, priority)
    }
}

impl<V, P, C: Default> Default for Depq<V, P, C> {
    fn default() -> Self {
        Self::with_capacity_and_comparator(0, C::default())
    }
}

/// Deep copy: the new queue gets fresh locators bound to it, one per
/// element, with the same values, priorities and subpriorities. Locators of
/// the original keep referring to the original.
impl<V: Clone, P: Clone, C: Clone> Clone for Depq<V, P, C> {
    fn clone(&self) -> Self {
        let token = Rc::new(QueueToken);
        let entries = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, locator)| {
                let inner = locator.borrow_inner();
                Locator::with_state(
                    inner.value.clone(),
                    inner.priority.clone(),
                    inner.subpriority,
                    Some(Attachment {
                        queue: Rc::clone(&token),
                        index,
                    }),
                )
            })
            .collect();
        Depq {
            entries,
            cmp: self.cmp.clone(),
            mode: self.mode,
            heapsize: self.heapsize,
            totalcount: self.totalcount,
            token,
        }
    }
}

impl<V, P, C> Extend<(V, P)> for Depq<V, P, C>
where
    C: Compare<P>,
{
    fn extend<T: IntoIterator<Item = (V, P)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        let (min, _) = iter.size_hint();
        self.reserve(min);
        for (value, priority) in iter {
            self.insert(value, priority);
        }
    }
}

impl<V, P, C> FromIterator<(V, P)> for Depq<V, P, C>
where
    C: Compare<P> + Default,
{
    fn from_iter<T: IntoIterator<Item = (V, P)>>(iter: T) -> Self {
        let mut pq = Self::default();
        pq.extend(iter);
        pq
    }
}

impl<V, P, C> From<Vec<(V, P)>> for Depq<V, P, C>
where
    C: Compare<P> + Default,
{
    fn from(vec: Vec<(V, P)>) -> Self {
        Self::from_iter(vec)
    }
}

impl<V, P, C> IntoIterator for Depq<V, P, C> {
    type Item = Locator<V, P>;
    type IntoIter = IntoIter<V, P>;

    /// Consumes the queue, yielding every locator in unspecified order.
    /// The locators are detached.
    fn into_iter(self) -> IntoIter<V, P> {
        for locator in &self.entries {
            locator.detach();
        }
        IntoIter::new(self.entries)
    }
}

impl<'a, V, P, C> IntoIterator for &'a Depq<V, P, C> {
    type Item = (Ref<'a, V>, Ref<'a, P>);
    type IntoIter = Iter<'a, V, P>;
    fn into_iter(self) -> Iter<'a, V, P> {
        self.iter()
    }
}

impl<V: fmt::Debug, P: fmt::Debug, C> fmt::Debug for Depq<V, P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_list()
            .entries(self.entries.iter().map(|locator| {
                let inner = locator.borrow_inner();
                (
                    format!("{:?}", inner.value),
                    format!("{:?}", inner.priority),
                    inner.subpriority,
                )
            }))
            .finish()
    }
}

#[cfg(feature = "serde")]
mod serde {
    use serde::de::{Deserialize, Deserializer};
    use serde::ser::{Serialize, SerializeSeq, SerializeTuple, Serializer};

    use super::Depq;
    use crate::compare::Compare;
    use crate::locator::Locator;

    struct Entries<'a, V, P>(&'a [Locator<V, P>]);

    impl<'a, V: Serialize, P: Serialize> Serialize for Entries<'a, V, P> {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
            for locator in self.0 {
                let inner = locator.borrow_inner();
                seq.serialize_element(&(&inner.value, &inner.priority, &inner.subpriority))?;
            }
            seq.end()
        }
    }

    impl<V, P, C> Serialize for Depq<V, P, C>
    where
        V: Serialize,
        P: Serialize,
    {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut tuple = serializer.serialize_tuple(2)?;
            tuple.serialize_element(&self.totalcount)?;
            tuple.serialize_element(&Entries(&self.entries))?;
            tuple.end()
        }
    }

    impl<'de, V, P, C> Deserialize<'de> for Depq<V, P, C>
    where
        V: Deserialize<'de>,
        P: Deserialize<'de>,
        C: Compare<P> + Default,
    {
        fn deserialize<D>(deserializer: D) -> Result<Depq<V, P, C>, D::Error>
        where
            D: Deserializer<'de>,
        {
            // fresh locators, unordered layout: the heap is rebuilt by the
            // first query, which re-establishes every binding invariant
            let (totalcount, entries): (u64, Vec<(V, P, Option<u64>)>) =
                Deserialize::deserialize(deserializer)?;
            let mut pq = Depq::default();
            for (value, priority, subpriority) in entries {
                match subpriority {
                    Some(sub) => pq.insert_with_subpriority(value, priority, sub),
                    None => pq.insert(value, priority),
                };
            }
            pq.totalcount = totalcount.max(pq.entries.len() as u64);
            Ok(pq)
        }
    }
}

#[cfg(test)]
impl<V, P, C: Compare<P>> Depq<V, P, C> {
    /// Asserts every structural invariant of the queue. Used after every
    /// mutation in the stress tests.
    pub(crate) fn assert_valid(&self) {
        assert!(self.totalcount >= self.entries.len() as u64);
        assert!(self.heapsize <= self.entries.len());
        for (i, locator) in self.entries.iter().enumerate() {
            assert_eq!(locator.index_in(&self.token), Some(i), "index of slot {}", i);
            assert!(locator.subpriority().is_some());
        }
        match self.mode {
            Mode::Unordered => {}
            Mode::Min => {
                for i in 1..self.heapsize {
                    let parent = (i - 1) / 2;
                    assert_ne!(
                        self.cmp_min_side(parent, i),
                        Ordering::Greater,
                        "min-heap violated at {}",
                        i
                    );
                }
            }
            Mode::Max => {
                for i in 1..self.heapsize {
                    let parent = (i - 1) / 2;
                    assert_ne!(
                        self.cmp_max_side(parent, i),
                        Ordering::Greater,
                        "max-heap violated at {}",
                        i
                    );
                }
            }
            Mode::Interval => {
                let end = self.heapsize;
                for lo in (0..end).step_by(2) {
                    let hi = lo + 1;
                    if hi < end {
                        match self.pcmp(lo, hi) {
                            Ordering::Greater => panic!("interval {} inverted", lo),
                            Ordering::Equal => assert!(
                                self.sub_at(lo) <= self.sub_at(hi),
                                "interval {} subpriority inverted",
                                lo
                            ),
                            Ordering::Less => {}
                        }
                    }
                }
                for j in (2..end).step_by(2) {
                    let p = interval::minparent(j);
                    assert_ne!(
                        self.cmp_min_side(p, j),
                        Ordering::Greater,
                        "min chain violated at {}",
                        j
                    );
                }
                for j in (3..end).step_by(2) {
                    let p = interval::maxparent(j);
                    assert_ne!(
                        self.cmp_max_side(p, j),
                        Ordering::Greater,
                        "max chain violated at {}",
                        j
                    );
                }
                // a min slot may not undercut an equal-priority max-side
                // parent, or stable max extraction would miss it
                for j in (2..end).step_by(2) {
                    let p = interval::maxparent(j);
                    assert_ne!(
                        self.cmp_max_side(p, j),
                        Ordering::Greater,
                        "max parent bound violated at {}",
                        j
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_min<V: Clone, P, C: Compare<P>>(pq: &mut Depq<V, P, C>) -> Vec<V> {
        let mut out = Vec::new();
        while let Some(loc) = pq.pop_min() {
            pq.assert_valid();
            out.push(loc.value().clone());
        }
        out
    }

    fn drain_max<V: Clone, P, C: Compare<P>>(pq: &mut Depq<V, P, C>) -> Vec<V> {
        let mut out = Vec::new();
        while let Some(loc) = pq.pop_max() {
            pq.assert_valid();
            out.push(loc.value().clone());
        }
        out
    }

    #[test]
    fn stable_ascending_drain() {
        let mut pq = Depq::new();
        for &(v, p) in &[("a", 1), ("b", 0), ("c", 1), ("d", 0), ("e", 1), ("f", 0)] {
            pq.insert(v, p);
        }
        assert_eq!(drain_min(&mut pq), vec!["b", "d", "f", "a", "c", "e"]);
    }

    #[test]
    fn stable_descending_drain() {
        let mut pq = Depq::new();
        for &(v, p) in &[("a", 1), ("b", 0), ("c", 1), ("d", 0), ("e", 1), ("f", 0)] {
            pq.insert(v, p);
        }
        assert_eq!(drain_max(&mut pq), vec!["a", "c", "e", "b", "d", "f"]);
    }

    #[test]
    fn min_max_share_locator_on_equal_root() {
        let mut pq = Depq::new();
        let first = pq.insert("v1", 10);
        pq.insert("v2", 10);
        let (min, max) = pq.peek_min_max().unwrap();
        assert_eq!(min, max);
        assert_eq!(min, first);
    }

    #[test]
    fn priority_update_repositions() {
        let mut pq = Depq::new();
        let a = pq.insert("a", 2);
        pq.insert("b", 1);
        pq.insert("c", 3);
        assert_eq!(pq.peek_min().map(|(v, _)| *v), Some("b"));
        pq.change_priority(&a, 0).unwrap();
        pq.assert_valid();
        assert_eq!(pq.peek_min().map(|(v, _)| *v), Some("a"));
        pq.change_priority(&a, 10).unwrap();
        pq.assert_valid();
        assert_eq!(drain_min(&mut pq), vec!["b", "c", "a"]);
    }

    #[test]
    fn replace_min_reuses_locator() {
        let mut pq = Depq::new();
        pq.insert(1, 1);
        pq.insert(2, 2);
        pq.insert(0, 0);
        let loc = pq.peek_min_locator().unwrap();
        assert_eq!(loc.subpriority(), Some(2));
        let replaced = pq.replace_min(10, 10).unwrap();
        assert_eq!(replaced, loc);
        assert_eq!(loc.subpriority(), Some(3));
        assert_eq!(pq.total_count(), 4);
        assert_eq!(drain_min(&mut pq), vec![1, 2, 10]);
    }

    #[test]
    fn alternating_ends_promote_to_interval() {
        let mut pq = Depq::new();
        for i in 0..32 {
            pq.insert(i, i);
        }
        assert_eq!(pq.peek_min().map(|(v, _)| *v), Some(0));
        pq.assert_valid();
        assert_eq!(pq.peek_max().map(|(v, _)| *v), Some(31));
        pq.assert_valid();
        assert_eq!(pq.pop_min().unwrap().into_value(), Ok(0));
        assert_eq!(pq.pop_max().unwrap().into_value(), Ok(31));
        assert_eq!(pq.pop_min().unwrap().into_value(), Ok(1));
        assert_eq!(pq.pop_max().unwrap().into_value(), Ok(30));
        pq.assert_valid();
        assert_eq!(pq.len(), 28);
    }

    #[test]
    fn insert_locator_rejects_attached() {
        let mut pq = Depq::new();
        let loc = pq.insert("a", 1);
        assert_eq!(pq.insert_locator(&loc), Err(Error::AlreadyAttached));
        let detached = Locator::new("b", 2);
        pq.insert_locator(&detached).unwrap();
        assert!(detached.is_in_queue());
        assert_eq!(detached.subpriority(), Some(1));
        let mut other = Depq::new();
        assert_eq!(other.insert_locator(&detached), Err(Error::AlreadyAttached));
        assert_eq!(other.remove(&detached), Err(Error::WrongLocator));
    }

    #[test]
    fn remove_detaches_with_snapshot() {
        let mut pq = Depq::new();
        let a = pq.insert("a", 5);
        let b = pq.insert("b", 7);
        pq.insert("c", 3);
        pq.remove(&b).unwrap();
        pq.assert_valid();
        assert!(!b.is_in_queue());
        assert_eq!(*b.priority(), 7);
        assert_eq!(b.subpriority(), Some(1));
        assert_eq!(pq.remove(&b), Err(Error::NotAttached));
        assert_eq!(drain_min(&mut pq), vec!["c", "a"]);
        assert!(!a.is_in_queue());
    }

    #[test]
    fn pop_unspecified_takes_the_tail() {
        let mut pq = Depq::new();
        pq.insert("a", 1);
        pq.insert("b", 2);
        let c = pq.insert("c", 0);
        // no extremum was ever queried: the tail is entry "c"
        assert_eq!(pq.pop_unspecified().unwrap(), c);
        pq.assert_valid();
        // after a query the tail lives inside the heap layout
        assert_eq!(pq.peek_min().map(|(v, _)| *v), Some("a"));
        assert!(pq.pop_unspecified().is_some());
        pq.assert_valid();
        assert_eq!(pq.len(), 1);
        assert!(pq.pop_unspecified().is_some());
        assert_eq!(pq.pop_unspecified(), None);
    }

    #[test]
    fn change_priority_keeps_subpriority_in_interval_mode() {
        let mut pq = Depq::new();
        let a = pq.insert("a", 4);
        pq.insert("b", 4);
        pq.insert("c", 9);
        // force the interval layout before updating
        pq.peek_min_max().unwrap();
        pq.change_priority(&a, 9).unwrap();
        pq.assert_valid();
        assert_eq!(a.subpriority(), Some(0));
        // "a" ties with "c" at 9 and was inserted first, so it must still
        // leave the max end first
        assert_eq!(drain_max(&mut pq), vec!["a", "c", "b"]);
    }

    #[test]
    fn update_changes_value_and_priority() {
        let mut pq = Depq::new();
        let a = pq.insert("a", 2);
        pq.insert("b", 1);
        pq.update(&a, "z", 0).unwrap();
        assert_eq!(*a.value(), "z");
        assert_eq!(*a.priority(), 0);
        assert_eq!(a.subpriority(), Some(0));
        assert_eq!(pq.peek_min().map(|(v, _)| *v), Some("z"));
    }

    #[test]
    fn tail_update_is_lazy() {
        let mut pq = Depq::new();
        pq.insert("a", 1);
        pq.peek_min().unwrap();
        let b = pq.insert("b", 5);
        // "b" sits above the heapified prefix; the edit is a plain write
        pq.change_priority(&b, 0).unwrap();
        pq.assert_valid();
        assert_eq!(pq.peek_min().map(|(v, _)| *v), Some("b"));
    }

    #[test]
    fn clear_detaches_and_keeps_totalcount() {
        let mut pq = Depq::new();
        let a = pq.insert("a", 1);
        pq.insert("b", 2);
        pq.clear();
        assert!(pq.is_empty());
        assert!(!a.is_in_queue());
        assert_eq!(pq.total_count(), 2);
        pq.insert("c", 3);
        assert_eq!(pq.total_count(), 3);
    }

    #[test]
    fn dup_gets_fresh_locators() {
        let mut pq = Depq::new();
        let a = pq.insert("a", 1);
        pq.insert("b", 2);
        let mut copy = pq.clone();
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.total_count(), pq.total_count());
        // the original locator belongs to the original queue only
        assert!(pq.contains(&a));
        assert!(!copy.contains(&a));
        assert_eq!(copy.remove(&a), Err(Error::WrongLocator));
        copy.assert_valid();
        assert_eq!(drain_min(&mut copy), vec!["a", "b"]);
        assert_eq!(pq.len(), 2);
        assert!(a.is_in_queue());
    }

    #[test]
    fn iterators_visit_every_entry() {
        let mut pq = Depq::new();
        for i in 0..10 {
            pq.insert(i, i * 2);
        }
        let mut seen: Vec<i32> = pq.iter().map(|(v, _)| *v).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        assert_eq!(pq.locators().count(), 10);
        let mut values: Vec<i32> = pq
            .into_iter()
            .filter_map(|loc| loc.into_value().ok())
            .collect();
        values.sort_unstable();
        assert_eq!(values, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn sorted_iter_is_double_ended() {
        let mut pq = Depq::new();
        for &i in &[4, 1, 3, 0, 2] {
            pq.insert(i, i);
        }
        let mut iter = pq.into_sorted_iter();
        assert_eq!(iter.next().unwrap().into_value(), Ok(0));
        assert_eq!(iter.next_back().unwrap().into_value(), Ok(4));
        assert_eq!(iter.next().unwrap().into_value(), Ok(1));
        assert_eq!(iter.next_back().unwrap().into_value(), Ok(3));
        assert_eq!(iter.next().unwrap().into_value(), Ok(2));
        assert!(iter.next().is_none());
        assert!(iter.next_back().is_none());
    }

    #[test]
    fn insert_value_uses_value_as_priority() {
        let mut pq = Depq::new();
        pq.insert_value(5);
        pq.insert_value(2);
        pq.insert_value(8);
        assert_eq!(pq.peek_min().map(|(v, _)| *v), Some(2));
        assert_eq!(pq.peek_max().map(|(v, _)| *v), Some(8));
    }

    #[test]
    fn explicit_subpriority_wins_over_ordinal() {
        let mut pq = Depq::new();
        pq.insert_with_subpriority("a", 1, 5);
        let b = pq.insert_with_subpriority("b", 1, 3);
        assert_eq!(pq.peek_min_locator().unwrap(), b);
        let c = Locator::new_with_subpriority("c", 1, 9);
        pq.insert_locator(&c).unwrap();
        assert_eq!(c.subpriority(), Some(9));
        assert_eq!(drain_min(&mut pq), vec!["b", "a", "c"]);
    }

    #[test]
    fn custom_comparator_reverses_order() {
        let mut pq = Depq::with_comparator(|a: &i32, b: &i32| b.cmp(a));
        for i in 0..5 {
            pq.insert(i, i);
        }
        assert_eq!(pq.peek_min().map(|(v, _)| *v), Some(4));
        assert_eq!(pq.peek_max().map(|(v, _)| *v), Some(0));
        assert_eq!(drain_min(&mut pq), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn random_stress_against_sorted_model() {
        use rand::prelude::*;

        let mut rng = StdRng::seed_from_u64(0x5eed_dec0);
        for round in 0..40 {
            let n = rng.gen_range(1..120);
            let mut pq = Depq::new();
            let mut model: Vec<(i32, u64)> = Vec::new();
            let mut ordinal = 0u64;
            for _ in 0..n {
                let p = rng.gen_range(-20..20);
                pq.insert(p, p);
                model.push((p, ordinal));
                ordinal += 1;
                pq.assert_valid();
            }
            // interleave queries to exercise the mode switches
            if round % 2 == 0 {
                assert!(pq.peek_min().is_some());
            } else {
                assert!(pq.peek_max().is_some());
            }
            pq.assert_valid();
            let mut expected = model.clone();
            expected.sort();
            let drained: Vec<i32> = if round % 3 == 0 {
                drain_min(&mut pq)
            } else if round % 3 == 1 {
                expected.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
                drain_max(&mut pq)
            } else {
                let mut out = Vec::new();
                loop {
                    match pq.pop_min() {
                        Some(loc) => out.push(loc.into_value().unwrap()),
                        None => break,
                    }
                    pq.assert_valid();
                    if let Some(loc) = pq.pop_max() {
                        pq.assert_valid();
                        out.push(loc.into_value().unwrap());
                    }
                }
                // fold the two-ended drain back into ascending order
                let mut mins = Vec::new();
                let mut maxes = Vec::new();
                for (k, v) in out.into_iter().enumerate() {
                    if k % 2 == 0 {
                        mins.push(v);
                    } else {
                        maxes.push(v);
                    }
                }
                maxes.reverse();
                mins.extend(maxes);
                mins
            };
            let expected: Vec<i32> = expected.into_iter().map(|(p, _)| p).collect();
            assert_eq!(drained, expected, "round {}", round);
        }
    }

    #[test]
    fn random_stress_updates_and_removals() {
        use rand::prelude::*;

        let mut rng = StdRng::seed_from_u64(0xdeca_f000);
        let mut pq = Depq::new();
        let mut locs = Vec::new();
        for i in 0..200 {
            locs.push(pq.insert(i, rng.gen_range(0..50)));
        }
        for step in 0..600 {
            match rng.gen_range(0..6) {
                0 => {
                    let loc = &locs[rng.gen_range(0..locs.len())];
                    if loc.is_in_queue() {
                        pq.change_priority(loc, rng.gen_range(0..50)).unwrap();
                    }
                }
                1 => {
                    let loc = &locs[rng.gen_range(0..locs.len())];
                    if loc.is_in_queue() {
                        pq.remove(loc).unwrap();
                    }
                }
                2 => {
                    let _ = pq.pop_min();
                }
                3 => {
                    let _ = pq.pop_max();
                }
                4 => {
                    let _ = pq.peek_min_max();
                }
                _ => {
                    locs.push(pq.insert(1000 + step, rng.gen_range(0..50)));
                }
            }
            pq.assert_valid();
        }
        // whatever survived must drain in priority order
        let mut last = i32::MIN;
        while let Some(loc) = pq.pop_min() {
            pq.assert_valid();
            let p = *loc.priority();
            assert!(p >= last);
            last = p;
        }
    }
}
