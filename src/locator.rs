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
//! This module contains the [`Locator`] handle type.
//!
//! A locator is created either by inserting a value into a
//! [`Depq`](crate::Depq), or directly with [`Locator::new`]. In the first
//! case it starts *attached*: the queue entry and the locator reference each
//! other, and the locator follows the element through every internal
//! reorganisation. In the second case it starts *detached* and can be
//! attached later with [`Depq::insert_locator`](crate::Depq::insert_locator).
//!
//! When the element is removed from the queue, through `pop_min`,
//! `pop_max`, `remove` or `clear`, the locator becomes detached again and
//! keeps the value, priority and subpriority the element had at removal
//! time.
//!
//! Locators compare by *identity*: two locators are equal only when they are
//! handles to the same element. Cloning a locator clones the handle, never
//! the element, so the clone is equal to the original.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::replace;
use std::rc::Rc;

use crate::error::Error;

/// Identity token owned by a queue and referenced by the locators attached
/// to it. Comparison is by allocation, never by content.
#[derive(Debug, Default)]
pub(crate) struct QueueToken;

#[derive(Debug)]
pub(crate) struct Attachment {
    pub(crate) queue: Rc<QueueToken>,
    pub(crate) index: usize,
}

#[derive(Debug)]
pub(crate) struct LocatorInner<V, P> {
    pub(crate) value: V,
    pub(crate) priority: P,
    pub(crate) subpriority: Option<u64>,
    pub(crate) attachment: Option<Attachment>,
}

/// A handle bound to one element of a [`Depq`](crate::Depq).
///
/// See the [module level documentation](self) for more details.
pub struct Locator<V, P> {
    pub(crate) inner: Rc<RefCell<LocatorInner<V, P>>>,
}

impl<V, P> Locator<V, P> {
    /// Creates a detached locator with the given value and priority and no
    /// subpriority.
    ///
    /// The locator can be put into a queue with
    /// [`Depq::insert_locator`](crate::Depq::insert_locator), at which point
    /// the queue assigns its insertion ordinal as the subpriority.
    pub fn new(value: V, priority: P) -> Self {
        Self::with_state(value, priority, None, None)
    }

    /// Creates a detached locator with an explicit subpriority.
    pub fn new_with_subpriority(value: V, priority: P, subpriority: u64) -> Self {
        Self::with_state(value, priority, Some(subpriority), None)
    }

    pub(crate) fn with_state(
        value: V,
        priority: P,
        subpriority: Option<u64>,
        attachment: Option<Attachment>,
    ) -> Self {
        Locator {
            inner: Rc::new(RefCell::new(LocatorInner {
                value,
                priority,
                subpriority,
                attachment,
            })),
        }
    }

    /// Returns a borrow of the element's value.
    ///
    /// The borrow must be released before the owning queue can be mutated
    /// through a method that touches this element.
    pub fn value(&self) -> Ref<'_, V> {
        Ref::map(self.inner.borrow(), |inner| &inner.value)
    }

    /// Returns a mutable borrow of the element's value.
    ///
    /// Changing the value never changes the element's position in the
    /// queue, so this is allowed on attached locators too.
    pub fn value_mut(&self) -> RefMut<'_, V> {
        RefMut::map(self.inner.borrow_mut(), |inner| &mut inner.value)
    }

    /// Replaces the element's value, returning the previous one.
    pub fn set_value(&self, value: V) -> V {
        replace(&mut self.inner.borrow_mut().value, value)
    }

    /// Returns a borrow of the element's priority.
    ///
    /// While the locator is attached this is the live priority; once
    /// detached it is the snapshot taken at removal time.
    pub fn priority(&self) -> Ref<'_, P> {
        Ref::map(self.inner.borrow(), |inner| &inner.priority)
    }

    /// Returns the element's subpriority: the tiebreaker used among equal
    /// priorities. `None` only on a detached locator that was never given
    /// one.
    pub fn subpriority(&self) -> Option<u64> {
        self.inner.borrow().subpriority
    }

    /// Returns true if the locator is currently attached to a queue.
    pub fn is_in_queue(&self) -> bool {
        self.inner.borrow().attachment.is_some()
    }

    /// Sets the priority of a *detached* locator.
    ///
    /// On an attached locator this fails with [`Error::AlreadyAttached`]:
    /// priorities of queued elements must be changed through
    /// [`Depq::change_priority`](crate::Depq::change_priority) so the queue
    /// can restore its ordering.
    pub fn set_priority(&self, priority: P) -> Result<(), Error> {
        let mut inner = self.inner.borrow_mut();
        if inner.attachment.is_some() {
            return Err(Error::AlreadyAttached);
        }
        inner.priority = priority;
        Ok(())
    }

    /// Sets or clears the subpriority of a *detached* locator.
    ///
    /// Fails with [`Error::AlreadyAttached`] on an attached locator.
    pub fn set_subpriority(&self, subpriority: Option<u64>) -> Result<(), Error> {
        let mut inner = self.inner.borrow_mut();
        if inner.attachment.is_some() {
            return Err(Error::AlreadyAttached);
        }
        inner.subpriority = subpriority;
        Ok(())
    }

    /// Recovers ownership of the value, priority and subpriority.
    ///
    /// Succeeds only when the locator is detached and this is the last
    /// handle to the element; otherwise the locator is returned unchanged
    /// in `Err`.
    pub fn into_parts(self) -> Result<(V, P, Option<u64>), Self> {
        if self.is_in_queue() {
            return Err(self);
        }
        match Rc::try_unwrap(self.inner) {
            Ok(cell) => {
                let inner = cell.into_inner();
                Ok((inner.value, inner.priority, inner.subpriority))
            }
            Err(inner) => Err(Locator { inner }),
        }
    }

    /// Recovers ownership of the value alone. Same conditions as
    /// [`into_parts`](Self::into_parts).
    pub fn into_value(self) -> Result<V, Self> {
        self.into_parts().map(|(value, _, _)| value)
    }

    /*                          crate internals                           */

    /// Binds a detached locator to a queue slot. A locator that already has
    /// a subpriority keeps it; otherwise `default_subpriority` (the queue's
    /// insertion ordinal) is assigned.
    pub(crate) fn attach(&self, queue: Rc<QueueToken>, index: usize, default_subpriority: u64) {
        let mut inner = self.inner.borrow_mut();
        debug_assert!(inner.attachment.is_none());
        if inner.subpriority.is_none() {
            inner.subpriority = Some(default_subpriority);
        }
        inner.attachment = Some(Attachment { queue, index });
    }

    /// Unbinds the locator, leaving value/priority/subpriority in place as
    /// the removal-time snapshot.
    pub(crate) fn detach(&self) {
        let mut inner = self.inner.borrow_mut();
        debug_assert!(inner.attachment.is_some());
        inner.attachment = None;
    }

    pub(crate) fn set_index(&self, index: usize) {
        let mut inner = self.inner.borrow_mut();
        match inner.attachment {
            Some(ref mut attachment) => attachment.index = index,
            None => debug_assert!(false, "set_index on a detached locator"),
        }
    }

    /// The slot index, if attached to the queue identified by `token`.
    pub(crate) fn index_in(&self, token: &Rc<QueueToken>) -> Option<usize> {
        self.inner
            .borrow()
            .attachment
            .as_ref()
            .filter(|attachment| Rc::ptr_eq(&attachment.queue, token))
            .map(|attachment| attachment.index)
    }

    pub(crate) fn borrow_inner(&self) -> Ref<'_, LocatorInner<V, P>> {
        self.inner.borrow()
    }

    pub(crate) fn borrow_inner_mut(&self) -> RefMut<'_, LocatorInner<V, P>> {
        self.inner.borrow_mut()
    }
}

/// Clones the *handle*: the result is a second reference to the same
/// element and compares equal to the original. The element itself is never
/// duplicated.
impl<V, P> Clone for Locator<V, P> {
    fn clone(&self) -> Self {
        Locator {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V, P> PartialEq for Locator<V, P> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<V, P> Eq for Locator<V, P> {}

impl<V, P> Hash for Locator<V, P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.inner) as usize).hash(state);
    }
}

impl<V: fmt::Debug, P: fmt::Debug> fmt::Debug for Locator<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Locator")
            .field("value", &inner.value)
            .field("priority", &inner.priority)
            .field("subpriority", &inner.subpriority)
            .field("attached", &inner.attachment.is_some())
            .finish()
    }
}
