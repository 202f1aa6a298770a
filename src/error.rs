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
//! Error values returned by the fallible queue and locator operations.
//!
//! All of these signal programmer errors: the operation validates its
//! arguments before touching any queue state, so a returned error implies
//! nothing was mutated. Querying or popping an empty queue is *not* an
//! error; those operations return `None`.

use thiserror::Error;

/// The error type for locator-based operations on a [`Depq`](crate::Depq).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The locator is attached to a different queue than the one operated on.
    #[error("locator belongs to a different queue")]
    WrongLocator,

    /// The operation requires a detached locator, but this one is already
    /// in a queue.
    #[error("locator is already attached to a queue")]
    AlreadyAttached,

    /// The operation requires an attached locator, but this one is not in
    /// any queue.
    #[error("locator is not attached to a queue")]
    NotAttached,
}
