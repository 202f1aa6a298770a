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
//! This crate provides [`Depq`], a stable double-ended priority queue with
//! an efficient way to change the priority of an element, and the related
//! [`Locator`] handle type.
//!
//! Every insertion returns a [`Locator`]: a handle bound to the inserted
//! element that stays valid while the queue reorganises itself. Through the
//! locator (and the queue methods taking one) it is possible to read the
//! element, change its priority, or remove it from the middle of the queue
//! in **O(log(N))** time.
//!
//! The queue is *double-ended*: both the minimum and the maximum element can
//! be queried and extracted. Internally it adapts its heap layout to the
//! queries actually performed: a plain binary heap while only one end is
//! used, an interval heap as soon as both ends are.
//!
//! Extraction is *stable*: elements that compare equal leave the queue in
//! insertion order, from both ends.
//!
//! # Example
//! ```rust
//! use depq::Depq;
//!
//! let mut pq = Depq::new();
//!
//! assert!(pq.is_empty());
//! pq.insert("Apples", 5);
//! pq.insert("Bananas", 8);
//! let strawberries = pq.insert("Strawberries", 23);
//!
//! assert_eq!(pq.peek_max().map(|(v, _)| *v), Some("Strawberries"));
//! assert_eq!(pq.peek_min().map(|(v, _)| *v), Some("Apples"));
//!
//! pq.change_priority(&strawberries, 2).unwrap();
//! assert_eq!(pq.peek_min().map(|(v, _)| *v), Some("Strawberries"));
//!
//! for loc in pq.into_sorted_iter() {
//!     println!("{}", loc.value());
//! }
//! ```

pub mod compare;
pub mod error;
pub mod locator;
pub mod merge;
pub mod queue;
pub mod select;

pub use compare::{Compare, NaturalOrder};
pub use error::Error;
pub use locator::Locator;
pub use merge::{merge, Merge};
pub use queue::Depq;
pub use select::{n_largest, n_largest_by, n_largest_by_key, n_smallest, n_smallest_by, n_smallest_by_key};
