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
//! Priority comparison policies.
//!
//! A [`Depq`](crate::Depq) is generic over a [`Compare`] implementation the
//! same way a hash map is generic over its hasher. The default policy,
//! [`NaturalOrder`], uses the [`Ord`] implementation of the priority type;
//! any `Fn(&P, &P) -> Ordering` closure can be used instead through
//! [`Depq::with_comparator`](crate::Depq::with_comparator).

use std::cmp::Ordering;

/// A three-way comparison policy for priorities of type `P`.
pub trait Compare<P> {
    /// Compares two priorities, returning `Less` if `a` ranks below `b`.
    fn compare(&self, a: &P, b: &P) -> Ordering;
}

/// Comparison policy that uses the priority type's own [`Ord`] instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<P: Ord> Compare<P> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &P, b: &P) -> Ordering {
        a.cmp(b)
    }
}

impl<P, F> Compare<P> for F
where
    F: Fn(&P, &P) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &P, b: &P) -> Ordering {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_order_follows_ord() {
        assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
        assert_eq!(NaturalOrder.compare(&2, &2), Ordering::Equal);
        assert_eq!(NaturalOrder.compare(&3, &2), Ordering::Greater);
    }

    #[test]
    fn closure_comparator_reverses() {
        let rev = |a: &i32, b: &i32| b.cmp(a);
        assert_eq!(rev.compare(&1, &2), Ordering::Greater);
        assert_eq!(rev.compare(&2, &1), Ordering::Less);
    }
}
