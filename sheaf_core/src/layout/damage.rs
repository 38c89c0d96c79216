// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial repaint.

use alloc::vec::Vec;

use kurbo::Rect;

/// A region of the host surface that needs repainting.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire surface needs repainting.
    Full,
    /// Rectangles in host space that need repainting.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous paint can be reused.
    #[default]
    None,
}

impl DamageRegion {
    /// Returns `true` if no region needs repainting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Adds one rectangle. Empty rectangles are ignored.
    pub fn add(&mut self, r: Rect) {
        if !(r.width() > 0.0 && r.height() > 0.0) || !r.is_finite() {
            return;
        }
        match self {
            Self::Full => {}
            Self::Rects(rects) => rects.push(r),
            Self::None => *self = Self::Rects(alloc::vec![r]),
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = Self::Rects(merged);
            }
        }
    }

    /// Returns the union of all damage, or `None` if there is none.
    ///
    /// `Full` has no finite bounds and also returns `None`.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
            Self::Full | Self::None => None,
        }
    }
}
