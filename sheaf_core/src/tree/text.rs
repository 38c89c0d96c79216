// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text runs and their scale-dependent measurement.
//!
//! Shaping is out of scope; a span carries per-em metrics supplied by the
//! host. Measurement happens at the device font size (the font size times
//! the screen scaling factor, rounded to whole pixels) and is mapped back to
//! user space, so a change in scale can change a span's user-space extent.

use alloc::string::String;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect};

use crate::length::Length;

/// `<text>` attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextData {
    /// Start x of the first span.
    pub x: Length,
    /// Baseline y.
    pub y: Length,
}

/// A run of text with host-supplied metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct TextSpanData {
    /// The characters of the run.
    pub text: String,
    /// Font size in user units.
    pub font_size: f64,
    /// Average advance per character, in ems.
    pub advance: f64,
    /// Ascent, in ems.
    pub ascent: f64,
    /// Descent, in ems.
    pub descent: f64,
}

impl TextSpanData {
    /// Creates a span with typical Latin metrics.
    #[must_use]
    pub fn new(text: impl Into<String>, font_size: f64) -> Self {
        Self {
            text: text.into(),
            font_size,
            advance: 0.5,
            ascent: 0.8,
            descent: 0.2,
        }
    }

    /// Measures the span with its pen at `origin` on the baseline, at screen
    /// scaling factor `scale`.
    ///
    /// Returns the run's user-space rectangle, or `None` if it renders
    /// nothing (empty text, or a font size that rounds to zero pixels).
    #[must_use]
    pub fn measure(&self, origin: Point, scale: f64) -> Option<Rect> {
        let chars = self.text.chars().count();
        if chars == 0 || !(scale > 0.0) {
            return None;
        }
        let device_size = (self.font_size * scale).round();
        if device_size <= 0.0 {
            return None;
        }
        let size = device_size / scale;
        #[expect(clippy::cast_precision_loss, reason = "run lengths are far below 2^52")]
        let width = chars as f64 * self.advance * size;
        Some(Rect::new(
            origin.x,
            origin.y - self.ascent * size,
            origin.x + width,
            origin.y + self.descent * size,
        ))
    }

    /// Returns the font size used to draw at screen scaling factor `scale`.
    #[must_use]
    pub fn scaled_font_size(&self, scale: f64) -> f64 {
        if scale > 0.0 {
            (self.font_size * scale).round() / scale
        } else {
            self.font_size
        }
    }
}
