// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stack of pending undo actions for opened canvas scopes.
//!
//! Every scope a painter opens pushes the action that closes it. A painter
//! takes a [`ScopeMark`] before establishing a node's effects and unwinds
//! back to it on every exit path, so a failure half-way through leaves the
//! canvas exactly as balanced as a success.

use kurbo::{Affine, Rect};
use sheaf_core::style::MaskType;
use sheaf_core::tree::PictureId;
use smallvec::SmallVec;

use crate::canvas::{Canvas, LayerStyle};

/// How to close one opened scope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UndoAction {
    /// Ends a clip.
    PopClip,
    /// Ends a layer.
    PopLayer,
    /// Composites a recorded mask onto the content layer, then ends the
    /// content layer.
    ApplyMask {
        /// Recorded mask content.
        picture: PictureId,
        /// Mask content space to the canvas.
        transform: Affine,
        /// Mask region in the same space.
        bounds: Rect,
        /// How coverage is read from the content.
        mode: MaskType,
    },
}

impl UndoAction {
    fn run(self, canvas: &mut dyn Canvas) {
        match self {
            Self::PopClip => canvas.pop_clip(),
            Self::PopLayer => canvas.pop_layer(),
            Self::ApplyMask {
                picture,
                transform,
                bounds,
                mode,
            } => {
                canvas.push_layer(&LayerStyle::Mask(mode), transform, bounds);
                canvas.draw_picture(transform, picture);
                canvas.pop_layer();
                canvas.pop_layer();
            }
        }
    }
}

/// A position in a [`ScopeStack`] to unwind back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeMark(usize);

/// Pending undo actions, innermost last.
#[derive(Clone, Debug, Default)]
pub struct ScopeStack {
    actions: SmallVec<[UndoAction; 8]>,
}

impl ScopeStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current depth as a mark.
    #[must_use]
    pub fn mark(&self) -> ScopeMark {
        ScopeMark(self.actions.len())
    }

    /// Records the action that closes a scope just opened.
    pub fn push(&mut self, action: UndoAction) {
        self.actions.push(action);
    }

    /// Runs and removes every action above `mark`, innermost first.
    ///
    /// # Panics
    ///
    /// Panics if the stack was already unwound below `mark`.
    pub fn unwind_to(&mut self, mark: ScopeMark, canvas: &mut dyn Canvas) {
        assert!(
            self.actions.len() >= mark.0,
            "scope stack unwound past mark {}",
            mark.0
        );
        while self.actions.len() > mark.0 {
            if let Some(action) = self.actions.pop() {
                action.run(canvas);
            }
        }
    }

    /// Returns the number of open scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns whether no scope is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
