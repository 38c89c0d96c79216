// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Local degradations reported while establishing resource effects.
//!
//! None of these are fatal. A caller that receives an [`EffectError`] skips the
//! effect (and, for clip/mask/filter, the node's content for that phase) and
//! carries on with the rest of the traversal.

use core::fmt;

use crate::tree::NodeId;

/// Why a resource effect could not be established for a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectError {
    /// The reference does not resolve to a container of the expected kind.
    MissingResource,
    /// The container has not been laid out yet.
    NotLaidOut(NodeId),
    /// The effect resolves to an empty region (empty bounding box with
    /// objectBoundingBox units, zero-size region, empty filter).
    EmptyGeometry,
    /// The container is already being applied further up the stack.
    ReferenceCycle(NodeId),
    /// A transform on the path was not invertible.
    NonInvertibleTransform,
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingResource => write!(f, "referenced resource is missing"),
            Self::NotLaidOut(id) => write!(f, "resource {id:?} has not been laid out"),
            Self::EmptyGeometry => write!(f, "effect resolves to empty geometry"),
            Self::ReferenceCycle(id) => write!(f, "resource {id:?} references itself"),
            Self::NonInvertibleTransform => write!(f, "transform is not invertible"),
        }
    }
}

impl core::error::Error for EffectError {}
