// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resource containers and the bookkeeping that ties them to their clients.
//!
//! A *resource container* is a clipPath, mask, pattern, gradient, filter or
//! marker node. It registers its id in the document's
//! [`ResourceRegistry`]; nodes that reference the id become its *clients*.
//! Each attached client has an [`SvgResources`] record in the
//! [`ResourceCache`] naming the containers it resolved, and each container
//! keeps the reverse list in its [`ContainerState`]. References to ids that
//! do not exist yet are parked as *pending* and resolved when a container
//! with that id registers.
//!
//! Anything derived from a container for drawing (clip paths, gradient
//! shaders, pattern tiles, mask regions) is computed lazily and cached in
//! [`Artifacts`]. Mutating a container's content fans the change out to its
//! clients with
//! [`mark_all_clients_for_invalidation`](crate::tree::RenderTree::mark_all_clients_for_invalidation),
//! which evicts those artifacts and marks the clients for layout or repaint.

mod artifacts;
mod cache;
mod clip;
mod container;
mod filter;
mod kinds;
mod marker;
mod mask;
mod paint_server;
mod registry;
mod resources;

pub use artifacts::{Artifacts, ClipContent, GradientGeometry, GradientShader, MaskContent, PatternTile};
pub use clip::resolve_basic_shape;
pub use container::{ContainerState, InvalidationMode};
pub use kinds::{
    ClipPathData, FilterData, FilterPrimitive, GradientData, GradientStop, LinearGradientData,
    MarkerData, MarkerOrient, MarkerUnits, MaskData, PatternData, RadialGradientData,
    ResourceData, ResourceKind, ResourceType,
};
pub use marker::MarkerInstance;
pub use paint_server::{GradientShape, ResolvedGradient, ResolvedPattern};
pub use registry::ResourceRegistry;
pub use resources::{ResourceCache, SvgResources};
