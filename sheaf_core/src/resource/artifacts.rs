// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazily computed, invalidation-tracked resource artifacts.
//!
//! Clip content is keyed by container alone. Gradient shaders, pattern tiles
//! and mask content depend on the client's bounding box and are keyed by
//! `(container, client)`, so one client's geometry change never evicts
//! another client's entry.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Affine, BezPath, Point, Rect};
use peniko::{Extend, Fill};

use crate::tree::{NodeId, PictureId, RenderTree};

use super::kinds::GradientStop;

/// The resolved content of a clipPath, in its own user space.
#[derive(Clone, Debug)]
pub struct ClipContent {
    /// Union of the content paths when the clip can be applied as a path;
    /// `None` when it must fall back to masking.
    pub path: Option<BezPath>,
    /// Winding rule for [`path`](Self::path).
    pub fill_rule: Fill,
    /// Bounds of the visible content, if any.
    pub bounds: Option<Rect>,
    /// Recorded mask content for the fallback, once painted.
    pub picture: Option<PictureId>,
}

/// Gradient geometry in shader space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientGeometry {
    /// From `start` to `end`.
    Linear {
        /// Offset 0.
        start: Point,
        /// Offset 1.
        end: Point,
    },
    /// Two-point conical gradient from the focal point to the end circle.
    Radial {
        /// End circle center.
        center: Point,
        /// End circle radius.
        radius: f64,
        /// Focal point.
        focus: Point,
    },
}

/// A gradient ready to draw for one client.
#[derive(Clone, Debug)]
pub struct GradientShader {
    /// Geometry in shader space.
    pub geometry: GradientGeometry,
    /// Color stops, offsets ascending.
    pub stops: Vec<GradientStop>,
    /// Spread method.
    pub extend: Extend,
    /// Shader space to the client's user space.
    pub transform: Affine,
}

/// A pattern tile ready to draw for one client.
#[derive(Clone, Debug)]
pub struct PatternTile {
    /// The tile in pattern space; tiles repeat with its size as the period.
    pub tile: Rect,
    /// Content coordinates to pattern space.
    pub content_transform: Affine,
    /// Pattern space to the client's user space.
    pub transform: Affine,
    /// The pattern whose children form the content (after `href`
    /// inheritance).
    pub content: NodeId,
    /// Recorded tile content, once painted.
    pub picture: Option<PictureId>,
}

/// Mask content ready to draw for one client.
#[derive(Clone, Debug)]
pub struct MaskContent {
    /// Mask region in the client's user space.
    pub region: Rect,
    /// Content coordinates to the client's user space.
    pub content_transform: Affine,
    /// Recorded content, once painted.
    pub picture: Option<PictureId>,
}

#[derive(Clone, Debug)]
enum ClientArtifact {
    Gradient(GradientShader),
    Pattern(PatternTile),
    Mask(MaskContent),
}

impl ClientArtifact {
    fn picture(&self) -> Option<PictureId> {
        match self {
            Self::Gradient(_) => None,
            Self::Pattern(p) => p.picture,
            Self::Mask(m) => m.picture,
        }
    }
}

/// Every derived artifact in a tree.
#[derive(Clone, Debug, Default)]
pub struct Artifacts {
    clips: HashMap<u32, ClipContent>,
    per_client: HashMap<(u32, u32), ClientArtifact>,
    released: Vec<PictureId>,
}

impl Artifacts {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // -- Lookup --

    pub(crate) fn clip(&self, container: u32) -> Option<&ClipContent> {
        self.clips.get(&container)
    }

    pub(crate) fn gradient(&self, container: u32, client: u32) -> Option<&GradientShader> {
        match self.per_client.get(&(container, client)) {
            Some(ClientArtifact::Gradient(g)) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn pattern(&self, container: u32, client: u32) -> Option<&PatternTile> {
        match self.per_client.get(&(container, client)) {
            Some(ClientArtifact::Pattern(p)) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn mask(&self, container: u32, client: u32) -> Option<&MaskContent> {
        match self.per_client.get(&(container, client)) {
            Some(ClientArtifact::Mask(m)) => Some(m),
            _ => None,
        }
    }

    pub(crate) fn has_client_entry(&self, container: u32, client: u32) -> bool {
        self.per_client.contains_key(&(container, client))
    }

    // -- Insertion --

    pub(crate) fn insert_clip(&mut self, container: u32, clip: ClipContent) {
        if let Some(old) = self.clips.insert(container, clip) {
            self.released.extend(old.picture);
        }
    }

    pub(crate) fn insert_gradient(&mut self, container: u32, client: u32, g: GradientShader) {
        self.insert_client(container, client, ClientArtifact::Gradient(g));
    }

    pub(crate) fn insert_pattern(&mut self, container: u32, client: u32, p: PatternTile) {
        self.insert_client(container, client, ClientArtifact::Pattern(p));
    }

    pub(crate) fn insert_mask(&mut self, container: u32, client: u32, m: MaskContent) {
        self.insert_client(container, client, ClientArtifact::Mask(m));
    }

    fn insert_client(&mut self, container: u32, client: u32, a: ClientArtifact) {
        if let Some(old) = self.per_client.insert((container, client), a) {
            self.released.extend(old.picture());
        }
    }

    /// Stores a recorded picture; returns `false` if the entry is gone.
    pub(crate) fn set_clip_picture(&mut self, container: u32, picture: PictureId) -> bool {
        match self.clips.get_mut(&container) {
            Some(c) => {
                self.released.extend(c.picture.replace(picture));
                true
            }
            None => false,
        }
    }

    /// Stores a recorded picture; returns `false` if the entry is gone.
    pub(crate) fn set_client_picture(
        &mut self,
        container: u32,
        client: u32,
        picture: PictureId,
    ) -> bool {
        let slot = match self.per_client.get_mut(&(container, client)) {
            Some(ClientArtifact::Pattern(p)) => &mut p.picture,
            Some(ClientArtifact::Mask(m)) => &mut m.picture,
            _ => return false,
        };
        self.released.extend(slot.replace(picture));
        true
    }

    // -- Eviction --

    /// Drops everything derived from `container`.
    pub(crate) fn remove_container(&mut self, container: u32) {
        if let Some(old) = self.clips.remove(&container) {
            self.released.extend(old.picture);
        }
        let released = &mut self.released;
        self.per_client.retain(|&(c, _), a| {
            let keep = c != container;
            if !keep {
                released.extend(a.picture());
            }
            keep
        });
    }

    /// Drops every per-client entry of `client`.
    pub(crate) fn remove_client(&mut self, client: u32) {
        let released = &mut self.released;
        self.per_client.retain(|&(_, k), a| {
            let keep = k != client;
            if !keep {
                released.extend(a.picture());
            }
            keep
        });
    }

    /// Drops the entry for one `(container, client)` pair.
    pub(crate) fn remove_pair(&mut self, container: u32, client: u32) {
        if let Some(old) = self.per_client.remove(&(container, client)) {
            self.released.extend(old.picture());
        }
    }

    /// Drops everything keyed by `idx` in either position.
    pub(crate) fn remove_node(&mut self, idx: u32) {
        self.remove_container(idx);
        self.remove_client(idx);
    }

    /// Takes the pictures no entry refers to any more.
    pub(crate) fn take_released(&mut self) -> Vec<PictureId> {
        core::mem::take(&mut self.released)
    }
}

impl RenderTree {
    /// Stores the recorded mask fallback of a clipPath.
    ///
    /// Returns `false` if the clip content was invalidated in the meantime;
    /// the caller then releases the picture itself.
    pub fn set_clip_picture(&mut self, container: NodeId, picture: PictureId) -> bool {
        self.validate(container);
        self.artifacts.set_clip_picture(container.idx, picture)
    }

    /// Stores the recorded content of a pattern tile or mask for one client.
    ///
    /// Returns `false` if the entry was invalidated in the meantime.
    pub fn set_client_picture(&mut self, container: NodeId, client: NodeId, picture: PictureId) -> bool {
        self.validate(container);
        self.validate(client);
        self.artifacts
            .set_client_picture(container.idx, client.idx, picture)
    }

    /// Returns whether an artifact derived from `container` is cached for
    /// `client`.
    #[must_use]
    pub fn has_cached_artifact(&self, container: NodeId, client: NodeId) -> bool {
        self.validate(container);
        self.validate(client);
        self.artifacts.has_client_entry(container.idx, client.idx)
            || self.artifacts.clip(container.idx).is_some()
    }

    /// Takes the recorded pictures that no cached artifact refers to any
    /// more, for the paint backend to free.
    pub fn take_released_pictures(&mut self) -> Vec<PictureId> {
        self.artifacts.take_released()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(picture: Option<PictureId>) -> MaskContent {
        MaskContent {
            region: Rect::new(0.0, 0.0, 1.0, 1.0),
            content_transform: Affine::IDENTITY,
            picture,
        }
    }

    #[test]
    fn per_client_entries_are_independent() {
        let mut a = Artifacts::new();
        a.insert_mask(1, 10, mask(Some(PictureId(7))));
        a.insert_mask(1, 11, mask(Some(PictureId(8))));
        a.remove_client(11);
        assert!(a.has_client_entry(1, 10));
        assert!(!a.has_client_entry(1, 11));
        assert_eq!(a.take_released(), &[PictureId(8)]);
    }

    #[test]
    fn container_eviction_releases_pictures() {
        let mut a = Artifacts::new();
        a.insert_clip(
            1,
            ClipContent {
                path: None,
                fill_rule: Fill::NonZero,
                bounds: None,
                picture: Some(PictureId(1)),
            },
        );
        a.insert_mask(1, 10, mask(None));
        assert!(a.set_client_picture(1, 10, PictureId(2)));
        a.remove_container(1);
        assert!(a.clip(1).is_none());
        assert!(!a.has_client_entry(1, 10));
        let mut released = a.take_released();
        released.sort_by_key(|p| p.0);
        assert_eq!(released, &[PictureId(1), PictureId(2)]);
        assert!(!a.set_clip_picture(1, PictureId(3)), "entry is gone");
    }
}
