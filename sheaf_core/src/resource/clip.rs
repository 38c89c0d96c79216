// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip-path resolution.
//!
//! A clipPath is applied as a path when its content is a set of plain
//! shapes whose union is exact without path booleans: every visible child is
//! a shape without a clip-path of its own, the children share one clip-rule,
//! and their bounding boxes are pairwise disjoint. Anything else (text,
//! nested clipping, overlapping shapes) falls back to masking.

use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Point, Rect, Shape, Size};
use peniko::Fill;
use smallvec::SmallVec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::error::EffectError;
use crate::length::{Length, LengthMode, Units};
use crate::style::{BasicShape, ClipPathRef};
use crate::transform::{bbox_units_transform, checked_inverse};
use crate::tree::{INVALID, NodeGeometry, NodeId, NodeKind, RenderTree};

use super::artifacts::ClipContent;
use super::kinds::ResourceKind;

const BASIC_SHAPE_TOLERANCE: f64 = 0.1;

/// Resolves an inline basic shape against the client's object bounding box.
///
/// Returns the path and its winding rule, or `None` if the shape is
/// degenerate (the client is then clipped away entirely).
#[must_use]
pub fn resolve_basic_shape(shape: &BasicShape, bbox: Rect) -> Option<(BezPath, Fill)> {
    let size = bbox.size();
    let x = |l: Length| bbox.x0 + l.resolve(LengthMode::Width, size);
    let y = |l: Length| bbox.y0 + l.resolve(LengthMode::Height, size);
    match shape {
        BasicShape::Inset {
            top,
            right,
            bottom,
            left,
            round,
        } => {
            let r = Rect::new(
                x(*left),
                y(*top),
                bbox.x1 - right.resolve(LengthMode::Width, size),
                bbox.y1 - bottom.resolve(LengthMode::Height, size),
            );
            if r.width() <= 0.0 || r.height() <= 0.0 {
                return None;
            }
            let radius = round.resolve(LengthMode::Other, size).max(0.0);
            let path = r
                .to_rounded_rect(radius.min(r.width() / 2.0).min(r.height() / 2.0))
                .to_path(BASIC_SHAPE_TOLERANCE);
            Some((path, Fill::NonZero))
        }
        BasicShape::Circle { cx, cy, r } => {
            let r = r.resolve(LengthMode::Other, size);
            (r > 0.0).then(|| {
                let c = kurbo::Circle::new((x(*cx), y(*cy)), r);
                (c.to_path(BASIC_SHAPE_TOLERANCE), Fill::NonZero)
            })
        }
        BasicShape::Ellipse { cx, cy, rx, ry } => {
            let rx = rx.resolve(LengthMode::Width, size);
            let ry = ry.resolve(LengthMode::Height, size);
            (rx > 0.0 && ry > 0.0).then(|| {
                let e = kurbo::Ellipse::new((x(*cx), y(*cy)), (rx, ry), 0.0);
                (e.to_path(BASIC_SHAPE_TOLERANCE), Fill::NonZero)
            })
        }
        BasicShape::Polygon { fill_rule, points } => {
            if points.len() < 3 {
                return None;
            }
            let mut path = BezPath::new();
            for (i, (px, py)) in points.iter().enumerate() {
                let p = Point::new(x(*px), y(*py));
                if i == 0 {
                    path.move_to(p);
                } else {
                    path.line_to(p);
                }
            }
            path.close_path();
            Some((path, *fill_rule))
        }
    }
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

impl RenderTree {
    /// Returns the content of a clipPath, computing and caching it on first
    /// use.
    ///
    /// # Errors
    ///
    /// [`EffectError::MissingResource`] if `container` is not a clipPath, and
    /// [`EffectError::NotLaidOut`] before its first layout.
    pub fn clip_content(&mut self, container: NodeId) -> Result<ClipContent, EffectError> {
        self.validate(container);
        let c = container.idx;
        if !matches!(
            &self.kind[c as usize],
            NodeKind::Resource(r) if matches!(r.kind, ResourceKind::ClipPath(_))
        ) {
            return Err(EffectError::MissingResource);
        }
        if !self.flags[c as usize].ever_laid_out {
            return Err(EffectError::NotLaidOut(container));
        }
        if let Some(cached) = self.artifacts.clip(c) {
            return Ok(cached.clone());
        }

        let mut eligible = self.style[c as usize].clip_path.is_none();
        let mut rule: Option<Fill> = None;
        let mut pieces: Vec<(BezPath, Rect)> = Vec::new();
        let mut bounds: Option<Rect> = None;

        let mut child = self.first_child[c as usize];
        while child != INVALID {
            let i = child as usize;
            child = self.next_sibling[i];
            let style = &self.style[i];
            if !style.is_displayed() || !style.is_visible() {
                continue;
            }
            match &self.kind[i] {
                NodeKind::Shape(_) => {
                    let Some(layout) = self.geometry[i].as_shape() else {
                        continue;
                    };
                    let to_clip = self.local_to_parent[i];
                    let path = to_clip * layout.path.clone();
                    let bbox = path.bounding_box();
                    bounds = Some(bounds.map_or(bbox, |b| b.union(bbox)));
                    if style.clip_path.is_some() {
                        eligible = false;
                    }
                    match rule {
                        None => rule = Some(style.clip_rule),
                        Some(r) if r != style.clip_rule => eligible = false,
                        Some(_) => {}
                    }
                    pieces.push((path, bbox));
                }
                NodeKind::Text(_) => {
                    eligible = false;
                    if let Some(b) = self.object_bbox[i] {
                        let b = self.local_to_parent[i].transform_rect_bbox(b);
                        bounds = Some(bounds.map_or(b, |u| u.union(b)));
                    }
                }
                // Only shapes and text contribute to a clip.
                _ => {}
            }
        }

        if eligible {
            'outer: for (i, (_, a)) in pieces.iter().enumerate() {
                for (_, b) in &pieces[i + 1..] {
                    if overlaps(*a, *b) {
                        eligible = false;
                        break 'outer;
                    }
                }
            }
        }

        let path = eligible.then(|| {
            let mut union = BezPath::new();
            for (p, _) in &pieces {
                union.extend(p.iter());
            }
            union
        });
        log::debug!(
            "clip {c}: {} ({} piece(s))",
            if path.is_some() { "path" } else { "mask" },
            pieces.len()
        );
        let content = ClipContent {
            path,
            fill_rule: rule.unwrap_or(Fill::NonZero),
            bounds,
            picture: None,
        };
        self.artifacts.insert_clip(c, content.clone());
        Ok(content)
    }

    /// Returns the transform from a clipPath's content space to `client`'s
    /// user space.
    ///
    /// # Errors
    ///
    /// [`EffectError::EmptyGeometry`] when the clip uses objectBoundingBox
    /// units and the client's bounding box is empty.
    pub fn clip_transform(&self, container: NodeId, client: NodeId) -> Result<Affine, EffectError> {
        self.validate(container);
        self.validate(client);
        let NodeKind::Resource(data) = &self.kind[container.idx as usize] else {
            return Err(EffectError::MissingResource);
        };
        let ResourceKind::ClipPath(clip) = &data.kind else {
            return Err(EffectError::MissingResource);
        };
        let own = self.transform[container.idx as usize];
        match clip.units {
            Units::UserSpaceOnUse => Ok(own),
            Units::ObjectBoundingBox => {
                let bbox = self.nonempty_bbox(client.idx)?;
                Ok(bbox_units_transform(bbox) * own)
            }
        }
    }

    /// Returns the bounds a clip-path leaves visible, in `client`'s user
    /// space. `None` means no restriction is known.
    pub(crate) fn clip_bounds_for(&self, client: u32) -> Option<Rect> {
        match &self.style[client as usize].clip_path {
            None => None,
            Some(ClipPathRef::Shape(shape)) => {
                let bbox = self.object_bbox[client as usize]?;
                Some(
                    resolve_basic_shape(shape, bbox)
                        .map_or(Rect::ZERO, |(p, _)| p.bounding_box()),
                )
            }
            Some(ClipPathRef::Url(_)) => {
                let container = self.cache.get(client)?.clipper?;
                let transform = self
                    .clip_transform(container, self.id_at(client))
                    .unwrap_or(Affine::scale(0.0));
                let bounds = self.clip_content_bounds(container.idx)?;
                Some(transform.transform_rect_bbox(bounds))
            }
        }
    }

    /// Content bounds of a clipPath without touching the artifact cache.
    fn clip_content_bounds(&self, c: u32) -> Option<Rect> {
        if let Some(cached) = self.artifacts.clip(c) {
            return cached.bounds;
        }
        let mut bounds: Option<Rect> = None;
        let mut child = self.first_child[c as usize];
        while child != INVALID {
            let i = child as usize;
            child = self.next_sibling[i];
            let style = &self.style[i];
            if !style.is_displayed() || !style.is_visible() {
                continue;
            }
            if matches!(self.kind[i], NodeKind::Shape(_) | NodeKind::Text(_)) {
                if let Some(b) = self.object_bbox[i] {
                    let b = self.local_to_parent[i].transform_rect_bbox(b);
                    bounds = Some(bounds.map_or(b, |u| u.union(b)));
                }
            }
        }
        // Nothing visible clips everything away.
        Some(bounds.unwrap_or(Rect::ZERO))
    }

    /// Returns whether `point`, in `client`'s user space, survives the
    /// client's clip-path.
    #[must_use]
    pub fn clip_contains(&self, client: NodeId, point: Point) -> bool {
        self.validate(client);
        let mut visiting: SmallVec<[u32; 4]> = SmallVec::new();
        self.clip_contains_idx(client.idx, point, &mut visiting)
    }

    fn clip_contains_idx(&self, client: u32, point: Point, visiting: &mut SmallVec<[u32; 4]>) -> bool {
        match &self.style[client as usize].clip_path {
            None => true,
            Some(ClipPathRef::Shape(shape)) => self.object_bbox[client as usize]
                .and_then(|bbox| resolve_basic_shape(shape, bbox))
                .is_some_and(|(path, rule)| contains(&path, rule, point)),
            Some(ClipPathRef::Url(_)) => {
                let Some(container) = self.cache.get(client).and_then(|r| r.clipper) else {
                    // Unresolved references do not clip.
                    return true;
                };
                let c = container.idx;
                if visiting.contains(&c) {
                    return false;
                }
                let Some(inverse) = self
                    .clip_transform(container, self.id_at(client))
                    .ok()
                    .and_then(checked_inverse)
                else {
                    return false;
                };
                let local = inverse * point;
                visiting.push(c);
                let inside = self.clip_contains_idx(c, local, visiting)
                    && self.clip_children_contain(c, local, visiting);
                visiting.pop();
                inside
            }
        }
    }

    fn clip_children_contain(&self, c: u32, point: Point, visiting: &mut SmallVec<[u32; 4]>) -> bool {
        let mut child = self.first_child[c as usize];
        while child != INVALID {
            let current = child;
            let i = current as usize;
            child = self.next_sibling[i];
            let style = &self.style[i];
            if !style.is_displayed() || !style.is_visible() {
                continue;
            }
            let Some(inverse) = checked_inverse(self.local_to_parent[i]) else {
                continue;
            };
            let local = inverse * point;
            let hit = match &self.geometry[i] {
                NodeGeometry::Shape(s) => contains(&s.path, style.clip_rule, local),
                _ => {
                    matches!(self.kind[i], NodeKind::Text(_))
                        && self.object_bbox[i].is_some_and(|b| b.contains(local))
                }
            };
            if hit && self.clip_contains_idx(current, local, visiting) {
                return true;
            }
        }
        false
    }

    /// The client's object bounding box, or [`EffectError::EmptyGeometry`].
    pub(crate) fn nonempty_bbox(&self, client: u32) -> Result<Rect, EffectError> {
        match self.object_bbox[client as usize] {
            Some(b) if b.width() > 0.0 && b.height() > 0.0 => Ok(b),
            _ => Err(EffectError::EmptyGeometry),
        }
    }

    /// The viewport size lengths of the node at `idx` resolve against.
    pub(crate) fn viewport_size_of(&self, idx: u32) -> Size {
        let p = self.parent[idx as usize];
        if p == INVALID {
            self.host.content_size
        } else {
            self.child_viewport[p as usize]
        }
    }
}

fn contains(path: &BezPath, rule: Fill, p: Point) -> bool {
    let w = path.winding(p);
    match rule {
        Fill::NonZero => w != 0,
        Fill::EvenOdd => w % 2 != 0,
    }
}
