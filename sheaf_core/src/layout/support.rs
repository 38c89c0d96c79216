// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node layout.
//!
//! [`RenderTree::layout_node`] is the recursive step of the layout pass. It
//! lays out the resource containers a node references before the node
//! itself, computes the node's local-to-parent transform, its kind-specific
//! geometry and bounding boxes, and for containers recurses into children
//! first and aggregates their boxes afterwards.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, Shape as _, Size};

use crate::length::LengthMode;
use crate::style::{ComputedStyle, Overflow, VectorEffect};
use crate::trace::NodeLayoutEvent;
use crate::transform::{checked_inverse, screen_scaling_factor};
use crate::tree::{
    INVALID, ImagePlacement, LayoutFlags, NodeGeometry, NodeKind, RenderTree, ShapeLayout,
    SpanLayout,
};

use super::LayoutCx;

/// Changes in an ancestor that force descendants to be laid out even if they
/// are not dirty themselves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Force {
    /// The nearest viewport changed size; percentage lengths must be resolved
    /// again.
    pub(crate) viewport: bool,
    /// The screen scaling factor changed; text and non-scaling strokes must
    /// be measured again.
    pub(crate) scale: bool,
}

impl Force {
    fn any(self) -> bool {
        self.viewport || self.scale
    }
}

/// Scale changes smaller than this do not force re-measurement.
const SCALE_EPSILON: f64 = 1e-9;

fn depends_on_scale(kind: &NodeKind, style: &ComputedStyle) -> bool {
    matches!(kind, NodeKind::Text(_) | NodeKind::TextSpan(_))
        || style.vector_effect == VectorEffect::NonScalingStroke
}

fn union(a: Option<Rect>, b: Rect) -> Option<Rect> {
    Some(a.map_or(b, |a| a.union(b)))
}

/// Result of resolving a viewport: the transform from the viewport's content
/// space into its own placement space, the size its content resolves
/// percentages against, and the clip in content space.
struct ResolvedViewport {
    transform: Affine,
    content_size: Size,
    clip: Option<Rect>,
}

fn resolve_viewport(
    view_box: Option<Rect>,
    par: crate::tree::PreserveAspectRatio,
    size: Size,
    overflow: Overflow,
) -> ResolvedViewport {
    if !(size.width > 0.0 && size.height > 0.0) {
        return ResolvedViewport {
            transform: Affine::IDENTITY,
            content_size: size,
            clip: Some(Rect::ZERO),
        };
    }
    let (transform, content_size) = match view_box {
        Some(vb) => match par.view_box_transform(vb, size) {
            Some(t) => (t, vb.size()),
            None => {
                // An empty view box disables rendering of the viewport.
                return ResolvedViewport {
                    transform: Affine::IDENTITY,
                    content_size: Size::ZERO,
                    clip: Some(Rect::ZERO),
                };
            }
        },
        None => (Affine::IDENTITY, size),
    };
    let clip = match overflow {
        Overflow::Visible => None,
        Overflow::Hidden => Some(
            checked_inverse(transform).map_or(Rect::ZERO, |inv| inv.transform_rect_bbox(size.to_rect())),
        ),
    };
    ResolvedViewport {
        transform,
        content_size,
        clip,
    }
}

impl RenderTree {
    /// Lays out the node at `idx` if it is dirty or `force` reaches it.
    ///
    /// `parent_ctm` maps the parent's user space to host space.
    pub(crate) fn layout_node(
        &mut self,
        idx: u32,
        parent_ctm: Affine,
        force: Force,
        cx: &mut LayoutCx<'_, '_>,
    ) {
        let i = idx as usize;
        let dirty = self.flags[i].needs_layout;
        let forced = (force.viewport
            && (self.kind[i].has_relative_lengths() || self.style[i].has_relative_lengths()))
            || (force.scale && depends_on_scale(&self.kind[i], &self.style[i]));
        let passes_through = self.kind[i].is_container() && force.any();
        if !(dirty || forced || passes_through) {
            return;
        }

        let outer = self.containers[i]
            .as_mut()
            .map(|state| core::mem::replace(&mut state.in_layout, true));
        self.layout_resources_if_needed(idx, cx);

        let was_laid_out = self.flags[i].ever_laid_out;
        let old_boxes = (self.object_bbox[i], self.stroke_bbox[i], self.visual_rect[i]);
        let old_local = self.local_to_parent[i];
        let old_child_viewport = self.child_viewport[i];
        let viewport = self.viewport_size_of(idx);

        self.update_local_transform(idx, viewport);
        let ctm = parent_ctm * self.local_to_parent[i];
        let scale = screen_scaling_factor(ctm);
        let scale_changed = !was_laid_out || (scale - self.scale[i]).abs() > SCALE_EPSILON;
        self.scale[i] = scale;

        match &self.kind[i] {
            NodeKind::Shape(_) => self.layout_shape(idx, viewport, scale),
            NodeKind::Image(_) => self.layout_image(idx, viewport),
            NodeKind::ForeignObject(_) => self.layout_foreign_object(idx),
            NodeKind::Text(_) => self.layout_text(idx, viewport, scale, cx),
            // Spans are laid out by their text.
            NodeKind::TextSpan(_) => {}
            NodeKind::Root(_)
            | NodeKind::Viewport(_)
            | NodeKind::Group
            | NodeKind::HiddenContainer
            | NodeKind::Resource(_) => {
                let child_force = Force {
                    viewport: self.child_viewport[i] != old_child_viewport,
                    scale: force.scale || scale_changed,
                };
                self.layout_children(idx, ctm, child_force, cx);
                self.compute_container_bounding_boxes(idx);
            }
        }
        self.update_visual_rect(idx);

        let boundaries_changed =
            old_boxes != (self.object_bbox[i], self.stroke_bbox[i], self.visual_rect[i]);
        if old_boxes.0 != self.object_bbox[i] {
            self.client_layout_changed(idx);
        }
        if boundaries_changed || old_local != self.local_to_parent[i] {
            if was_laid_out {
                if let Some(old) = old_boxes.2 {
                    cx.changes
                        .damage
                        .add((parent_ctm * old_local).transform_rect_bbox(old));
                }
            }
            if let Some(new) = self.visual_rect[i] {
                cx.changes.damage.add(ctm.transform_rect_bbox(new));
            }
        }
        if boundaries_changed {
            cx.changes.boundaries_changed.push(idx);
        }
        cx.changes.laid_out.push(idx);
        cx.tracer.node_layout(&NodeLayoutEvent {
            pass_index: cx.pass_index,
            node_index: idx,
            forced: !dirty,
            boundaries_changed,
        });
        self.flags[i] = LayoutFlags {
            ever_laid_out: true,
            ..LayoutFlags::default()
        };
        if let (Some(outer), Some(state)) = (outer, self.containers[i].as_mut()) {
            state.in_layout = outer;
        }
    }

    fn layout_children(&mut self, idx: u32, ctm: Affine, force: Force, cx: &mut LayoutCx<'_, '_>) {
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.layout_node(child, ctm, force, cx);
            child = next;
        }
    }

    /// Lays out the resource containers the node references, so that their
    /// bounds are current when the node's visual rect is adjusted.
    ///
    /// A container already being laid out further up the stack is skipped,
    /// which breaks reference cycles through container content.
    fn layout_resources_if_needed(&mut self, idx: u32, cx: &mut LayoutCx<'_, '_>) {
        let Some(containers) = self.cache.get(idx).map(|r| r.containers()) else {
            return;
        };
        for container in containers {
            if !self.is_alive(container) {
                continue;
            }
            let ci = container.idx as usize;
            let flags = self.flags[ci];
            if !(flags.needs_layout || !flags.ever_laid_out) {
                continue;
            }
            if !self.containers[ci].as_ref().is_some_and(|state| !state.in_layout) {
                continue;
            }
            // Out of tree order: the container's ancestors may not have
            // resolved their viewports yet.
            self.prepare_ancestors(container.idx);
            let parent = self.parent[ci];
            let parent_ctm = if parent == INVALID {
                Affine::IDENTITY
            } else {
                self.local_to_host_idx(parent)
            };
            self.flags[ci].needs_layout = true;
            self.layout_node(container.idx, parent_ctm, Force::default(), cx);
        }
    }

    /// Resolves the transforms and viewports of never-laid-out ancestors of
    /// `idx`, outermost first.
    fn prepare_ancestors(&mut self, idx: u32) {
        let mut chain: Vec<u32> = Vec::new();
        let mut p = self.parent[idx as usize];
        while p != INVALID {
            chain.push(p);
            p = self.parent[p as usize];
        }
        for &a in chain.iter().rev() {
            if !self.flags[a as usize].ever_laid_out {
                let viewport = self.viewport_size_of(a);
                self.update_local_transform(a, viewport);
            }
        }
    }

    // -- Transforms and viewports --

    /// Computes `local_to_parent`, `viewport_clip` and `child_viewport`.
    fn update_local_transform(&mut self, idx: u32, viewport: Size) {
        let i = idx as usize;
        let own = self.transform[i];
        let overflow = self.style[i].overflow;
        let (local, clip, child_viewport) = match &self.kind[i] {
            NodeKind::Root(d) => {
                let host = self.host;
                let size = Size::new(
                    d.width.resolve(LengthMode::Width, host.content_size),
                    d.height.resolve(LengthMode::Height, host.content_size),
                );
                let vp = resolve_viewport(d.view_box, d.par, size, overflow);
                let to_border_box = Affine::translate(host.location.to_vec2() + host.content_offset)
                    * Affine::scale(host.zoom);
                (to_border_box * own * vp.transform, vp.clip, vp.content_size)
            }
            NodeKind::Viewport(d) => {
                let rect = d.rect.resolve_user(viewport);
                let vp = resolve_viewport(d.view_box, d.par, rect.size(), overflow);
                (
                    own * Affine::translate(rect.origin().to_vec2()) * vp.transform,
                    vp.clip,
                    vp.content_size,
                )
            }
            NodeKind::ForeignObject(d) => {
                let rect = d.rect.resolve_user(viewport);
                let clip = (rect.width() > 0.0 && rect.height() > 0.0).then_some(rect);
                (own, Some(clip.unwrap_or(Rect::ZERO)), viewport)
            }
            // Spans draw in their text's space.
            NodeKind::TextSpan(_) => (Affine::IDENTITY, None, viewport),
            _ => (own, None, viewport),
        };
        self.local_to_parent[i] = local;
        self.viewport_clip[i] = clip;
        self.child_viewport[i] = child_viewport;
    }

    // -- Leaf geometry --

    fn layout_shape(&mut self, idx: u32, viewport: Size, scale: f64) {
        let i = idx as usize;
        let NodeKind::Shape(geometry) = &self.kind[i] else {
            return;
        };
        let style = &self.style[i];
        let Some(path) = geometry.to_path(viewport) else {
            self.object_bbox[i] = None;
            self.stroke_bbox[i] = None;
            self.geometry[i] = NodeGeometry::None;
            return;
        };
        let object = path.bounding_box();
        let stroke = style.has_stroke().then(|| {
            let mut s = style.stroke_style.to_kurbo(viewport);
            if style.vector_effect == VectorEffect::NonScalingStroke {
                s.width /= scale;
            }
            s
        });
        let mut stroke_box = stroke
            .as_ref()
            .map_or(object, |s| geometry.approximate_stroke_bbox(object, s));
        let marker_width = stroke.as_ref().map_or_else(
            || style.stroke_style.width.resolve(LengthMode::Other, viewport),
            |s| s.width,
        );
        let markers = if geometry.supports_markers() {
            self.marker_instances(idx, &path, marker_width)
        } else {
            Vec::new()
        };
        if let Some(m) = self.marker_bounds(&markers) {
            stroke_box = stroke_box.union(m);
        }
        self.object_bbox[i] = Some(object);
        self.stroke_bbox[i] = Some(stroke_box);
        self.geometry[i] = NodeGeometry::Shape(ShapeLayout {
            path,
            stroke,
            markers,
        });
    }

    fn layout_image(&mut self, idx: u32, viewport: Size) {
        let i = idx as usize;
        let NodeKind::Image(data) = &self.kind[i] else {
            return;
        };
        let mut rect = data.rect.resolve_user(viewport);
        if let Some(intrinsic) = data.intrinsic {
            if rect.width() <= 0.0 {
                rect.x1 = rect.x0 + intrinsic.width;
            }
            if rect.height() <= 0.0 {
                rect.y1 = rect.y0 + intrinsic.height;
            }
        }
        if !(rect.width() > 0.0 && rect.height() > 0.0) {
            self.object_bbox[i] = None;
            self.stroke_bbox[i] = None;
            self.geometry[i] = NodeGeometry::None;
            return;
        }
        let placement = data
            .intrinsic
            .and_then(|size| data.par.place(size, rect))
            .map(|(dest, clip)| ImagePlacement {
                dest,
                clip: clip.then_some(rect),
            });
        self.object_bbox[i] = Some(rect);
        self.stroke_bbox[i] = Some(rect);
        self.geometry[i] = placement.map_or(NodeGeometry::None, NodeGeometry::Image);
    }

    fn layout_foreign_object(&mut self, idx: u32) {
        let i = idx as usize;
        // The viewport was resolved with the transform.
        let rect = self.viewport_clip[i].filter(|r| r.width() > 0.0 && r.height() > 0.0);
        self.object_bbox[i] = rect;
        self.stroke_bbox[i] = rect;
        self.geometry[i] = NodeGeometry::None;
    }

    /// Lays out the spans of a text left to right along one baseline.
    fn layout_text(&mut self, idx: u32, viewport: Size, scale: f64, cx: &mut LayoutCx<'_, '_>) {
        let i = idx as usize;
        let NodeKind::Text(data) = &self.kind[i] else {
            return;
        };
        let mut pen = Point::new(
            data.x.resolve(LengthMode::Width, viewport),
            data.y.resolve(LengthMode::Height, viewport),
        );
        let mut bbox: Option<Rect> = None;
        let mut child = self.first_child[i];
        while child != INVALID {
            let span = child;
            let c = span as usize;
            child = self.next_sibling[c];
            let measured = match &self.kind[c] {
                NodeKind::TextSpan(span) if self.style[c].is_displayed() => span
                    .measure(pen, scale)
                    .map(|r| (r, span.scaled_font_size(scale))),
                _ => None,
            };
            let old = self.visual_rect[c];
            self.local_to_parent[c] = Affine::IDENTITY;
            self.child_viewport[c] = viewport;
            self.scale[c] = scale;
            match measured {
                Some((rect, font_size)) => {
                    self.geometry[c] = NodeGeometry::Span(SpanLayout {
                        origin: pen,
                        font_size,
                    });
                    self.object_bbox[c] = Some(rect);
                    self.stroke_bbox[c] = Some(rect);
                    self.visual_rect[c] = Some(rect);
                    bbox = union(bbox, rect);
                    pen.x = rect.x1;
                }
                None => {
                    self.geometry[c] = NodeGeometry::None;
                    self.object_bbox[c] = None;
                    self.stroke_bbox[c] = None;
                    self.visual_rect[c] = None;
                }
            }
            if old != self.visual_rect[c] {
                cx.changes.boundaries_changed.push(span);
            }
            cx.changes.laid_out.push(span);
            self.flags[c] = LayoutFlags {
                ever_laid_out: true,
                ..LayoutFlags::default()
            };
        }
        let style = &self.style[i];
        let half = if style.has_stroke() {
            style.stroke_style.width.resolve(LengthMode::Other, viewport) / 2.0
        } else {
            0.0
        };
        let stroke = bbox.map(|b| b.inflate(half, half));
        self.object_bbox[i] = bbox;
        self.stroke_bbox[i] = stroke;
        self.geometry[i] = NodeGeometry::None;
    }

    // -- Bounding boxes --

    /// Aggregates the children's boxes into the container's.
    ///
    /// Hidden containers, `display: none` children and degenerate children do
    /// not contribute. The visual rect uses each child's resource-adjusted
    /// visual rect, so effects on descendants grow their ancestors.
    fn compute_container_bounding_boxes(&mut self, idx: u32) {
        let i = idx as usize;
        let mut object: Option<Rect> = None;
        let mut stroke: Option<Rect> = None;
        let mut visual: Option<Rect> = None;
        let mut child = self.first_child[i];
        while child != INVALID {
            let c = child as usize;
            child = self.next_sibling[c];
            if self.kind[c].is_hidden_container() || !self.style[c].is_displayed() {
                continue;
            }
            let Some(child_object) = self.object_bbox[c] else {
                continue;
            };
            let t = self.local_to_parent[c];
            object = union(object, t.transform_rect_bbox(child_object));
            stroke = union(
                stroke,
                t.transform_rect_bbox(self.stroke_bbox[c].unwrap_or(child_object)),
            );
            if let Some(v) = self.visual_rect[c] {
                visual = union(visual, t.transform_rect_bbox(v));
            }
        }
        self.object_bbox[i] = object;
        self.stroke_bbox[i] = stroke;
        // Consumed by `update_visual_rect`.
        self.visual_rect[i] = visual;
    }

    /// Computes the visual rect from the stroke box (leaves) or the
    /// aggregated children (containers), then applies resources, viewport
    /// clipping and the outline.
    fn update_visual_rect(&mut self, idx: u32) {
        let i = idx as usize;
        let base = if self.kind[i].is_container() && !matches!(self.kind[i], NodeKind::Text(_)) {
            self.visual_rect[i]
        } else {
            self.stroke_bbox[i]
        };
        let Some(mut rect) = base else {
            self.visual_rect[i] = None;
            return;
        };
        if let Some(clip) = self.viewport_clip[i] {
            rect = rect.intersect(clip);
        }
        if !matches!(self.kind[i], NodeKind::Resource(_)) {
            rect = self.adjust_visual_rect_with_resources(idx, rect);
        }
        if let Some(outline) = self.style[i].outline {
            rect = rect.inflate(outline.width, outline.width);
        }
        self.visual_rect[i] = Some(rect);
    }

    /// Replaces `rect` with the filter region, then narrows it to the clip
    /// and mask bounds.
    pub(crate) fn adjust_visual_rect_with_resources(&self, idx: u32, rect: Rect) -> Rect {
        let mut rect = rect;
        if let Some(filter) = self.filter_bounds_for(idx) {
            rect = filter;
        }
        if let Some(clip) = self.clip_bounds_for(idx) {
            rect = rect.intersect(clip);
        }
        if let Some(mask) = self.mask_bounds_for(idx) {
            rect = rect.intersect(mask);
        }
        rect
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use kurbo::Vec2;

    use super::*;
    use crate::length::{Length, LengthRect};
    use crate::resource::{FilterData, FilterPrimitive, ResourceData, ResourceKind};
    use crate::style::{Display, Outline, StrokeStyle, SvgPaint, Visibility};
    use crate::tree::{
        HostBox, ImageData, NodeId, RootData, ShapeGeometry, TextData, TextSpanData, ViewportData,
    };

    fn rect(x: f64, y: f64, w: f64, h: f64) -> NodeKind {
        NodeKind::Shape(ShapeGeometry::rect(x, y, w, h))
    }

    fn root(tree: &mut RenderTree) -> NodeId {
        tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default())
    }

    fn add(tree: &mut RenderTree, parent: NodeId, kind: NodeKind, style: ComputedStyle) -> NodeId {
        let n = tree.create_node(kind, style);
        tree.append_child(parent, n);
        n
    }

    #[test]
    fn container_box_skips_display_none() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let g = add(&mut tree, r, NodeKind::Group, ComputedStyle::default());
        add(&mut tree, g, rect(0.0, 0.0, 10.0, 10.0), ComputedStyle::default());
        add(
            &mut tree,
            g,
            rect(50.0, 50.0, 10.0, 10.0),
            ComputedStyle {
                display: Display::None,
                ..ComputedStyle::default()
            },
        );
        let _ = tree.layout();
        assert_eq!(tree.object_bounding_box(g), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn container_box_maps_children_and_counts_hidden_visibility() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let g = add(&mut tree, r, NodeKind::Group, ComputedStyle::default());
        let a = add(&mut tree, g, rect(0.0, 0.0, 10.0, 10.0), ComputedStyle::default());
        tree.set_transform(a, Affine::translate((5.0, 5.0)));
        add(
            &mut tree,
            g,
            rect(30.0, 0.0, 10.0, 10.0),
            ComputedStyle {
                visibility: Visibility::Hidden,
                ..ComputedStyle::default()
            },
        );
        add(&mut tree, g, NodeKind::HiddenContainer, ComputedStyle::default());
        let _ = tree.layout();
        assert_eq!(tree.object_bounding_box(g), Rect::new(5.0, 0.0, 40.0, 15.0));
    }

    #[test]
    fn stroke_box_contains_object_box() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let g = add(&mut tree, r, NodeKind::Group, ComputedStyle::default());
        let s = add(
            &mut tree,
            g,
            rect(10.0, 10.0, 20.0, 20.0),
            ComputedStyle {
                stroke: SvgPaint::Color(peniko::Color::BLACK),
                stroke_style: StrokeStyle {
                    width: Length::Number(4.0),
                    ..StrokeStyle::default()
                },
                ..ComputedStyle::default()
            },
        );
        let _ = tree.layout();
        for n in [s, g, r] {
            let object = tree.object_bounding_box(n);
            let stroke = tree.stroke_bounding_box(n);
            assert_eq!(stroke.union(object), stroke, "{n:?}: {stroke:?} vs {object:?}");
        }
        assert!(tree.stroke_bounding_box(s).x0 <= 8.0);
    }

    #[test]
    fn degenerate_shape_is_excluded() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let g = add(&mut tree, r, NodeKind::Group, ComputedStyle::default());
        let empty = add(&mut tree, g, rect(100.0, 100.0, 0.0, 10.0), ComputedStyle::default());
        add(&mut tree, g, rect(0.0, 0.0, 10.0, 10.0), ComputedStyle::default());
        let _ = tree.layout();
        assert!(tree.is_degenerate(empty));
        assert_eq!(tree.object_bounding_box(g), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn percentages_follow_the_host_size() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let s = add(
            &mut tree,
            r,
            NodeKind::Shape(ShapeGeometry::Rect {
                x: Length::ZERO,
                y: Length::ZERO,
                width: Length::Percent(50.0),
                height: Length::Percent(50.0),
                rx: None,
                ry: None,
            }),
            ComputedStyle::default(),
        );
        let _ = tree.layout();
        assert_eq!(tree.object_bounding_box(s), Rect::new(0.0, 0.0, 150.0, 75.0));

        tree.set_host_box(HostBox {
            content_size: Size::new(200.0, 100.0),
            ..HostBox::default()
        });
        let changes = tree.layout();
        assert_eq!(tree.object_bounding_box(s), Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!(changes.boundaries_changed.contains(&s.idx));
    }

    #[test]
    fn inner_viewport_clips_the_visual_rect() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let vp = add(
            &mut tree,
            r,
            NodeKind::Viewport(ViewportData {
                rect: LengthRect::numbers(10.0, 10.0, 20.0, 20.0),
                ..ViewportData::default()
            }),
            ComputedStyle::default(),
        );
        add(&mut tree, vp, rect(0.0, 0.0, 50.0, 50.0), ComputedStyle::default());
        let _ = tree.layout();
        assert_eq!(tree.viewport_clip(vp), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
        assert_eq!(tree.local_visual_rect(vp), Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(
            tree.local_to_parent_transform(vp),
            Affine::translate(Vec2::new(10.0, 10.0))
        );
    }

    #[test]
    fn empty_view_box_disables_rendering() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let vp = add(
            &mut tree,
            r,
            NodeKind::Viewport(ViewportData {
                rect: LengthRect::numbers(0.0, 0.0, 20.0, 20.0),
                view_box: Some(Rect::new(0.0, 0.0, 0.0, 10.0)),
                ..ViewportData::default()
            }),
            ComputedStyle::default(),
        );
        add(&mut tree, vp, rect(0.0, 0.0, 5.0, 5.0), ComputedStyle::default());
        let _ = tree.layout();
        assert_eq!(tree.viewport_clip(vp), Some(Rect::ZERO));
        assert_eq!(tree.local_visual_rect(vp).area(), 0.0);
    }

    #[test]
    fn filter_replaces_the_visual_rect() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        add(
            &mut tree,
            r,
            NodeKind::Resource(ResourceData::new(
                "blur",
                ResourceKind::Filter(FilterData {
                    primitives: vec![FilterPrimitive::GaussianBlur {
                        std_dev_x: 2.0,
                        std_dev_y: 2.0,
                    }],
                    ..FilterData::default()
                }),
            )),
            ComputedStyle::default(),
        );
        let g = add(&mut tree, r, NodeKind::Group, ComputedStyle::default());
        let s = add(
            &mut tree,
            g,
            rect(0.0, 0.0, 100.0, 100.0),
            ComputedStyle {
                filter: Some("blur".to_string()),
                ..ComputedStyle::default()
            },
        );
        let _ = tree.layout();
        let expected = Rect::new(-10.0, -10.0, 110.0, 110.0);
        assert_eq!(tree.local_visual_rect(s), expected);
        assert_eq!(tree.local_visual_rect(g), expected, "effects grow ancestors");
        assert_eq!(tree.object_bounding_box(g), Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn outline_inflates_the_visual_rect() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let s = add(
            &mut tree,
            r,
            rect(10.0, 10.0, 10.0, 10.0),
            ComputedStyle {
                outline: Some(Outline {
                    width: 2.0,
                    color: peniko::Color::BLACK,
                }),
                ..ComputedStyle::default()
            },
        );
        let _ = tree.layout();
        assert_eq!(tree.local_visual_rect(s), Rect::new(8.0, 8.0, 22.0, 22.0));
    }

    #[test]
    fn image_falls_back_to_intrinsic_size() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let img = add(
            &mut tree,
            r,
            NodeKind::Image(ImageData {
                rect: LengthRect::numbers(5.0, 5.0, 0.0, 0.0),
                intrinsic: Some(Size::new(40.0, 20.0)),
                par: crate::tree::PreserveAspectRatio::default(),
                image: None,
            }),
            ComputedStyle::default(),
        );
        let _ = tree.layout();
        assert_eq!(tree.object_bounding_box(img), Rect::new(5.0, 5.0, 45.0, 25.0));
        let NodeGeometry::Image(placement) = tree.geometry(img) else {
            panic!("expected an image placement");
        };
        assert_eq!(placement.dest, Rect::new(5.0, 5.0, 45.0, 25.0));
        assert_eq!(placement.clip, None);
    }

    #[test]
    fn text_relayouts_when_the_scale_changes() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let g = add(&mut tree, r, NodeKind::Group, ComputedStyle::default());
        let text = add(
            &mut tree,
            g,
            NodeKind::Text(TextData {
                x: Length::Number(0.0),
                y: Length::Number(20.0),
            }),
            ComputedStyle::default(),
        );
        let a = add(
            &mut tree,
            text,
            NodeKind::TextSpan(TextSpanData::new("ab", 10.3)),
            ComputedStyle::default(),
        );
        let b = add(
            &mut tree,
            text,
            NodeKind::TextSpan(TextSpanData::new("cd", 10.3)),
            ComputedStyle::default(),
        );
        let _ = tree.layout();
        let before = tree.object_bounding_box(text);
        assert_eq!(tree.object_bounding_box(b).x0, tree.object_bounding_box(a).x1);

        // Scaling the group changes the device font size of the text below.
        tree.set_transform(g, Affine::scale(3.0));
        let changes = tree.layout();
        assert!(changes.laid_out.contains(&text.idx), "text must be forced");
        assert!(changes.laid_out.contains(&a.idx));
        let after = tree.object_bounding_box(text);
        assert!((before.width() - after.width()).abs() > 1e-6, "{before:?} vs {after:?}");
    }

    #[test]
    fn clean_nodes_are_not_laid_out_again() {
        let mut tree = RenderTree::new();
        let r = root(&mut tree);
        let a = add(&mut tree, r, rect(0.0, 0.0, 10.0, 10.0), ComputedStyle::default());
        let b = add(&mut tree, r, rect(20.0, 0.0, 10.0, 10.0), ComputedStyle::default());
        let _ = tree.layout();
        tree.set_transform(a, Affine::translate((1.0, 0.0)));
        let changes = tree.layout();
        assert!(changes.laid_out.contains(&a.idx));
        assert!(changes.laid_out.contains(&r.idx), "ancestors aggregate again");
        assert!(!changes.laid_out.contains(&b.idx));
        assert!(!tree.layout_flags(a).needs_layout);
    }
}
