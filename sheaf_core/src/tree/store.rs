// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and property management.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, Size, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;
use crate::resource::{
    Artifacts, ContainerState, InvalidationMode, ResourceCache, ResourceRegistry, SvgResources,
};
use crate::style::{ComputedStyle, StyleDifference};

use super::geometry::NodeGeometry;
use super::id::{INVALID, LayerKey, NodeId};
use super::kind::NodeKind;
use super::traverse::{Ancestors, Children, ChildrenRev};

/// Per-node layout state.
///
/// All flags except [`ever_laid_out`](Self::ever_laid_out) are false after a
/// completed [`RenderTree::layout`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayoutFlags {
    /// The node or one of its descendants needs layout.
    ///
    /// Set on the mutated node immediately; ancestors pick it up when the
    /// layout pass drains the layout channel.
    pub needs_layout: bool,
    /// The node's own geometry must be recomputed.
    pub self_needs_layout: bool,
    /// The node's bounding boxes must be recomputed.
    pub needs_boundaries_update: bool,
    /// The node's local-to-parent transform must be recomputed.
    pub needs_transform_update: bool,
    /// The node has completed at least one layout.
    pub ever_laid_out: bool,
}

/// The box of the surrounding layout that hosts a [`NodeKind::Root`].
///
/// This is the only source of the local-to-border-box transform inserted
/// between the outermost SVG user space and host space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostBox {
    /// Border-box origin in host space.
    pub location: Point,
    /// Offset of the content box inside the border box.
    pub content_offset: Vec2,
    /// Content-box size, in CSS pixels before zoom.
    pub content_size: Size,
    /// Page zoom.
    pub zoom: f64,
}

impl Default for HostBox {
    fn default() -> Self {
        Self {
            location: Point::ZERO,
            content_offset: Vec2::ZERO,
            content_size: Size::new(300.0, 150.0),
            zoom: 1.0,
        }
    }
}

/// Runtime knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeConfig {
    /// Flattening tolerance used when testing points against stroke outlines.
    pub hit_test_tolerance: f64,
    /// Upper bound on layout passes run by one [`RenderTree::layout`] call
    /// while resource invalidation keeps marking nodes dirty.
    pub max_layout_passes: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            hit_test_tolerance: 0.1,
            max_layout_passes: 4,
        }
    }
}

/// Struct-of-arrays storage for the render tree.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// The tree also owns the document-wide [`ResourceRegistry`], the per-client
/// [`ResourceCache`] and every derived resource artifact, so their lifecycles
/// match the document's.
#[derive(Debug)]
pub struct RenderTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Properties (set by callers) --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) style: Vec<ComputedStyle>,
    pub(crate) transform: Vec<Affine>,

    // -- Computed (written by layout) --
    pub(crate) object_bbox: Vec<Option<Rect>>,
    pub(crate) stroke_bbox: Vec<Option<Rect>>,
    pub(crate) visual_rect: Vec<Option<Rect>>,
    pub(crate) local_to_parent: Vec<Affine>,
    pub(crate) viewport_clip: Vec<Option<Rect>>,
    pub(crate) child_viewport: Vec<Size>,
    pub(crate) scale: Vec<f64>,
    pub(crate) geometry: Vec<NodeGeometry>,
    pub(crate) flags: Vec<LayoutFlags>,

    // -- Resources --
    pub(crate) containers: Vec<Option<ContainerState>>,
    pub(crate) registry: ResourceRegistry,
    pub(crate) cache: ResourceCache,
    pub(crate) artifacts: Artifacts,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Host and configuration --
    pub(crate) host: HostBox,
    pub(crate) config: TreeConfig,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
    pub(crate) pending_layers: Vec<LayerKey>,
    pub(crate) pending_damage: Vec<Rect>,
    pub(crate) pass_index: u64,
    #[cfg(feature = "trace")]
    pub(crate) pending_trace: crate::trace::PendingTrace,
}

impl Default for RenderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTree {
    /// Creates an empty tree with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Creates an empty tree.
    #[must_use]
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            style: Vec::new(),
            transform: Vec::new(),
            object_bbox: Vec::new(),
            stroke_bbox: Vec::new(),
            visual_rect: Vec::new(),
            local_to_parent: Vec::new(),
            viewport_clip: Vec::new(),
            child_viewport: Vec::new(),
            scale: Vec::new(),
            geometry: Vec::new(),
            flags: Vec::new(),
            containers: Vec::new(),
            registry: ResourceRegistry::new(),
            cache: ResourceCache::new(),
            artifacts: Artifacts::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            host: HostBox::default(),
            config,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            pending_layers: Vec::new(),
            pending_damage: Vec::new(),
            pass_index: 0,
            #[cfg(feature = "trace")]
            pending_trace: crate::trace::PendingTrace::default(),
        }
    }

    // -- Allocation API --

    /// Creates a detached node and returns its handle.
    ///
    /// A [`NodeKind::Root`] is attached as soon as it exists; any other node
    /// joins the document (resolving its resource references and, for
    /// resource containers, registering its id) once it is appended under an
    /// attached parent.
    pub fn create_node(&mut self, kind: NodeKind, style: ComputedStyle) -> NodeId {
        let container = kind.resource_type().map(|_| ContainerState::default());
        let is_root = matches!(kind, NodeKind::Root(_));
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.kind[i] = kind;
            self.style[i] = style;
            self.transform[i] = Affine::IDENTITY;
            self.object_bbox[i] = None;
            self.stroke_bbox[i] = None;
            self.visual_rect[i] = None;
            self.local_to_parent[i] = Affine::IDENTITY;
            self.viewport_clip[i] = None;
            self.child_viewport[i] = Size::ZERO;
            self.scale[i] = 1.0;
            self.geometry[i] = NodeGeometry::None;
            self.flags[i] = LayoutFlags::default();
            self.containers[i] = container;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.style.push(style);
            self.transform.push(Affine::IDENTITY);
            self.object_bbox.push(None);
            self.stroke_bbox.push(None);
            self.visual_rect.push(None);
            self.local_to_parent.push(Affine::IDENTITY);
            self.viewport_clip.push(None);
            self.child_viewport.push(Size::ZERO);
            self.scale.push(1.0);
            self.geometry.push(NodeGeometry::None);
            self.flags.push(LayoutFlags::default());
            self.containers.push(container);
            self.generation.push(0);
            idx
        };

        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.mark_needs_transform_update(idx);
        if is_root {
            self.client_was_added_to_tree(idx);
        }

        self.id_at(idx)
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// The node is detached from its parent first. If it is a resource
    /// container, its clients are invalidated and re-resolved.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.detach(idx);
        } else if self.is_attached_idx(idx) {
            self.client_will_be_removed_from_tree(idx);
        }
        self.client_destroyed(idx);
        self.containers[idx as usize] = None;
        self.artifacts.remove_node(idx);

        // Remove dirty tracking dependencies.
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;

        self.free_list.push(idx);
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// If `parent` is attached, the resource cache is told about every node
    /// in `child`'s subtree.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, if
    /// `parent` cannot have children, or if `child` is `parent` or one of its
    /// ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        self.check_can_adopt(p, c);

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.did_attach(p, c);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, `sibling`
    /// has no parent, or `child` is an ancestor of `sibling`.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        self.check_can_adopt(p, c);

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.did_attach(p, c);
    }

    /// Removes `child` from its parent.
    ///
    /// The old visual rect of `child` is reported as damage by the next
    /// layout.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_child(&mut self, child: NodeId) {
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] != INVALID,
            "node has no parent"
        );
        self.detach(child.idx);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a node, last first.
    #[must_use]
    pub fn children_rev(&self, id: NodeId) -> ChildrenRev<'_> {
        self.validate(id);
        ChildrenRev::new(self, id.idx)
    }

    /// Returns an iterator over the strict ancestors of a node, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, id.idx)
    }

    /// Returns the parentless live nodes.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        (0..self.len)
            .filter(|&idx| self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx))
            .map(|idx| self.id_at(idx))
            .collect()
    }

    /// Returns whether the node belongs to a document, that is, whether its
    /// topmost ancestor is a [`NodeKind::Root`].
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.validate(id);
        self.is_attached_idx(id.idx)
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    /// Returns the computed style of a node.
    #[must_use]
    pub fn style(&self, id: NodeId) -> &ComputedStyle {
        self.validate(id);
        &self.style[id.idx as usize]
    }

    /// Returns the node's own transform attribute.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> Affine {
        self.validate(id);
        self.transform[id.idx as usize]
    }

    /// Returns the layout flags of a node.
    #[must_use]
    pub fn layout_flags(&self, id: NodeId) -> LayoutFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the geometry-only bounding box in the node's user space.
    ///
    /// Empty before the first layout and for degenerate nodes.
    #[must_use]
    pub fn object_bounding_box(&self, id: NodeId) -> Rect {
        self.validate(id);
        self.object_bbox[id.idx as usize].unwrap_or(Rect::ZERO)
    }

    /// Returns the stroke-inclusive bounding box in the node's user space.
    ///
    /// Always contains the [object bounding box](Self::object_bounding_box).
    #[must_use]
    pub fn stroke_bounding_box(&self, id: NodeId) -> Rect {
        self.validate(id);
        self.stroke_bbox[id.idx as usize].unwrap_or(Rect::ZERO)
    }

    /// Returns the paint-invalidation rect in the node's user space, after
    /// filter, clip and mask adjustment.
    #[must_use]
    pub fn local_visual_rect(&self, id: NodeId) -> Rect {
        self.validate(id);
        self.visual_rect[id.idx as usize].unwrap_or(Rect::ZERO)
    }

    /// Returns whether the node has no renderable geometry.
    #[must_use]
    pub fn is_degenerate(&self, id: NodeId) -> bool {
        self.validate(id);
        self.object_bbox[id.idx as usize].is_none()
    }

    /// Returns the viewport clip the node applies to its children, in the
    /// children's coordinate space.
    #[must_use]
    pub fn viewport_clip(&self, id: NodeId) -> Option<Rect> {
        self.validate(id);
        self.viewport_clip[id.idx as usize]
    }

    /// Returns the viewport size the node's children resolve percentages
    /// against.
    #[must_use]
    pub fn child_viewport_size(&self, id: NodeId) -> Size {
        self.validate(id);
        self.child_viewport[id.idx as usize]
    }

    /// Returns the screen scaling factor the node was last laid out at.
    #[must_use]
    pub fn screen_scale(&self, id: NodeId) -> f64 {
        self.validate(id);
        self.scale[id.idx as usize]
    }

    /// Returns the kind-specific layout output.
    #[must_use]
    pub fn geometry(&self, id: NodeId) -> &NodeGeometry {
        self.validate(id);
        &self.geometry[id.idx as usize]
    }

    /// Returns the resolved resource record of a client, if it references any
    /// resolved resource.
    #[must_use]
    pub fn resources(&self, id: NodeId) -> Option<&SvgResources> {
        self.validate(id);
        self.cache.get(id.idx)
    }

    /// Returns the document-wide resource registry.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Returns the host box.
    #[must_use]
    pub fn host_box(&self) -> HostBox {
        self.host
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// Returns the number of completed layout passes.
    #[must_use]
    pub fn pass_index(&self) -> u64 {
        self.pass_index
    }

    // -- Mutation API (auto-marks dirty) --

    /// Replaces the computed style of a node.
    ///
    /// The change is classified with [`ComputedStyle::diff`]: repaint-only
    /// changes request a repaint, layout changes rebuild the node's resource
    /// record and mark it for layout. Resource containers fan the change out
    /// to their clients.
    pub fn set_style(&mut self, id: NodeId, style: ComputedStyle) -> StyleDifference {
        self.validate(id);
        let idx = id.idx;
        let diff = self.style[idx as usize].diff(&style);
        self.style[idx as usize] = style;
        match diff {
            StyleDifference::Equal => {}
            StyleDifference::Repaint => {
                self.dirty.mark(idx, dirty::PAINT);
                self.invalidate_own_clients(idx, InvalidationMode::Repaint);
                self.invalidate_enclosing_resource(idx, InvalidationMode::Repaint);
            }
            StyleDifference::Layout => {
                self.mark_needs_layout(idx);
                if self.is_attached_idx(idx) {
                    self.client_style_changed(idx, diff);
                }
                self.invalidate_own_clients(idx, InvalidationMode::LayoutAndBoundaries);
                self.invalidate_enclosing_resource(idx, InvalidationMode::LayoutAndBoundaries);
            }
        }
        diff
    }

    /// Replaces the kind payload of a node.
    ///
    /// A resource container whose id changes invalidates its clients,
    /// deregisters from the old id and registers under the new one.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or if the node has children and the new
    /// kind cannot have any.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            kind.is_container() || self.first_child[idx as usize] == INVALID,
            "cannot give a node with children a leaf kind"
        );
        let attached = self.is_attached_idx(idx);
        let was_container = self.containers[idx as usize].is_some();
        let same_id = match (&self.kind[idx as usize], &kind) {
            (NodeKind::Resource(old), NodeKind::Resource(new)) => old.id == new.id,
            _ => false,
        };

        if was_container && !same_id {
            if attached {
                self.deregister_container(idx);
            }
            self.artifacts.remove_container(idx);
        }

        let is_container = kind.resource_type().is_some();
        self.kind[idx as usize] = kind;

        if is_container && !was_container {
            self.containers[idx as usize] = Some(ContainerState::default());
        } else if !is_container && was_container {
            self.containers[idx as usize] = None;
        }

        self.mark_needs_layout(idx);
        if attached {
            // Href targets live in the kind payload.
            self.client_style_changed(idx, StyleDifference::Layout);
        }
        if is_container {
            if same_id {
                self.invalidate_own_clients(idx, InvalidationMode::LayoutAndBoundaries);
            } else if attached {
                self.register_container(idx);
            }
        }
        self.invalidate_enclosing_resource(idx, InvalidationMode::LayoutAndBoundaries);
    }

    /// Sets the node's own transform attribute.
    pub fn set_transform(&mut self, id: NodeId, transform: Affine) {
        self.validate(id);
        let idx = id.idx;
        self.transform[idx as usize] = transform;
        self.mark_needs_transform_update(idx);
        self.invalidate_own_clients(idx, InvalidationMode::LayoutAndBoundaries);
        self.invalidate_enclosing_resource(idx, InvalidationMode::LayoutAndBoundaries);
    }

    /// Sets the host box of every [`NodeKind::Root`] and marks them for
    /// layout.
    pub fn set_host_box(&mut self, host: HostBox) {
        if self.host == host {
            return;
        }
        self.host = host;
        for idx in 0..self.len {
            if matches!(self.kind[idx as usize], NodeKind::Root(_))
                && !self.free_list.contains(&idx)
            {
                self.mark_needs_transform_update(idx);
            }
        }
    }

    /// Replaces the configuration.
    pub fn set_config(&mut self, config: TreeConfig) {
        self.config = config;
    }

    // -- Layout marking --

    /// Marks the node's own geometry dirty.
    pub(crate) fn mark_needs_layout(&mut self, idx: u32) {
        let f = &mut self.flags[idx as usize];
        f.needs_layout = true;
        f.self_needs_layout = true;
        f.needs_boundaries_update = true;
        self.dirty.mark_with(idx, dirty::LAYOUT, &EagerPolicy);
    }

    /// Marks the node's bounding boxes dirty without touching its geometry.
    pub(crate) fn mark_needs_boundaries_update(&mut self, idx: u32) {
        let f = &mut self.flags[idx as usize];
        f.needs_layout = true;
        f.needs_boundaries_update = true;
        self.dirty.mark_with(idx, dirty::LAYOUT, &EagerPolicy);
    }

    /// Marks the node's transform dirty, which implies its boundaries.
    pub(crate) fn mark_needs_transform_update(&mut self, idx: u32) {
        let f = &mut self.flags[idx as usize];
        f.needs_layout = true;
        f.self_needs_layout = true;
        f.needs_transform_update = true;
        f.needs_boundaries_update = true;
        self.dirty.mark_with(idx, dirty::LAYOUT, &EagerPolicy);
    }

    // -- Internal helpers --

    /// Returns the live handle for slot `idx`.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    pub(crate) fn is_attached_idx(&self, idx: u32) -> bool {
        let mut top = idx;
        while self.parent[top as usize] != INVALID {
            top = self.parent[top as usize];
        }
        matches!(self.kind[top as usize], NodeKind::Root(_))
    }

    /// Returns `idx` and its descendants in pre-order.
    pub(crate) fn subtree(&self, idx: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![idx];
        while let Some(n) = stack.pop() {
            out.push(n);
            let mark = stack.len();
            let mut child = self.first_child[n as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
            // Reverse so the first child pops first.
            stack[mark..].reverse();
        }
        out
    }

    /// Returns the nearest strict ancestor that is a resource container.
    pub(crate) fn enclosing_resource(&self, idx: u32) -> Option<u32> {
        let mut p = self.parent[idx as usize];
        while p != INVALID {
            if self.containers[p as usize].is_some() {
                return Some(p);
            }
            p = self.parent[p as usize];
        }
        None
    }

    fn check_can_adopt(&self, p: u32, c: u32) {
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            self.kind[p as usize].is_container(),
            "{} node cannot have children",
            self.kind[p as usize].name()
        );
        assert!(
            !matches!(self.kind[c as usize], NodeKind::Root(_)),
            "root node cannot be a child"
        );
        let mut a = p;
        while a != INVALID {
            assert!(a != c, "cannot adopt an ancestor");
            a = self.parent[a as usize];
        }
    }

    /// Bookkeeping shared by `append_child` and `insert_before`.
    fn did_attach(&mut self, p: u32, c: u32) {
        // A container's bounding boxes depend on its children.
        let added = self.dirty.add_dependency(p, c, dirty::LAYOUT);
        debug_assert!(added.is_ok(), "layout dependency cycle at #{p}");

        for n in self.subtree(c) {
            self.mark_needs_transform_update(n);
        }
        self.dirty.mark(p, dirty::TOPOLOGY);

        if self.is_attached_idx(p) {
            for n in self.subtree(c) {
                self.client_was_added_to_tree(n);
            }
        }
        self.invalidate_content_change(p);
    }

    /// Detaches `c` from its parent, notifying the resource cache first.
    fn detach(&mut self, c: u32) {
        let p = self.parent[c as usize];
        if self.is_attached_idx(c) {
            for n in self.subtree(c) {
                self.client_will_be_removed_from_tree(n);
            }
        }
        if let Some(r) = self.absolute_visual_rect_idx(c) {
            self.pending_damage.push(r);
        }

        self.unlink_from_parent(c);
        self.dirty.remove_dependency(p, c, dirty::LAYOUT);

        self.mark_needs_boundaries_update(p);
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.invalidate_content_change(p);
    }

    /// A child of `p` was added or removed.
    fn invalidate_content_change(&mut self, p: u32) {
        if self.containers[p as usize].is_some() {
            self.invalidate_own_clients(p, InvalidationMode::LayoutAndBoundaries);
        }
        self.invalidate_enclosing_resource(p, InvalidationMode::LayoutAndBoundaries);
    }

    /// Fans out from `idx` if it is a resource container.
    pub(crate) fn invalidate_own_clients(&mut self, idx: u32, mode: InvalidationMode) {
        if self.containers[idx as usize].is_some() {
            self.artifacts.remove_container(idx);
            self.mark_all_clients_for_invalidation_idx(idx, mode);
        }
    }

    /// Fans out from the resource container whose content contains `idx`.
    pub(crate) fn invalidate_enclosing_resource(&mut self, idx: u32, mode: InvalidationMode) {
        if let Some(container) = self.enclosing_resource(idx) {
            self.artifacts.remove_container(container);
            self.mark_all_clients_for_invalidation_idx(container, mode);
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::style::SvgPaint;
    use crate::tree::{RootData, ShapeGeometry};

    fn shape() -> NodeKind {
        NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn create_and_destroy() {
        let mut tree = RenderTree::new();
        let id = tree.create_node(NodeKind::Group, ComputedStyle::default());
        assert!(tree.is_alive(id));
        tree.destroy_node(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = RenderTree::new();
        let id1 = tree.create_node(NodeKind::Group, ComputedStyle::default());
        tree.destroy_node(id1);
        let id2 = tree.create_node(NodeKind::Group, ComputedStyle::default());
        // id2 reuses the same slot but has a different generation.
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn append_and_query_children() {
        let mut tree = RenderTree::new();
        let g = tree.create_node(NodeKind::Group, ComputedStyle::default());
        let a = tree.create_node(shape(), ComputedStyle::default());
        let b = tree.create_node(shape(), ComputedStyle::default());
        tree.append_child(g, a);
        tree.append_child(g, b);

        assert_eq!(tree.parent(a), Some(g));
        let kids: Vec<_> = tree.children(g).collect();
        assert_eq!(kids, vec![a, b]);
        let rev: Vec<_> = tree.children_rev(g).collect();
        assert_eq!(rev, vec![b, a]);
    }

    #[test]
    fn insert_before_first_child() {
        let mut tree = RenderTree::new();
        let g = tree.create_node(NodeKind::Group, ComputedStyle::default());
        let a = tree.create_node(shape(), ComputedStyle::default());
        let b = tree.create_node(shape(), ComputedStyle::default());
        let c = tree.create_node(shape(), ComputedStyle::default());
        tree.append_child(g, a);
        tree.append_child(g, b);
        tree.insert_before(c, a);
        let kids: Vec<_> = tree.children(g).collect();
        assert_eq!(kids, vec![c, a, b]);
    }

    #[test]
    fn remove_child_unlinks() {
        let mut tree = RenderTree::new();
        let g = tree.create_node(NodeKind::Group, ComputedStyle::default());
        let a = tree.create_node(shape(), ComputedStyle::default());
        let b = tree.create_node(shape(), ComputedStyle::default());
        tree.append_child(g, a);
        tree.append_child(g, b);
        tree.remove_child(a);
        assert_eq!(tree.parent(a), None);
        let kids: Vec<_> = tree.children(g).collect();
        assert_eq!(kids, vec![b]);
    }

    #[test]
    fn ancestors_nearest_first() {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let g = tree.create_node(NodeKind::Group, ComputedStyle::default());
        let a = tree.create_node(shape(), ComputedStyle::default());
        tree.append_child(root, g);
        tree.append_child(g, a);
        let up: Vec<_> = tree.ancestors(a).collect();
        assert_eq!(up, vec![g, root]);
        assert!(tree.is_attached(a));
        tree.remove_child(g);
        assert!(!tree.is_attached(a));
    }

    #[test]
    fn subtree_is_pre_order() {
        let mut tree = RenderTree::new();
        let g = tree.create_node(NodeKind::Group, ComputedStyle::default());
        let h = tree.create_node(NodeKind::Group, ComputedStyle::default());
        let a = tree.create_node(shape(), ComputedStyle::default());
        let b = tree.create_node(shape(), ComputedStyle::default());
        tree.append_child(g, h);
        tree.append_child(h, a);
        tree.append_child(g, b);
        assert_eq!(tree.subtree(g.idx), vec![g.idx, h.idx, a.idx, b.idx]);
    }

    #[test]
    fn style_diff_drives_marking() {
        let mut tree = RenderTree::new();
        let a = tree.create_node(shape(), ComputedStyle::default());
        tree.flags[a.idx as usize] = LayoutFlags {
            ever_laid_out: true,
            ..LayoutFlags::default()
        };

        let repaint = ComputedStyle {
            fill_opacity: 0.5,
            ..ComputedStyle::default()
        };
        assert_eq!(tree.set_style(a, repaint), StyleDifference::Repaint);
        assert!(!tree.layout_flags(a).self_needs_layout, "repaint must not relayout");

        let layout = ComputedStyle {
            stroke: SvgPaint::Color(peniko::Color::WHITE),
            ..tree.style(a).clone()
        };
        assert_eq!(tree.set_style(a, layout), StyleDifference::Layout);
        assert!(tree.layout_flags(a).self_needs_layout, "stroke change must relayout");
    }

    #[test]
    fn transform_dirty_implies_boundaries_dirty() {
        let mut tree = RenderTree::new();
        let a = tree.create_node(shape(), ComputedStyle::default());
        tree.flags[a.idx as usize] = LayoutFlags::default();
        tree.set_transform(a, Affine::translate((1.0, 0.0)));
        let f = tree.layout_flags(a);
        assert!(f.needs_transform_update && f.needs_boundaries_update, "{f:?}");
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut tree = RenderTree::new();
        let g = tree.create_node(NodeKind::Group, ComputedStyle::default());
        let a = tree.create_node(shape(), ComputedStyle::default());
        tree.append_child(g, a);
        tree.destroy_node(g);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn stale_id_panics() {
        let mut tree = RenderTree::new();
        let id = tree.create_node(NodeKind::Group, ComputedStyle::default());
        tree.destroy_node(id);
        let _ = tree.kind(id);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_parent_panics() {
        let mut tree = RenderTree::new();
        let g = tree.create_node(NodeKind::Group, ComputedStyle::default());
        let h = tree.create_node(NodeKind::Group, ComputedStyle::default());
        let a = tree.create_node(shape(), ComputedStyle::default());
        tree.append_child(g, a);
        tree.append_child(h, a);
    }

    #[test]
    #[should_panic(expected = "shape node cannot have children")]
    fn leaf_cannot_adopt() {
        let mut tree = RenderTree::new();
        let a = tree.create_node(shape(), ComputedStyle::default());
        let b = tree.create_node(shape(), ComputedStyle::default());
        tree.append_child(a, b);
    }

    #[test]
    #[should_panic(expected = "cannot adopt an ancestor")]
    fn adopting_an_ancestor_panics() {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let g1 = tree.create_node(NodeKind::Group, ComputedStyle::default());
        let g2 = tree.create_node(NodeKind::Group, ComputedStyle::default());
        tree.append_child(root, g1);
        tree.append_child(g1, g2);
        tree.remove_child(g1);
        tree.append_child(g2, g1);
    }

    #[test]
    #[should_panic(expected = "cannot adopt an ancestor")]
    fn adopting_itself_panics() {
        let mut tree = RenderTree::new();
        let g = tree.create_node(NodeKind::Group, ComputedStyle::default());
        tree.append_child(g, g);
    }
}
