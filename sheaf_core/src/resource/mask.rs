// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mask resolution.

use kurbo::{Affine, Rect};

use crate::error::EffectError;
use crate::length::Units;
use crate::transform::bbox_units_transform;
use crate::tree::{NodeId, NodeKind, RenderTree};

use super::artifacts::MaskContent;
use super::kinds::{MaskData, ResourceKind};

impl RenderTree {
    fn mask_data(&self, container: u32) -> Result<&MaskData, EffectError> {
        match &self.kind[container as usize] {
            NodeKind::Resource(r) => match &r.kind {
                ResourceKind::Mask(m) => Ok(m),
                _ => Err(EffectError::MissingResource),
            },
            _ => Err(EffectError::MissingResource),
        }
    }

    /// Returns the mask region in `client`'s user space.
    ///
    /// # Errors
    ///
    /// [`EffectError::MissingResource`] if `container` is not a mask, and
    /// [`EffectError::EmptyGeometry`] if the region is empty or needs the
    /// bounding box of a client that has none.
    pub fn mask_region(&self, container: NodeId, client: NodeId) -> Result<Rect, EffectError> {
        self.validate(container);
        self.validate(client);
        let data = self.mask_data(container.idx)?;
        let bbox = match data.units {
            Units::ObjectBoundingBox => self.nonempty_bbox(client.idx)?,
            Units::UserSpaceOnUse => Rect::ZERO,
        };
        let region = data
            .region
            .resolve(data.units, self.viewport_size_of(client.idx), bbox);
        if region.width() <= 0.0 || region.height() <= 0.0 {
            return Err(EffectError::EmptyGeometry);
        }
        Ok(region)
    }

    /// Returns the transform from mask content coordinates to `client`'s
    /// user space.
    ///
    /// # Errors
    ///
    /// As for [`mask_region`](Self::mask_region), for `maskContentUnits`.
    pub fn mask_content_transform(
        &self,
        container: NodeId,
        client: NodeId,
    ) -> Result<Affine, EffectError> {
        self.validate(container);
        self.validate(client);
        match self.mask_data(container.idx)?.content_units {
            Units::UserSpaceOnUse => Ok(Affine::IDENTITY),
            Units::ObjectBoundingBox => Ok(bbox_units_transform(self.nonempty_bbox(client.idx)?)),
        }
    }

    /// Returns the mask content for one client, computing and caching it on
    /// first use.
    ///
    /// # Errors
    ///
    /// [`EffectError::NotLaidOut`] before the mask's first layout, otherwise
    /// as for [`mask_region`](Self::mask_region).
    pub fn mask_content(&mut self, container: NodeId, client: NodeId) -> Result<MaskContent, EffectError> {
        self.validate(container);
        self.validate(client);
        let (c, k) = (container.idx, client.idx);
        self.mask_data(c)?;
        if !self.flags[c as usize].ever_laid_out {
            return Err(EffectError::NotLaidOut(container));
        }
        if let Some(cached) = self.artifacts.mask(c, k) {
            return Ok(cached.clone());
        }
        let content = MaskContent {
            region: self.mask_region(container, client)?,
            content_transform: self.mask_content_transform(container, client)?,
            picture: None,
        };
        self.artifacts.insert_mask(c, k, content.clone());
        Ok(content)
    }

    /// Returns the area a mask can leave visible, in `client`'s user space.
    ///
    /// `None` means the client has no resolved mask. A mask that cannot be
    /// applied yields an empty rectangle.
    pub(crate) fn mask_bounds_for(&self, client: u32) -> Option<Rect> {
        let container = self.cache.get(client)?.masker?;
        let client = self.id_at(client);
        let bounds = self.mask_region(container, client).and_then(|region| {
            let content = self.mask_content_transform(container, client)?;
            let drawn = self.stroke_bbox[container.idx as usize]
                .map_or(Rect::ZERO, |b| content.transform_rect_bbox(b));
            Ok(region.intersect(drawn))
        });
        Some(bounds.unwrap_or(Rect::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::length::LengthRect;
    use crate::resource::ResourceData;
    use crate::style::ComputedStyle;
    use crate::tree::{RootData, ShapeGeometry};
    use alloc::string::ToString;

    fn setup(data: MaskData) -> (RenderTree, NodeId, NodeId) {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let mask = tree.create_node(
            NodeKind::Resource(ResourceData::new("m", ResourceKind::Mask(data))),
            ComputedStyle::default(),
        );
        tree.append_child(root, mask);
        let content = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 50.0, 50.0)),
            ComputedStyle::default(),
        );
        tree.append_child(mask, content);
        let target = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 100.0, 100.0)),
            ComputedStyle {
                mask: Some("m".to_string()),
                ..ComputedStyle::default()
            },
        );
        tree.append_child(root, target);
        (tree, mask, target)
    }

    #[test]
    fn default_region_is_bbox_outset() {
        let (mut tree, mask, target) = setup(MaskData::default());
        let _ = tree.layout();
        let region = tree.mask_region(mask, target).unwrap();
        assert_eq!(region, Rect::new(-10.0, -10.0, 110.0, 110.0));
        let content = tree.mask_content(mask, target).unwrap();
        assert_eq!(content.content_transform, Affine::IDENTITY);
        assert_eq!(
            tree.mask_bounds_for(target.idx),
            Some(Rect::new(0.0, 0.0, 50.0, 50.0))
        );
    }

    #[test]
    fn zero_size_region_is_empty_geometry() {
        let (mut tree, mask, target) = setup(MaskData {
            units: Units::UserSpaceOnUse,
            region: LengthRect::numbers(0.0, 0.0, 0.0, 10.0),
            ..MaskData::default()
        });
        let _ = tree.layout();
        assert_eq!(tree.mask_content(mask, target).unwrap_err(), EffectError::EmptyGeometry);
        assert_eq!(tree.mask_bounds_for(target.idx), Some(Rect::ZERO));
    }

    #[test]
    fn content_is_cached_per_client() {
        let (mut tree, mask, target) = setup(MaskData::default());
        let _ = tree.layout();
        let _ = tree.mask_content(mask, target).unwrap();
        assert!(tree.artifacts.mask(mask.idx, target.idx).is_some());
        tree.set_transform(target, Affine::translate((5.0, 0.0)));
        assert!(
            tree.artifacts.mask(mask.idx, target.idx).is_some(),
            "a client's own transform does not change its user-space mask"
        );
        tree.set_kind(target, NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 10.0, 10.0)));
        let _ = tree.layout();
        assert!(tree.artifacts.mask(mask.idx, target.idx).is_none());
    }

    #[test]
    fn not_laid_out_is_reported() {
        let (mut tree, mask, target) = setup(MaskData::default());
        assert_eq!(
            tree.mask_content(mask, target).unwrap_err(),
            EffectError::NotLaidOut(mask)
        );
    }
}
