// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filter region and primitive resolution.
//!
//! Primitive evaluation belongs to the paint backend; this module only
//! resolves the region the result occupies and the primitive parameters in
//! the client's user space.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::error::EffectError;
use crate::length::Units;
use crate::tree::{NodeId, NodeKind, RenderTree};

use super::kinds::{FilterData, FilterPrimitive, ResourceKind};

impl RenderTree {
    fn filter_data(&self, container: u32) -> Result<&FilterData, EffectError> {
        match &self.kind[container as usize] {
            NodeKind::Resource(r) => match &r.kind {
                ResourceKind::Filter(f) => Ok(f),
                _ => Err(EffectError::MissingResource),
            },
            _ => Err(EffectError::MissingResource),
        }
    }

    /// Returns the filter region in `client`'s user space.
    ///
    /// # Errors
    ///
    /// [`EffectError::MissingResource`] if `container` is not a filter, and
    /// [`EffectError::EmptyGeometry`] if the filter has no primitives, its
    /// region is empty, or it needs the bounding box of a client that has
    /// none.
    pub fn filter_region(&self, container: NodeId, client: NodeId) -> Result<Rect, EffectError> {
        self.validate(container);
        self.validate(client);
        let data = self.filter_data(container.idx)?;
        if data.primitives.is_empty() {
            return Err(EffectError::EmptyGeometry);
        }
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

    /// Returns the primitives with their parameters in `client`'s user
    /// space.
    ///
    /// Under `primitiveUnits="objectBoundingBox"` lengths scale with the
    /// client's bounding box.
    ///
    /// # Errors
    ///
    /// As for [`filter_region`](Self::filter_region).
    pub fn filter_primitives(
        &self,
        container: NodeId,
        client: NodeId,
    ) -> Result<Vec<FilterPrimitive>, EffectError> {
        self.filter_region(container, client)?;
        let data = self.filter_data(container.idx)?;
        let (sx, sy) = match data.primitive_units {
            Units::UserSpaceOnUse => (1.0, 1.0),
            Units::ObjectBoundingBox => {
                let bbox = self.nonempty_bbox(client.idx)?;
                (bbox.width(), bbox.height())
            }
        };
        Ok(data
            .primitives
            .iter()
            .map(|p| match *p {
                FilterPrimitive::GaussianBlur {
                    std_dev_x,
                    std_dev_y,
                } => FilterPrimitive::GaussianBlur {
                    std_dev_x: std_dev_x * sx,
                    std_dev_y: std_dev_y * sy,
                },
                FilterPrimitive::Offset { dx, dy } => FilterPrimitive::Offset {
                    dx: dx * sx,
                    dy: dy * sy,
                },
                other => other,
            })
            .collect())
    }

    /// Returns the filter region of `client`'s filter, or an empty rectangle
    /// if it cannot be applied. `None` means no resolved filter.
    pub(crate) fn filter_bounds_for(&self, client: u32) -> Option<Rect> {
        let container = self.cache.get(client)?.filter?;
        Some(
            self.filter_region(container, self.id_at(client))
                .unwrap_or(Rect::ZERO),
        )
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;
    use crate::length::LengthRect;
    use crate::resource::ResourceData;
    use crate::style::ComputedStyle;
    use crate::tree::{RootData, ShapeGeometry};

    fn setup(data: FilterData) -> (RenderTree, NodeId, NodeId) {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let filter = tree.create_node(
            NodeKind::Resource(ResourceData::new("f", ResourceKind::Filter(data))),
            ComputedStyle::default(),
        );
        tree.append_child(root, filter);
        let target = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(10.0, 10.0, 20.0, 40.0)),
            ComputedStyle {
                filter: Some("f".to_string()),
                ..ComputedStyle::default()
            },
        );
        tree.append_child(root, target);
        let _ = tree.layout();
        (tree, filter, target)
    }

    #[test]
    fn empty_filter_is_empty_geometry() {
        let (tree, filter, target) = setup(FilterData::default());
        assert_eq!(tree.filter_region(filter, target), Err(EffectError::EmptyGeometry));
        assert_eq!(tree.filter_bounds_for(target.idx), Some(Rect::ZERO));
    }

    #[test]
    fn bbox_primitive_units_scale_parameters() {
        let (tree, filter, target) = setup(FilterData {
            primitive_units: Units::ObjectBoundingBox,
            primitives: vec![FilterPrimitive::GaussianBlur {
                std_dev_x: 0.1,
                std_dev_y: 0.1,
            }],
            ..FilterData::default()
        });
        let region = tree.filter_region(filter, target).unwrap();
        assert_eq!(region, Rect::new(8.0, 6.0, 32.0, 54.0));
        let prims = tree.filter_primitives(filter, target).unwrap();
        let FilterPrimitive::GaussianBlur {
            std_dev_x,
            std_dev_y,
        } = prims[0]
        else {
            panic!("expected a blur, got {prims:?}");
        };
        assert!((std_dev_x - 2.0).abs() < 1e-9 && (std_dev_y - 4.0).abs() < 1e-9);
    }

    #[test]
    fn user_space_region_ignores_the_bbox() {
        let (tree, filter, target) = setup(FilterData {
            units: Units::UserSpaceOnUse,
            region: LengthRect::numbers(0.0, 0.0, 5.0, 5.0),
            primitives: vec![FilterPrimitive::Other(0)],
            ..FilterData::default()
        });
        assert_eq!(
            tree.filter_region(filter, target),
            Ok(Rect::new(0.0, 0.0, 5.0, 5.0))
        );
    }
}
