// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pattern and gradient resolution.
//!
//! Unset attributes are inherited along the `href` chain recorded in each
//! container's [`linked`](super::SvgResources::linked) slot. Chains are
//! walked with a visited set, so a reference loop simply ends inheritance.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect};
use peniko::Extend;
use smallvec::SmallVec;

use crate::error::EffectError;
use crate::length::{Length, LengthMode, LengthRect, Units};
use crate::transform::bbox_units_transform;
use crate::tree::{INVALID, NodeId, NodeKind, PreserveAspectRatio, RenderTree};

use super::artifacts::{GradientGeometry, GradientShader, PatternTile};
use super::kinds::{GradientData, GradientStop, ResourceKind};

/// A pattern's attributes after `href` inheritance.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPattern {
    /// `patternUnits`.
    pub units: Units,
    /// `patternContentUnits`.
    pub content_units: Units,
    /// Tile rectangle.
    pub region: LengthRect,
    /// `viewBox`.
    pub view_box: Option<Rect>,
    /// `preserveAspectRatio`.
    pub par: PreserveAspectRatio,
    /// `patternTransform`.
    pub transform: Affine,
    /// The first pattern in the chain that has children.
    pub content: NodeId,
}

/// Gradient geometry attributes after inheritance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientShape {
    /// `x1`/`y1`/`x2`/`y2`.
    Linear {
        /// Start x.
        x1: Length,
        /// Start y.
        y1: Length,
        /// End x.
        x2: Length,
        /// End y.
        y2: Length,
    },
    /// `cx`/`cy`/`r`/`fx`/`fy`.
    Radial {
        /// End circle center x.
        cx: Length,
        /// End circle center y.
        cy: Length,
        /// End circle radius.
        r: Length,
        /// Focal x.
        fx: Length,
        /// Focal y.
        fy: Length,
    },
}

/// A gradient's attributes after `href` inheritance.
#[derive(Clone, Debug)]
pub struct ResolvedGradient {
    /// `gradientUnits`.
    pub units: Units,
    /// `gradientTransform`.
    pub transform: Affine,
    /// `spreadMethod`.
    pub spread: Extend,
    /// Stops of the first gradient in the chain that has any.
    pub stops: Vec<GradientStop>,
    /// Geometry.
    pub shape: GradientShape,
}

fn first<T: Copy>(chain: &[&GradientData], f: impl Fn(&GradientData) -> Option<T>) -> Option<T> {
    chain.iter().find_map(|g| f(*g))
}

impl RenderTree {
    /// Returns `container` followed by its `href` ancestors, stopping at the
    /// first repeat.
    fn href_chain(&self, container: u32) -> SmallVec<[u32; 4]> {
        let mut chain: SmallVec<[u32; 4]> = SmallVec::new();
        let mut next = Some(container);
        while let Some(c) = next {
            if chain.contains(&c) {
                log::debug!("href cycle through resource {c}");
                break;
            }
            chain.push(c);
            next = self.cache.get(c).and_then(|r| r.linked).map(|l| l.idx);
        }
        chain
    }

    /// Resolves a pattern's attributes along its `href` chain.
    ///
    /// # Errors
    ///
    /// [`EffectError::MissingResource`] if `container` is not a pattern.
    pub fn resolve_pattern(&self, container: NodeId) -> Result<ResolvedPattern, EffectError> {
        self.validate(container);
        let mut data = Vec::new();
        for c in self.href_chain(container.idx) {
            if let NodeKind::Resource(r) = &self.kind[c as usize] {
                if let ResourceKind::Pattern(p) = &r.kind {
                    data.push((c, p));
                    continue;
                }
            }
            break;
        }
        if data.is_empty() {
            return Err(EffectError::MissingResource);
        }
        let content = data
            .iter()
            .find(|(c, _)| self.first_child[*c as usize] != INVALID)
            .map_or(container.idx, |(c, _)| *c);
        Ok(ResolvedPattern {
            units: data
                .iter()
                .find_map(|(_, p)| p.units)
                .unwrap_or(Units::ObjectBoundingBox),
            content_units: data
                .iter()
                .find_map(|(_, p)| p.content_units)
                .unwrap_or(Units::UserSpaceOnUse),
            region: data
                .iter()
                .find_map(|(_, p)| p.region)
                .unwrap_or(LengthRect::numbers(0.0, 0.0, 0.0, 0.0)),
            view_box: data.iter().find_map(|(_, p)| p.view_box),
            par: data.iter().find_map(|(_, p)| p.par).unwrap_or_default(),
            transform: data
                .iter()
                .find_map(|(_, p)| p.transform)
                .unwrap_or(Affine::IDENTITY),
            content: self.id_at(content),
        })
    }

    /// Resolves a gradient's attributes along its `href` chain.
    ///
    /// Common attributes inherit from any gradient; geometry attributes only
    /// from gradients of the same type.
    ///
    /// # Errors
    ///
    /// [`EffectError::MissingResource`] if `container` is not a gradient.
    pub fn resolve_gradient(&self, container: NodeId) -> Result<ResolvedGradient, EffectError> {
        self.validate(container);
        let mut kinds = Vec::new();
        for c in self.href_chain(container.idx) {
            match &self.kind[c as usize] {
                NodeKind::Resource(r) if r.kind.ty().is_gradient() => kinds.push(&r.kind),
                _ => break,
            }
        }
        let common: Vec<&GradientData> = kinds
            .iter()
            .filter_map(|k| match k {
                ResourceKind::LinearGradient(g) => Some(&g.common),
                ResourceKind::RadialGradient(g) => Some(&g.common),
                _ => None,
            })
            .collect();
        let Some(own) = kinds.first() else {
            return Err(EffectError::MissingResource);
        };

        let shape = match own {
            ResourceKind::LinearGradient(_) => {
                let linear: Vec<_> = kinds
                    .iter()
                    .filter_map(|k| match k {
                        ResourceKind::LinearGradient(g) => Some(g),
                        _ => None,
                    })
                    .collect();
                let pick = |f: fn(&super::kinds::LinearGradientData) -> Option<Length>, d| {
                    linear.iter().find_map(|g| f(*g)).unwrap_or(d)
                };
                GradientShape::Linear {
                    x1: pick(|g| g.x1, Length::Percent(0.0)),
                    y1: pick(|g| g.y1, Length::Percent(0.0)),
                    x2: pick(|g| g.x2, Length::Percent(100.0)),
                    y2: pick(|g| g.y2, Length::Percent(0.0)),
                }
            }
            _ => {
                let radial: Vec<_> = kinds
                    .iter()
                    .filter_map(|k| match k {
                        ResourceKind::RadialGradient(g) => Some(g),
                        _ => None,
                    })
                    .collect();
                let find = |f: fn(&super::kinds::RadialGradientData) -> Option<Length>| {
                    radial.iter().find_map(|g| f(*g))
                };
                let cx = find(|g| g.cx).unwrap_or(Length::Percent(50.0));
                let cy = find(|g| g.cy).unwrap_or(Length::Percent(50.0));
                GradientShape::Radial {
                    cx,
                    cy,
                    r: find(|g| g.r).unwrap_or(Length::Percent(50.0)),
                    fx: find(|g| g.fx).unwrap_or(cx),
                    fy: find(|g| g.fy).unwrap_or(cy),
                }
            }
        };

        Ok(ResolvedGradient {
            units: first(&common, |g| g.units).unwrap_or(Units::ObjectBoundingBox),
            transform: first(&common, |g| g.transform).unwrap_or(Affine::IDENTITY),
            spread: first(&common, |g| g.spread).unwrap_or(Extend::Pad),
            stops: common
                .iter()
                .find(|g| !g.stops.is_empty())
                .map(|g| g.stops.clone())
                .unwrap_or_default(),
            shape,
        })
    }

    /// Returns the gradient shader for one client, computing and caching it
    /// on first use.
    ///
    /// # Errors
    ///
    /// [`EffectError::MissingResource`] if `container` is not a gradient, and
    /// [`EffectError::EmptyGeometry`] if it has no stops or uses
    /// objectBoundingBox units with a client whose bounding box is empty.
    pub fn gradient_shader(
        &mut self,
        container: NodeId,
        client: NodeId,
    ) -> Result<GradientShader, EffectError> {
        self.validate(client);
        let (c, k) = (container.idx, client.idx);
        if let Some(cached) = self.artifacts.gradient(c, k) {
            return Ok(cached.clone());
        }
        let resolved = self.resolve_gradient(container)?;
        if resolved.stops.is_empty() {
            return Err(EffectError::EmptyGeometry);
        }
        let viewport = self.viewport_size_of(k);
        let units = resolved.units;
        let x = |l: Length| l.resolve_in(units, LengthMode::Width, viewport);
        let y = |l: Length| l.resolve_in(units, LengthMode::Height, viewport);
        let geometry = match resolved.shape {
            GradientShape::Linear { x1, y1, x2, y2 } => GradientGeometry::Linear {
                start: Point::new(x(x1), y(y1)),
                end: Point::new(x(x2), y(y2)),
            },
            GradientShape::Radial { cx, cy, r, fx, fy } => GradientGeometry::Radial {
                center: Point::new(x(cx), y(cy)),
                radius: r.resolve_in(units, LengthMode::Other, viewport),
                focus: Point::new(x(fx), y(fy)),
            },
        };
        let transform = match units {
            Units::UserSpaceOnUse => resolved.transform,
            Units::ObjectBoundingBox => bbox_units_transform(self.nonempty_bbox(k)?) * resolved.transform,
        };
        let shader = GradientShader {
            geometry,
            stops: resolved.stops,
            extend: resolved.spread,
            transform,
        };
        self.artifacts.insert_gradient(c, k, shader.clone());
        Ok(shader)
    }

    /// Returns the pattern tile for one client, computing and caching it on
    /// first use.
    ///
    /// # Errors
    ///
    /// [`EffectError::MissingResource`] if `container` is not a pattern,
    /// [`EffectError::NotLaidOut`] before the content's first layout, and
    /// [`EffectError::EmptyGeometry`] for an empty tile or an unusable
    /// bounding box.
    pub fn pattern_tile(&mut self, container: NodeId, client: NodeId) -> Result<PatternTile, EffectError> {
        self.validate(client);
        let (c, k) = (container.idx, client.idx);
        if let Some(cached) = self.artifacts.pattern(c, k) {
            return Ok(cached.clone());
        }
        let resolved = self.resolve_pattern(container)?;
        if !self.flags[resolved.content.idx as usize].ever_laid_out {
            return Err(EffectError::NotLaidOut(resolved.content));
        }
        let needs_bbox = resolved.units == Units::ObjectBoundingBox
            || (resolved.view_box.is_none() && resolved.content_units == Units::ObjectBoundingBox);
        let bbox = if needs_bbox {
            self.nonempty_bbox(k)?
        } else {
            Rect::ZERO
        };
        let tile = resolved
            .region
            .resolve(resolved.units, self.viewport_size_of(k), bbox);
        if tile.width() <= 0.0 || tile.height() <= 0.0 {
            return Err(EffectError::EmptyGeometry);
        }
        let content = if let Some(vb) = resolved.view_box {
            resolved
                .par
                .view_box_transform(vb, tile.size())
                .ok_or(EffectError::EmptyGeometry)?
        } else if resolved.content_units == Units::ObjectBoundingBox {
            Affine::scale_non_uniform(bbox.width(), bbox.height())
        } else {
            Affine::IDENTITY
        };
        let pattern = PatternTile {
            tile,
            content_transform: Affine::translate(tile.origin().to_vec2()) * content,
            transform: resolved.transform,
            content: resolved.content,
            picture: None,
        };
        self.artifacts.insert_pattern(c, k, pattern.clone());
        Ok(pattern)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use peniko::Color;

    use super::*;
    use crate::resource::{LinearGradientData, PatternData, RadialGradientData, ResourceData};
    use crate::style::{ComputedStyle, SvgPaint};
    use crate::tree::{RootData, ShapeGeometry};

    fn stops() -> Vec<GradientStop> {
        vec![
            GradientStop {
                offset: 0.0,
                color: Color::WHITE,
            },
            GradientStop {
                offset: 1.0,
                color: Color::BLACK,
            },
        ]
    }

    fn filled(id: &str) -> ComputedStyle {
        ComputedStyle {
            fill: SvgPaint::Url {
                id: id.to_string(),
                fallback: None,
            },
            ..ComputedStyle::default()
        }
    }

    fn doc() -> (RenderTree, NodeId) {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        (tree, root)
    }

    fn add(tree: &mut RenderTree, parent: NodeId, id: &str, kind: ResourceKind) -> NodeId {
        let n = tree.create_node(
            NodeKind::Resource(ResourceData::new(id, kind)),
            ComputedStyle::default(),
        );
        tree.append_child(parent, n);
        n
    }

    #[test]
    fn gradient_inherits_stops_and_units() {
        let (mut tree, root) = doc();
        add(
            &mut tree,
            root,
            "base",
            ResourceKind::RadialGradient(RadialGradientData {
                common: GradientData {
                    units: Some(Units::UserSpaceOnUse),
                    stops: stops(),
                    ..GradientData::default()
                },
                ..RadialGradientData::default()
            }),
        );
        let g = add(
            &mut tree,
            root,
            "g",
            ResourceKind::LinearGradient(LinearGradientData {
                common: GradientData {
                    href: Some("base".to_string()),
                    ..GradientData::default()
                },
                x2: Some(Length::Number(50.0)),
                ..LinearGradientData::default()
            }),
        );
        let r = tree.resolve_gradient(g).unwrap();
        assert_eq!(r.units, Units::UserSpaceOnUse);
        assert_eq!(r.stops.len(), 2);
        assert_eq!(
            r.shape,
            GradientShape::Linear {
                x1: Length::Percent(0.0),
                y1: Length::Percent(0.0),
                x2: Length::Number(50.0),
                y2: Length::Percent(0.0),
            }
        );
    }

    #[test]
    fn href_cycle_terminates() {
        let (mut tree, root) = doc();
        let a = add(
            &mut tree,
            root,
            "a",
            ResourceKind::Pattern(PatternData {
                href: Some("b".to_string()),
                ..PatternData::default()
            }),
        );
        add(
            &mut tree,
            root,
            "b",
            ResourceKind::Pattern(PatternData {
                href: Some("a".to_string()),
                units: Some(Units::UserSpaceOnUse),
                ..PatternData::default()
            }),
        );
        let r = tree.resolve_pattern(a).unwrap();
        assert_eq!(r.units, Units::UserSpaceOnUse);
        assert_eq!(r.content, a, "no pattern in the chain has children");
    }

    #[test]
    fn bbox_gradient_shader_maps_unit_square() {
        let (mut tree, root) = doc();
        let g = add(
            &mut tree,
            root,
            "g",
            ResourceKind::LinearGradient(LinearGradientData {
                common: GradientData {
                    stops: stops(),
                    ..GradientData::default()
                },
                ..LinearGradientData::default()
            }),
        );
        let shape = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(10.0, 20.0, 100.0, 50.0)),
            filled("g"),
        );
        tree.append_child(root, shape);
        let _ = tree.layout();
        let shader = tree.gradient_shader(g, shape).unwrap();
        assert_eq!(
            shader.geometry,
            GradientGeometry::Linear {
                start: Point::new(0.0, 0.0),
                end: Point::new(1.0, 0.0),
            }
        );
        assert_eq!(shader.transform * Point::new(1.0, 0.0), Point::new(110.0, 20.0));
    }

    #[test]
    fn gradient_without_stops_is_empty() {
        let (mut tree, root) = doc();
        let g = add(
            &mut tree,
            root,
            "g",
            ResourceKind::LinearGradient(LinearGradientData::default()),
        );
        let shape = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 10.0, 10.0)),
            filled("g"),
        );
        tree.append_child(root, shape);
        let _ = tree.layout();
        assert_eq!(
            tree.gradient_shader(g, shape).unwrap_err(),
            EffectError::EmptyGeometry
        );
    }

    #[test]
    fn pattern_content_comes_from_href_target() {
        let (mut tree, root) = doc();
        let base = add(&mut tree, root, "base", ResourceKind::Pattern(PatternData::default()));
        let tile_shape = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 5.0, 5.0)),
            ComputedStyle::default(),
        );
        tree.append_child(base, tile_shape);
        let p = add(
            &mut tree,
            root,
            "p",
            ResourceKind::Pattern(PatternData {
                href: Some("base".to_string()),
                units: Some(Units::UserSpaceOnUse),
                region: Some(LengthRect::numbers(2.0, 3.0, 10.0, 10.0)),
                ..PatternData::default()
            }),
        );
        let shape = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 40.0, 40.0)),
            filled("p"),
        );
        tree.append_child(root, shape);
        let _ = tree.layout();
        let tile = tree.pattern_tile(p, shape).unwrap();
        assert_eq!(tile.content, base);
        assert_eq!(tile.tile, Rect::new(2.0, 3.0, 12.0, 13.0));
        assert_eq!(tile.content_transform, Affine::translate((2.0, 3.0)));
        assert!(tree.artifacts.pattern(p.idx, shape.idx).is_some());
    }
}
