//! Ray geometry derived from the controller's collision box.
//!
//! [`RayGeometry`] is computed once at initialization (spacings depend only on
//! the box, the ray layout and the entity scale); [`RayOrigins`] is recomputed
//! at the start of every resolution pass because it depends on the current
//! position.

use bevy::prelude::*;

use crate::config::{ConfigError, ControllerBox, RayLayout};

/// Precomputed ray spacings for a controller.
///
/// Added automatically by the initialization system once a controller with a
/// [`ControllerBox`] and a [`RayLayout`] is spawned. Spacings span the
/// skin-inset box: `horizontal_rays` rays divide the vertical edge,
/// `vertical_rays` rays divide the horizontal edge.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct RayGeometry {
    /// Vertical distance between adjacent horizontal-fan rays.
    pub vertical_spacing: f32,
    /// Horizontal distance between adjacent vertical-fan rays.
    pub horizontal_spacing: f32,
    /// Half of the scaled box width, without skin inset. Used as the fixed
    /// range of placement-correction rays.
    pub half_width: f32,
}

impl RayGeometry {
    /// Compute the ray spacings for a box under the given entity scale.
    ///
    /// Scale is taken as absolute per axis, so mirrored entities keep a
    /// positive extent.
    pub fn compute(
        controller_box: &ControllerBox,
        layout: &RayLayout,
        scale: Vec2,
    ) -> Result<Self, ConfigError> {
        if layout.horizontal_rays < 2 || layout.vertical_rays < 2 {
            return Err(ConfigError::TooFewRays {
                horizontal: layout.horizontal_rays,
                vertical: layout.vertical_rays,
            });
        }
        if layout.skin_width <= 0.0 {
            return Err(ConfigError::NonPositiveSkinWidth {
                skin_width: layout.skin_width,
            });
        }

        let scaled = controller_box.size * scale.abs();
        let inset_width = scaled.x - 2.0 * layout.skin_width;
        let inset_height = scaled.y - 2.0 * layout.skin_width;
        if inset_width <= 0.0 || inset_height <= 0.0 {
            return Err(ConfigError::DegenerateCollider {
                width: inset_width,
                height: inset_height,
            });
        }

        Ok(Self {
            vertical_spacing: inset_height / (layout.horizontal_rays - 1) as f32,
            horizontal_spacing: inset_width / (layout.vertical_rays - 1) as f32,
            half_width: scaled.x / 2.0,
        })
    }
}

/// The three box corners rays are fanned out from, inset by the skin width.
///
/// The top-right corner is never needed: upward rays start at the top-left,
/// downward and sideways rays at the bottom corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayOrigins {
    /// Inset top-left corner.
    pub top_left: Vec2,
    /// Inset bottom-left corner.
    pub bottom_left: Vec2,
    /// Inset bottom-right corner.
    pub bottom_right: Vec2,
}

impl RayOrigins {
    /// Compute the inset corners of the box at the given world position.
    ///
    /// The box center offset follows the raw (signed) scale so a mirrored
    /// entity's box flips with it; the extents use absolute scale.
    pub fn compute(
        position: Vec2,
        controller_box: &ControllerBox,
        layout: &RayLayout,
        scale: Vec2,
    ) -> Self {
        let half = controller_box.size * scale.abs() / 2.0;
        let center = position + controller_box.offset * scale;
        let skin = layout.skin_width;

        Self {
            top_left: Vec2::new(center.x - half.x + skin, center.y + half.y - skin),
            bottom_left: Vec2::new(center.x - half.x + skin, center.y - half.y + skin),
            bottom_right: Vec2::new(center.x + half.x - skin, center.y - half.y + skin),
        }
    }
}
