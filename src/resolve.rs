//! Displacement resolution: the ray sweeps that turn a desired displacement
//! into an applied one.
//!
//! The resolvers are pure with respect to the world: they read it only through
//! a [`RayCaster`] and return clamped displacements instead of mutating the
//! controller. The only thing they write is the [`ContactState`] passed in.

use bevy::prelude::*;

use crate::cast::RayCaster;
use crate::geometry::{RayGeometry, RayOrigins};
use crate::state::ContactState;

/// Minimum horizontal intent that triggers the horizontal sweep.
pub const HORIZONTAL_INTENT_EPSILON: f32 = 0.001;
/// Slack added to the skin width for the horizontal early-exit test.
const HORIZONTAL_TOUCH_EPSILON: f32 = 0.001;
/// Slack added to the skin width for the vertical early-exit test.
const VERTICAL_TOUCH_EPSILON: f32 = 0.0001;
/// Residual upward displacement, while moving down, that indicates the
/// controller is being pushed up a slope.
const SLOPE_RESIDUAL_EPSILON: f32 = 0.0001;
/// Upward intent beyond which the climb handler leaves the displacement
/// untouched (the controller is jumping, not walking into the slope).
const AIRBORNE_DY: f32 = 0.07;
/// Angle (degrees) of the steepest descendable slope, fixing the length of
/// the descent probe ray.
const DESCENT_PROBE_LIMIT: f32 = 75.0;

/// Angle between a surface normal and world up, in degrees.
pub fn angle_to_up(normal: Vec2) -> f32 {
    let cos = normal.normalize_or_zero().dot(Vec2::Y).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// One resolution pass over a controller's ray fans.
///
/// Bundles the frame-constant inputs (ray origins, spacings, limits, the
/// pre-move position) so the individual sweeps take only the displacement and
/// the state they fill in.
pub struct ResolvePass<'a, C: RayCaster> {
    /// Ray query provider for this pass.
    pub caster: &'a C,
    /// Inset box corners at the pass's start position.
    pub origins: RayOrigins,
    /// Precomputed ray spacings.
    pub geometry: RayGeometry,
    /// Skin width of the controller.
    pub skin_width: f32,
    /// Number of rays in the horizontal fan.
    pub horizontal_rays: usize,
    /// Number of rays in the vertical fan.
    pub vertical_rays: usize,
    /// Maximum climbable slope angle, in degrees.
    pub slope_limit: f32,
    /// Controller position before any displacement this frame.
    pub position: Vec2,
}

impl<C: RayCaster> ResolvePass<'_, C> {
    /// Pre-pass for walking down a slope.
    ///
    /// Runs only when the controller moves down and was grounded last frame.
    /// One probe ray from the bottom-span midpoint, long enough to reach a
    /// 75-degree descent, pulls the vertical displacement down to the surface
    /// so the controller hugs the slope instead of staircasing off it.
    pub fn descend_slope(&self, mut delta: Vec2, state: &mut ContactState) -> Vec2 {
        let center_x = (self.origins.bottom_left.x + self.origins.bottom_right.x) / 2.0;
        let half_span = self.origins.bottom_right.x - center_x;
        let probe_length = DESCENT_PROBE_LIMIT.to_radians().tan() * half_span;
        let ray = Vec2::new(center_x, self.origins.bottom_left.y);

        let Some(hit) = self.caster.cast(ray, Vec2::NEG_Y, probe_length) else {
            return delta;
        };

        // Only a slope falling away in the movement direction counts.
        if hit.normal.x.signum() != delta.x.signum() {
            return delta;
        }

        let angle = angle_to_up(hit.normal);
        if angle.abs() < 1e-4 {
            return delta;
        }

        state.moving_down_slope = true;
        state.slope_angle = angle;
        delta.y = hit.point.y - ray.y;
        delta
    }

    /// Horizontal sweep: clamp the horizontal displacement against walls and
    /// delegate walkable slopes to the climb handler.
    ///
    /// Callers should skip this when `|delta.x|` is below
    /// [`HORIZONTAL_INTENT_EPSILON`].
    pub fn resolve_horizontal(&self, mut delta: Vec2, state: &mut ContactState) -> Vec2 {
        let going_right = delta.x > 0.0;
        let mut ray_distance = delta.x.abs() + self.skin_width;
        let direction = if going_right { Vec2::X } else { Vec2::NEG_X };
        let origin = if going_right {
            self.origins.bottom_right
        } else {
            self.origins.bottom_left
        };

        for i in 0..self.horizontal_rays {
            let ray = Vec2::new(
                origin.x,
                origin.y + i as f32 * self.geometry.vertical_spacing,
            );

            let Some(hit) = self.caster.cast(ray, direction, ray_distance) else {
                continue;
            };

            // The bottom ray is the one that can hit a walkable slope.
            if i == 0 {
                let angle = angle_to_up(hit.normal);
                if let Some(climbed) = self.climb_slope(delta, angle, going_right, state) {
                    return climbed;
                }
            }

            delta.x = hit.point.x - ray.x;
            ray_distance = delta.x.abs();

            if going_right {
                delta.x -= self.skin_width;
                state.right = true;
            } else {
                delta.x += self.skin_width;
                state.left = true;
            }

            if ray_distance < self.skin_width + HORIZONTAL_TOUCH_EPSILON {
                break;
            }
        }

        delta
    }

    /// Climb handler for the bottom horizontal ray.
    ///
    /// Returns the adjusted displacement when the hit was a slope interaction
    /// (climbed, blocked, or ignored because the controller is moving up fast
    /// enough to be airborne), or `None` when the surface is a plain wall and
    /// the horizontal sweep should clamp against it.
    fn climb_slope(
        &self,
        mut delta: Vec2,
        angle: f32,
        going_right: bool,
        state: &mut ContactState,
    ) -> Option<Vec2> {
        if angle.round() == 90.0 {
            return None;
        }

        if angle > self.slope_limit {
            delta.x = 0.0;
            return Some(delta);
        }

        if delta.y > AIRBORNE_DY {
            return Some(delta);
        }

        delta.x += if going_right {
            -self.skin_width
        } else {
            self.skin_width
        };
        delta.y = (angle.to_radians().tan() * delta.x).abs();

        state.moving_up_slope = true;
        state.below = true;
        state.slope_angle = angle;

        Some(delta)
    }

    /// Vertical sweep: clamp the vertical displacement against floors and
    /// ceilings and pick the standing-on body.
    ///
    /// Ray origins are shifted by the already-resolved horizontal
    /// displacement. On the downward pass the nearest hit below the pre-move
    /// position wins the standing-on attribution; ties keep the leftmost ray's
    /// body.
    pub fn resolve_vertical(
        &self,
        mut delta: Vec2,
        state: &mut ContactState,
        standing_on: &mut Option<Entity>,
    ) -> Vec2 {
        let going_up = delta.y > 0.0;
        let mut ray_distance = delta.y.abs() + self.skin_width;
        let direction = if going_up { Vec2::Y } else { Vec2::NEG_Y };
        let mut origin = if going_up {
            self.origins.top_left
        } else {
            self.origins.bottom_left
        };
        origin.x += delta.x;

        let mut standing_distance = f32::MAX;

        for i in 0..self.vertical_rays {
            let ray = Vec2::new(
                origin.x + i as f32 * self.geometry.horizontal_spacing,
                origin.y,
            );

            let Some(hit) = self.caster.cast(ray, direction, ray_distance) else {
                continue;
            };

            if !going_up {
                let vertical_distance = self.position.y - hit.point.y;
                if vertical_distance < standing_distance {
                    standing_distance = vertical_distance;
                    *standing_on = hit.body;
                }
            }

            delta.y = hit.point.y - ray.y;
            ray_distance = delta.y.abs();

            if going_up {
                delta.y -= self.skin_width;
                state.above = true;
            } else {
                delta.y += self.skin_width;
                state.below = true;
            }

            if !going_up && delta.y > SLOPE_RESIDUAL_EPSILON {
                state.moving_up_slope = true;
            }

            if ray_distance < self.skin_width + VERTICAL_TOUCH_EPSILON {
                break;
            }
        }

        delta
    }

    /// Push the controller out of platform edges intruding from one side.
    ///
    /// Interior rays (the fan minus its outermost pair) are cast outward from
    /// the box centerline over half the box width, at the already-displaced
    /// position. The last hit wins; its edge sets the corrective offset.
    pub fn correct_placement(&self, mut delta: Vec2, toward_right: bool) -> Vec2 {
        let half_width = self.geometry.half_width;
        let mut origin = if toward_right {
            self.origins.bottom_right
        } else {
            self.origins.bottom_left
        };
        if toward_right {
            origin.x -= half_width - self.skin_width;
        } else {
            origin.x += half_width - self.skin_width;
        }
        let direction = if toward_right { Vec2::X } else { Vec2::NEG_X };

        let mut offset = 0.0;

        for i in 1..self.horizontal_rays.saturating_sub(1) {
            let ray = Vec2::new(
                delta.x + origin.x,
                delta.y + origin.y + i as f32 * self.geometry.vertical_spacing,
            );

            let Some(hit) = self.caster.cast(ray, direction, half_width) else {
                continue;
            };

            offset = if toward_right {
                (hit.point.x - self.position.x) - half_width
            } else {
                half_width - (self.position.x - hit.point.x)
            };
        }

        delta.x += offset;
        delta
    }
}
