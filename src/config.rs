//! Controller configuration components.
//!
//! This module defines the tunable parameters of the controller: movement
//! limits, slope limit, gravity and jump behavior, the collision box the rays
//! are derived from, and the ray fan layout.

use std::fmt;

use bevy::prelude::*;

/// When the controller is allowed to jump.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JumpBehavior {
    /// Jumping requires ground contact.
    #[default]
    GroundOnly,
    /// Jumping is allowed anywhere, gated only by the jump cooldown
    /// (e.g. while swimming).
    Anywhere,
    /// Jumping is disabled.
    Disabled,
}

/// Movement parameters for a kinematic controller.
///
/// A controller always has exactly one *active* parameter set: either the
/// defaults stored in this component, or an override installed on the
/// controller (see [`KinematicController::set_override_parameters`]).
///
/// [`KinematicController::set_override_parameters`]: crate::controller::KinematicController::set_override_parameters
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ControllerParameters {
    /// Per-axis upper bound on the derived velocity.
    pub max_velocity: Vec2,
    /// Maximum climbable slope angle, in degrees from horizontal.
    /// Steeper surfaces block horizontal movement like walls.
    pub slope_limit: f32,
    /// Signed vertical acceleration applied every frame (units/second²).
    pub gravity: f32,
    /// When jumping is allowed.
    pub jump_behavior: JumpBehavior,
    /// Minimum delay between jumps, in seconds.
    pub jump_frequency: f32,
    /// Vertical velocity a jump imparts.
    pub jump_magnitude: f32,
}

impl Default for ControllerParameters {
    fn default() -> Self {
        Self {
            max_velocity: Vec2::new(f32::MAX, f32::MAX),
            slope_limit: 30.0,
            gravity: -25.0,
            jump_behavior: JumpBehavior::GroundOnly,
            jump_frequency: 0.25,
            jump_magnitude: 12.0,
        }
    }
}

impl ControllerParameters {
    /// Create parameters with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters for a submerged controller: free jumping, weak gravity.
    pub fn swimming() -> Self {
        Self {
            jump_behavior: JumpBehavior::Anywhere,
            gravity: -5.0,
            ..default()
        }
    }

    /// Set the slope limit in degrees.
    pub fn with_slope_limit(mut self, degrees: f32) -> Self {
        self.slope_limit = degrees;
        self
    }

    /// Set the gravity.
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the per-axis velocity clamp.
    pub fn with_max_velocity(mut self, max_velocity: Vec2) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    /// Set jump behavior, cooldown and impulse.
    pub fn with_jump(mut self, behavior: JumpBehavior, frequency: f32, magnitude: f32) -> Self {
        self.jump_behavior = behavior;
        self.jump_frequency = frequency;
        self.jump_magnitude = magnitude;
        self
    }
}

/// The axis-aligned collision box of a controller, in local units.
///
/// World-space extents are derived at initialization from this box and the
/// entity's absolute (sign-stripped) scale, so mirrored entities keep positive
/// sizes.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ControllerBox {
    /// Full width and height of the box.
    pub size: Vec2,
    /// Offset of the box center from the entity origin.
    pub offset: Vec2,
}

impl Default for ControllerBox {
    fn default() -> Self {
        Self {
            size: Vec2::ONE,
            offset: Vec2::ZERO,
        }
    }
}

impl ControllerBox {
    /// Create a centered box of the given size.
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            offset: Vec2::ZERO,
        }
    }

    /// Offset the box center from the entity origin.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }
}

/// Layout of the ray fans used to sweep the collision box.
///
/// Horizontal rays are spread along the box's vertical edge, vertical rays
/// along its horizontal edge. The skin width insets every ray origin so a
/// controller resting flush against a surface does not immediately re-hit it.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct RayLayout {
    /// Inward inset applied to the collision bounds.
    pub skin_width: f32,
    /// Number of rays in the horizontal fan.
    pub horizontal_rays: usize,
    /// Number of rays in the vertical fan.
    pub vertical_rays: usize,
}

impl Default for RayLayout {
    fn default() -> Self {
        Self {
            skin_width: 0.02,
            horizontal_rays: 8,
            vertical_rays: 4,
        }
    }
}

/// Collision-category bit set handed to the backend's ray queries.
///
/// Only geometry whose category intersects the mask counts as platform
/// geometry. The default mask matches everything.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct PlatformMask(pub u32);

impl Default for PlatformMask {
    fn default() -> Self {
        Self::all()
    }
}

impl PlatformMask {
    /// A mask matching every collision category.
    pub fn all() -> Self {
        Self(u32::MAX)
    }

    /// A mask matching nothing.
    pub fn none() -> Self {
        Self(0)
    }
}

/// A degenerate controller configuration, detected at initialization.
///
/// These are scene-setup programming errors and are never masked at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Each ray fan needs at least two rays to span a box edge.
    TooFewRays {
        /// Configured horizontal ray count.
        horizontal: usize,
        /// Configured vertical ray count.
        vertical: usize,
    },
    /// The skin width must be strictly positive.
    NonPositiveSkinWidth {
        /// Configured skin width.
        skin_width: f32,
    },
    /// The scaled, skin-inset collision box has no area left.
    DegenerateCollider {
        /// Inset width after scaling.
        width: f32,
        /// Inset height after scaling.
        height: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TooFewRays {
                horizontal,
                vertical,
            } => write!(
                f,
                "ray fans need at least 2 rays each, got {horizontal} horizontal and {vertical} vertical"
            ),
            ConfigError::NonPositiveSkinWidth { skin_width } => {
                write!(f, "skin width must be positive, got {skin_width}")
            }
            ConfigError::DegenerateCollider { width, height } => write!(
                f,
                "collision box is degenerate after scaling and skin inset ({width} x {height})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_defaults() {
        let params = ControllerParameters::default();

        assert_eq!(params.max_velocity, Vec2::new(f32::MAX, f32::MAX));
        assert_eq!(params.slope_limit, 30.0);
        assert_eq!(params.gravity, -25.0);
        assert_eq!(params.jump_behavior, JumpBehavior::GroundOnly);
        assert_eq!(params.jump_frequency, 0.25);
        assert_eq!(params.jump_magnitude, 12.0);
    }

    #[test]
    fn parameter_builders() {
        let params = ControllerParameters::new()
            .with_slope_limit(45.0)
            .with_gravity(-9.81)
            .with_max_velocity(Vec2::new(8.0, 20.0))
            .with_jump(JumpBehavior::Anywhere, 0.5, 6.0);

        assert_eq!(params.slope_limit, 45.0);
        assert_eq!(params.gravity, -9.81);
        assert_eq!(params.max_velocity, Vec2::new(8.0, 20.0));
        assert_eq!(params.jump_behavior, JumpBehavior::Anywhere);
        assert_eq!(params.jump_frequency, 0.5);
        assert_eq!(params.jump_magnitude, 6.0);
    }

    #[test]
    fn swimming_preset_allows_jumping_anywhere() {
        let params = ControllerParameters::swimming();

        assert_eq!(params.jump_behavior, JumpBehavior::Anywhere);
        assert!(params.gravity > ControllerParameters::default().gravity);
    }

    #[test]
    fn layout_defaults() {
        let layout = RayLayout::default();

        assert_eq!(layout.skin_width, 0.02);
        assert_eq!(layout.horizontal_rays, 8);
        assert_eq!(layout.vertical_rays, 4);
    }

    #[test]
    fn mask_default_matches_everything() {
        assert_eq!(PlatformMask::default(), PlatformMask::all());
        assert_eq!(PlatformMask::none().0, 0);
    }

    #[test]
    fn config_error_displays_detail() {
        let err = ConfigError::TooFewRays {
            horizontal: 1,
            vertical: 4,
        };

        assert!(err.to_string().contains("1 horizontal"));
    }
}
