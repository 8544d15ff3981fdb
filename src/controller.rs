//! The controller component and its per-frame resolution protocol.

use bevy::prelude::*;

use crate::cast::{PlatformBodies, RayCaster};
use crate::config::{ControllerBox, ControllerParameters, JumpBehavior, RayLayout};
use crate::geometry::{RayGeometry, RayOrigins};
use crate::platform::{PlatformLink, PlatformTransition};
use crate::resolve::{HORIZONTAL_INTENT_EPSILON, ResolvePass};
use crate::state::ContactState;

/// Everything one resolution frame produced.
///
/// The caller owns the transform; it applies [`translation`] and, if
/// observers should be notified, forwards [`transition`] to
/// [`trigger_transition`].
///
/// [`translation`]: FrameOutcome::translation
/// [`transition`]: FrameOutcome::transition
/// [`trigger_transition`]: crate::platform::trigger_transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    /// Displacement inherited from the platform the controller stood on.
    pub platform_delta: Vec2,
    /// The controller's own displacement after clamping.
    pub applied: Vec2,
    /// Platform contact change for this frame.
    pub transition: PlatformTransition,
}

impl FrameOutcome {
    /// Total translation to apply to the controller's transform.
    pub fn translation(&self) -> Vec2 {
        self.platform_delta + self.applied
    }
}

/// A raycast-driven kinematic character controller.
///
/// Owns the controller's velocity, the contact state of the latest frame, the
/// platform link and the jump cooldown. Movement happens through
/// [`resolve_frame`], normally called by the backend's resolution system once
/// per fixed update.
///
/// [`resolve_frame`]: KinematicController::resolve_frame
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct KinematicController {
    /// Current velocity, replaced every resolved frame by
    /// `applied displacement / dt`.
    pub velocity: Vec2,
    /// When false, desired displacements are applied verbatim with no ray
    /// sweeps (for cutscenes, ghost modes, debugging).
    pub handle_collisions: bool,
    /// Contact flags of the latest resolved frame.
    pub state: ContactState,
    /// Velocity of the platform the controller is riding, zero otherwise.
    pub platform_velocity: Vec2,
    link: PlatformLink,
    override_parameters: Option<ControllerParameters>,
    jump_cooldown: f32,
}

impl Default for KinematicController {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            handle_collisions: true,
            state: ContactState::default(),
            platform_velocity: Vec2::ZERO,
            link: PlatformLink::default(),
            override_parameters: None,
            jump_cooldown: 0.0,
        }
    }
}

impl KinematicController {
    /// Create a controller with collision handling enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// The body the controller stood on in the latest resolved frame.
    pub fn standing_on(&self) -> Option<Entity> {
        self.link.standing_on
    }

    /// Whether the latest resolved frame had floor contact.
    pub fn is_grounded(&self) -> bool {
        self.state.is_grounded()
    }

    /// The active parameter set: the override if one is installed, otherwise
    /// the entity's defaults.
    pub fn parameters(&self, defaults: &ControllerParameters) -> ControllerParameters {
        self.override_parameters.unwrap_or(*defaults)
    }

    /// Install a parameter override (e.g. on entering a water volume).
    pub fn set_override_parameters(&mut self, parameters: ControllerParameters) {
        self.override_parameters = Some(parameters);
    }

    /// Remove the parameter override, restoring the entity's defaults.
    pub fn clear_override_parameters(&mut self) {
        self.override_parameters = None;
    }

    /// Whether a parameter override is active.
    pub fn has_override(&self) -> bool {
        self.override_parameters.is_some()
    }

    /// Replace the velocity outright.
    pub fn apply_impulse(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Add to the current velocity.
    pub fn add_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }

    /// Set only the horizontal velocity.
    pub fn set_horizontal_velocity(&mut self, x: f32) {
        self.velocity.x = x;
    }

    /// Set only the vertical velocity.
    pub fn set_vertical_velocity(&mut self, y: f32) {
        self.velocity.y = y;
    }

    /// Whether a jump is allowed right now under the active parameters.
    pub fn can_jump(&self, defaults: &ControllerParameters) -> bool {
        match self.parameters(defaults).jump_behavior {
            JumpBehavior::GroundOnly => self.is_grounded(),
            JumpBehavior::Anywhere => self.jump_cooldown <= 0.0,
            JumpBehavior::Disabled => false,
        }
    }

    /// Jump: set the vertical velocity to the jump magnitude and start the
    /// cooldown. Does not check [`can_jump`]; callers gate on it.
    ///
    /// [`can_jump`]: KinematicController::can_jump
    pub fn jump(&mut self, defaults: &ControllerParameters) {
        let params = self.parameters(defaults);
        self.velocity.y = params.jump_magnitude;
        self.jump_cooldown = params.jump_frequency;
    }

    pub(crate) fn tick_cooldown(&mut self, dt: f32) {
        self.jump_cooldown -= dt;
    }

    /// Resolve one frame of movement.
    ///
    /// `position` is the controller's current world position, `desired` the
    /// displacement to attempt this frame (typically `velocity * dt`). The
    /// transform is not touched; the caller applies the returned outcome.
    ///
    /// The frame runs the full protocol: platform follow, slope descent
    /// pre-pass (only when moving down with ground contact last frame),
    /// horizontal and vertical sweeps, placement correction on both sides,
    /// velocity derivation (skipped when `dt <= 0`), per-axis upper clamp,
    /// vertical zeroing while climbing, and the platform post-pass.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_frame<C: RayCaster, P: PlatformBodies>(
        &mut self,
        position: Vec2,
        desired: Vec2,
        defaults: &ControllerParameters,
        controller_box: &ControllerBox,
        layout: &RayLayout,
        geometry: &RayGeometry,
        scale: Vec2,
        caster: &C,
        bodies: &P,
        dt: f32,
    ) -> FrameOutcome {
        let params = self.parameters(defaults);
        let was_grounded = self.state.below;
        self.state.reset();

        let mut applied = desired;
        let mut platform_delta = Vec2::ZERO;

        if self.handle_collisions {
            let (carry, platform_velocity) = self.link.follow(bodies, dt);
            platform_delta = carry;
            self.platform_velocity = platform_velocity;

            let carried_position = position + platform_delta;
            let pass = ResolvePass {
                caster,
                origins: RayOrigins::compute(carried_position, controller_box, layout, scale),
                geometry: *geometry,
                skin_width: layout.skin_width,
                horizontal_rays: layout.horizontal_rays,
                vertical_rays: layout.vertical_rays,
                slope_limit: params.slope_limit,
                position: carried_position,
            };

            if applied.y < 0.0 && was_grounded {
                applied = pass.descend_slope(applied, &mut self.state);
            }
            if applied.x.abs() > HORIZONTAL_INTENT_EPSILON {
                applied = pass.resolve_horizontal(applied, &mut self.state);
            }
            applied = pass.resolve_vertical(applied, &mut self.state, &mut self.link.standing_on);
            applied = pass.correct_placement(applied, true);
            applied = pass.correct_placement(applied, false);
        }

        if dt > 0.0 {
            self.velocity = applied / dt;
        }
        self.velocity = self.velocity.min(params.max_velocity);

        if self.state.moving_up_slope {
            self.velocity.y = 0.0;
        }

        let transition = self
            .link
            .reconcile(bodies, position + platform_delta + applied);

        FrameOutcome {
            platform_delta,
            applied,
            transition,
        }
    }
}
