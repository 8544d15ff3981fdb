//! Per-frame contact state and the marker components derived from it.

use bevy::prelude::*;

/// Contact flags produced by one resolution pass.
///
/// The state is transient: it is reset at the start of every pass and filled
/// in by the resolvers, so it always describes the most recent frame only.
/// At most one of the slope flags is set per frame, and `slope_angle` is only
/// meaningful while one of them is.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactState {
    /// A ceiling was hit while moving up.
    pub above: bool,
    /// A floor was hit while moving down (or while climbing a slope).
    pub below: bool,
    /// A wall was hit on the left.
    pub left: bool,
    /// A wall was hit on the right.
    pub right: bool,
    /// The controller is climbing a walkable slope this frame.
    pub moving_up_slope: bool,
    /// The controller is descending along a slope this frame.
    pub moving_down_slope: bool,
    /// Angle of the slope being climbed or descended, in degrees.
    pub slope_angle: f32,
}

impl ContactState {
    /// Clear all flags for a new resolution pass.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the controller has floor contact.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.below
    }

    /// Whether any directional contact flag is set.
    pub fn has_collision(&self) -> bool {
        self.above || self.below || self.left || self.right
    }

    /// Whether the controller interacted with a slope this frame.
    pub fn is_on_slope(&self) -> bool {
        self.moving_up_slope || self.moving_down_slope
    }
}

/// Marker component present while the controller has floor contact.
///
/// Synced from [`ContactState`] after resolution; mutually exclusive with
/// [`Airborne`]. Useful for queries that only care about grounded characters:
///
/// ```rust
/// use bevy::prelude::*;
/// use raycast_platformer_controller::prelude::*;
///
/// fn grounded_only(query: Query<Entity, (With<KinematicController>, With<Grounded>)>) {
///     for _entity in &query {
///         // apply ground friction, allow jumping, ...
///     }
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component present while the controller has no floor contact.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;
