//! Physics backend abstraction.
//!
//! The controller core never queries a physics engine directly; a backend
//! contributes a plugin that owns the per-frame resolution system and feeds
//! [`KinematicController::resolve_frame`] with a [`RayCaster`] built from its
//! engine's ray queries.
//!
//! [`KinematicController::resolve_frame`]: crate::controller::KinematicController::resolve_frame
//! [`RayCaster`]: crate::cast::RayCaster

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// A backend's plugin must register a system in
/// [`ControllerSet::Resolution`] that, every fixed update, calls
/// `resolve_frame` on each controller, applies the returned translation to
/// its transform and forwards the platform transition via
/// [`trigger_transition`].
///
/// For an example implementation, see the `rapier` module's
/// `Rapier2dBackend`, which implements this trait for Bevy Rapier2D.
///
/// [`ControllerSet::Resolution`]: crate::ControllerSet::Resolution
/// [`trigger_transition`]: crate::platform::trigger_transition
pub trait ControllerPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}

/// A backend that registers no resolution system at all.
///
/// Use this when driving [`resolve_frame`] by hand (fixed-seed simulations,
/// replay verification, custom scheduling). Gravity integration, geometry
/// initialization and marker sync still run.
///
/// [`resolve_frame`]: crate::controller::KinematicController::resolve_frame
pub struct ManualBackend;

impl ControllerPhysicsBackend for ManualBackend {
    fn plugin() -> impl Plugin {
        NoOpBackendPlugin
    }
}
