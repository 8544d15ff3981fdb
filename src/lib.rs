//! # `raycast_platformer_controller`
//!
//! A deterministic, raycast-driven kinematic character controller for 2D
//! platformers, with physics backend abstraction.
//!
//! This crate provides a platformer-style controller that:
//! - Resolves a desired per-frame displacement by sweeping fans of rays from
//!   its collision box and clamping against the first hits
//! - Climbs and descends slopes up to a configurable angle limit
//! - Rides moving platforms via cached attachment points and reports
//!   enter/stay/exit contact as entity-targeted events
//! - Reports ceiling, floor and wall contact per frame
//! - Abstracts the physics backend for easy swapping (Rapier2D included)
//!
//! ## Architecture
//!
//! The controller is fully kinematic: nothing pushes it except its own
//! resolution pass. Every fixed update:
//! 1. Gravity is integrated into the controller velocity
//! 2. The backend's resolution system calls
//!    [`KinematicController::resolve_frame`] with `velocity * dt`, a ray query
//!    adapter and a platform body lookup
//! 3. The clamped outcome is written to the transform and velocity is derived
//!    back from the displacement that was actually applied
//! 4. `Grounded`/`Airborne` markers are synced from the contact state
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use raycast_platformer_controller::prelude::*;
//!
//! // Components for a platformer character with a 1x2 collision box
//! let controller = KinematicController::new();
//! let parameters = ControllerParameters::default().with_slope_limit(45.0);
//! let collision_box = ControllerBox::new(Vec2::new(1.0, 2.0));
//! ```
//!
//! [`KinematicController::resolve_frame`]: controller::KinematicController::resolve_frame

use bevy::prelude::*;

pub mod backend;
pub mod cast;
pub mod config;
pub mod controller;
pub mod geometry;
pub mod platform;
pub mod resolve;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{ControllerPhysicsBackend, ManualBackend, NoOpBackendPlugin};
    pub use crate::cast::{NoBodies, PlatformBodies, RayCaster, RayHit, TransformBodies};
    pub use crate::config::{
        ControllerBox, ControllerParameters, JumpBehavior, PlatformMask, RayLayout,
    };
    pub use crate::controller::{FrameOutcome, KinematicController};
    pub use crate::geometry::{RayGeometry, RayOrigins};
    pub use crate::platform::{
        ControllerEnter, ControllerExit, ControllerStay, PlatformLink, PlatformTransition,
        trigger_transition,
    };
    pub use crate::state::{Airborne, ContactState, Grounded};
    pub use crate::{ControllerSet, KinematicControllerPlugin};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{
        ControllerPhysicsVolume, Rapier2dBackend, RapierControllerBundle,
    };
}

/// System sets the controller schedule is organized into, all in
/// `FixedUpdate` and chained in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerSet {
    /// Geometry initialization, gravity integration, override bookkeeping.
    Preparation,
    /// The backend's resolution system: ray sweeps, transform writes.
    Resolution,
    /// Marker components synced from the resolved contact state.
    StateSync,
}

/// Main plugin for the kinematic controller system.
///
/// Generic over a physics backend `B`, which contributes the resolution
/// system through its own plugin.
///
/// # Examples
///
/// With the Rapier2D backend (requires the `rapier2d` feature):
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use raycast_platformer_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(KinematicControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct KinematicControllerPlugin<B: backend::ControllerPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::ControllerPhysicsBackend> Default for KinematicControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::ControllerPhysicsBackend> Plugin for KinematicControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::ControllerParameters>();
        app.register_type::<config::ControllerBox>();
        app.register_type::<config::RayLayout>();
        app.register_type::<config::PlatformMask>();
        app.register_type::<controller::KinematicController>();
        app.register_type::<geometry::RayGeometry>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();

        app.configure_sets(
            FixedUpdate,
            (
                ControllerSet::Preparation,
                ControllerSet::Resolution,
                ControllerSet::StateSync,
            )
                .chain(),
        );

        // The backend plugin registers its resolution system
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (systems::initialize_ray_geometry, systems::integrate_gravity)
                .chain()
                .in_set(ControllerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(ControllerSet::StateSync),
        );
    }
}
