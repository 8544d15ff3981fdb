//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::ControllerSet;
use crate::backend::ControllerPhysicsBackend;
use crate::cast::{RayHit, TransformBodies};
use crate::config::{ControllerBox, ControllerParameters, PlatformMask, RayLayout};
use crate::controller::KinematicController;
use crate::geometry::RayGeometry;
use crate::platform::trigger_transition;

/// Rapier2D physics backend for the kinematic controller.
///
/// Raycasts go through `RapierContext::cast_ray_and_get_normal`, excluding
/// the controller's own rigid body and all sensors, with collision groups
/// built from the controller's [`PlatformMask`].
pub struct Rapier2dBackend;

impl ControllerPhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }
}

/// Plugin that sets up Rapier2D-specific systems for the kinematic
/// controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<ControllerPhysicsVolume>();

        app.add_systems(
            FixedUpdate,
            sync_physics_volumes.in_set(ControllerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            resolve_controller_movement.in_set(ControllerSet::Resolution),
        );
    }
}

/// Resolve one frame of movement for every controller against the Rapier
/// collision world.
///
/// Builds the desired displacement from the controller velocity, runs the
/// resolution pass, writes the resulting translation to the transform and
/// triggers any platform contact events.
pub fn resolve_controller_movement(
    rapier_context: ReadRapierContext,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    transforms: Query<&GlobalTransform>,
    mut controllers: Query<(
        Entity,
        &mut Transform,
        &mut KinematicController,
        &ControllerParameters,
        &ControllerBox,
        &RayLayout,
        &RayGeometry,
        Option<&PlatformMask>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };
    let dt = time.delta_secs();

    for (
        entity,
        mut transform,
        mut controller,
        defaults,
        controller_box,
        layout,
        geometry,
        mask,
    ) in &mut controllers
    {
        let mask = mask.copied().unwrap_or_default();
        let filter = QueryFilter::default()
            .exclude_rigid_body(entity)
            .exclude_sensors()
            .groups(CollisionGroups::new(
                Group::ALL,
                Group::from_bits_truncate(mask.0),
            ));

        let caster = |origin: Vec2, direction: Vec2, max_distance: f32| {
            context
                .cast_ray_and_get_normal(origin, direction, max_distance, true, filter)
                .map(|(body, intersection)| {
                    RayHit::new(
                        intersection.time_of_impact,
                        intersection.point,
                        intersection.normal,
                        Some(body),
                    )
                })
        };
        let bodies = TransformBodies {
            query: &transforms,
        };

        let position = transform.translation.truncate();
        let desired = controller.velocity * dt;
        let outcome = controller.resolve_frame(
            position,
            desired,
            defaults,
            controller_box,
            layout,
            geometry,
            transform.scale.truncate(),
            &caster,
            &bodies,
            dt,
        );

        transform.translation += outcome.translation().extend(0.0);
        trigger_transition(&mut commands, entity, outcome.transition);
    }
}

/// A trigger volume that overrides controller parameters while a controller
/// is inside it (water, wind tunnels, low-gravity zones).
///
/// Attach it to a sensor collider; [`sync_physics_volumes`] installs the
/// override on collision start and clears it on collision stop.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ControllerPhysicsVolume {
    /// Parameters active while inside the volume.
    pub parameters: ControllerParameters,
}

impl ControllerPhysicsVolume {
    /// Create a volume with the given override parameters.
    pub fn new(parameters: ControllerParameters) -> Self {
        Self { parameters }
    }

    /// A water volume: swimming parameters.
    pub fn water() -> Self {
        Self::new(ControllerParameters::swimming())
    }
}

/// Install and clear parameter overrides from sensor collision events.
pub fn sync_physics_volumes(
    mut collisions: EventReader<CollisionEvent>,
    volumes: Query<&ControllerPhysicsVolume>,
    mut controllers: Query<&mut KinematicController>,
) {
    for event in collisions.read() {
        let (&a, &b, started) = match event {
            CollisionEvent::Started(a, b, _) => (a, b, true),
            CollisionEvent::Stopped(a, b, _) => (a, b, false),
        };

        // The volume can be either side of the pair.
        for (volume_entity, other) in [(a, b), (b, a)] {
            let Ok(volume) = volumes.get(volume_entity) else {
                continue;
            };
            let Ok(mut controller) = controllers.get_mut(other) else {
                continue;
            };
            if started {
                debug!("controller {other} entered physics volume {volume_entity}");
                controller.set_override_parameters(volume.parameters);
            } else {
                debug!("controller {other} left physics volume {volume_entity}");
                controller.clear_override_parameters();
            }
        }
    }
}

/// Bundle for spawning a controller entity with Rapier2D physics.
///
/// The rigid body is kinematic: Rapier never moves it, the controller's
/// resolution system owns the transform. Add a `Collider` alongside so other
/// bodies can collide with (and trigger volumes can sense) the controller.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use raycast_platformer_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 10.0, 0.0),
///         RapierControllerBundle::default()
///             .with_box(ControllerBox::new(Vec2::new(1.0, 2.0)))
///             .with_parameters(ControllerParameters::default().with_slope_limit(45.0)),
///         Collider::cuboid(0.5, 1.0),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct RapierControllerBundle {
    /// The rigid body type. Kinematic by default; the controller moves it.
    pub rigid_body: RigidBody,
    /// The controller itself.
    pub controller: KinematicController,
    /// Default movement parameters.
    pub parameters: ControllerParameters,
    /// The collision box the ray fans are derived from.
    pub collision_box: ControllerBox,
    /// Ray fan layout.
    pub layout: RayLayout,
    /// Collision categories treated as platform geometry.
    pub mask: PlatformMask,
}

impl Default for RapierControllerBundle {
    fn default() -> Self {
        Self {
            rigid_body: RigidBody::KinematicPositionBased,
            controller: KinematicController::new(),
            parameters: ControllerParameters::default(),
            collision_box: ControllerBox::default(),
            layout: RayLayout::default(),
            mask: PlatformMask::default(),
        }
    }
}

impl RapierControllerBundle {
    /// Set the default movement parameters.
    pub fn with_parameters(mut self, parameters: ControllerParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the collision box.
    pub fn with_box(mut self, collision_box: ControllerBox) -> Self {
        self.collision_box = collision_box;
        self
    }

    /// Set the platform mask.
    pub fn with_mask(mut self, mask: PlatformMask) -> Self {
        self.mask = mask;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_rapier2d::rapier::geometry::CollisionEventFlags;

    #[test]
    fn bundle_defaults_to_a_kinematic_body() {
        let mut world = World::new();
        let entity = world.spawn(RapierControllerBundle::default()).id();

        assert_eq!(
            world.get::<RigidBody>(entity),
            Some(&RigidBody::KinematicPositionBased)
        );
        assert!(world.get::<KinematicController>(entity).is_some());
        assert_eq!(
            world.get::<PlatformMask>(entity),
            Some(&PlatformMask::all())
        );
    }

    #[test]
    fn volume_events_install_and_clear_the_override() {
        let mut app = App::new();
        app.add_event::<CollisionEvent>();
        app.add_systems(Update, sync_physics_volumes);

        let volume = app
            .world_mut()
            .spawn(ControllerPhysicsVolume::water())
            .id();
        let controller = app.world_mut().spawn(KinematicController::new()).id();

        app.world_mut().send_event(CollisionEvent::Started(
            volume,
            controller,
            CollisionEventFlags::SENSOR,
        ));
        app.update();

        let state = app.world().get::<KinematicController>(controller).unwrap();
        assert!(state.has_override());
        assert_eq!(
            state
                .parameters(&ControllerParameters::default())
                .jump_behavior,
            crate::config::JumpBehavior::Anywhere
        );

        // Entity order is irrelevant, so report the pair swapped on exit.
        app.world_mut().send_event(CollisionEvent::Stopped(
            controller,
            volume,
            CollisionEventFlags::SENSOR,
        ));
        app.update();

        let state = app.world().get::<KinematicController>(controller).unwrap();
        assert!(!state.has_override());
    }
}
