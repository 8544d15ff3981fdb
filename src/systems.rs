//! Backend-independent controller systems.
//!
//! These run in `FixedUpdate` around the backend's resolution system:
//! geometry initialization and gravity integration before it, state-marker
//! sync after it.

use bevy::prelude::*;

use crate::config::{ControllerBox, ControllerParameters, RayLayout};
use crate::controller::KinematicController;
use crate::geometry::RayGeometry;
use crate::state::{Airborne, Grounded};

/// Compute and attach [`RayGeometry`] for controllers that do not have one
/// yet.
///
/// Missing configuration components ([`ControllerBox`], [`RayLayout`],
/// [`ControllerParameters`]) are materialized with their defaults so later
/// systems can query them directly. Invalid configuration is a scene-setup
/// bug and panics with the offending entity.
pub fn initialize_ray_geometry(
    mut commands: Commands,
    query: Query<
        (
            Entity,
            Option<&ControllerBox>,
            Option<&RayLayout>,
            Option<&ControllerParameters>,
            &Transform,
        ),
        (With<KinematicController>, Without<RayGeometry>),
    >,
) {
    for (entity, controller_box, layout, parameters, transform) in &query {
        let controller_box = controller_box.copied().unwrap_or_default();
        let layout = layout.copied().unwrap_or_default();
        let parameters = parameters.copied().unwrap_or_default();
        let scale = transform.scale.truncate();

        match RayGeometry::compute(&controller_box, &layout, scale) {
            Ok(geometry) => {
                debug!("initialized ray geometry for controller {entity}");
                commands
                    .entity(entity)
                    .insert((controller_box, layout, parameters, geometry));
            }
            Err(err) => {
                panic!("invalid controller configuration on {entity}: {err}");
            }
        }
    }
}

/// Integrate gravity into controller velocities and tick jump cooldowns.
///
/// Uses the active parameter set, so an override volume with weaker gravity
/// takes effect immediately.
pub fn integrate_gravity(
    time: Res<Time<Fixed>>,
    mut query: Query<(&mut KinematicController, &ControllerParameters)>,
) {
    let dt = time.delta_secs();
    for (mut controller, defaults) in &mut query {
        controller.tick_cooldown(dt);
        let gravity = controller.parameters(defaults).gravity;
        controller.velocity.y += gravity * dt;
    }
}

/// Sync the [`Grounded`] / [`Airborne`] markers with the resolved contact
/// state.
pub fn sync_state_markers(
    mut commands: Commands,
    query: Query<(Entity, &KinematicController, Has<Grounded>, Has<Airborne>)>,
) {
    for (entity, controller, grounded, airborne) in &query {
        if controller.is_grounded() {
            if !grounded {
                commands.entity(entity).insert(Grounded).remove::<Airborne>();
            }
        } else if !airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }
    }
}
