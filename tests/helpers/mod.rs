//! Shared test scaffolding: a deterministic segment-geometry backend.
//!
//! Integration tests resolve against analytic line segments instead of a
//! physics engine, so results are exact and the suite runs without optional
//! features. Platform bodies are plain entities with a [`SegmentBody`] and a
//! `Transform`.

use bevy::prelude::*;

use raycast_platformer_controller::prelude::*;

/// Collision geometry for the test backend: line segments in local space.
#[derive(Component, Debug, Clone)]
pub struct SegmentBody {
    /// Segment endpoints in the body's local frame.
    pub segments: Vec<(Vec2, Vec2)>,
}

impl SegmentBody {
    /// A horizontal floor segment centered on the body origin.
    pub fn floor(half_width: f32) -> Self {
        Self {
            segments: vec![(Vec2::new(-half_width, 0.0), Vec2::new(half_width, 0.0))],
        }
    }

    /// A single segment between two local points.
    pub fn segment(from: Vec2, to: Vec2) -> Self {
        Self {
            segments: vec![(from, to)],
        }
    }

    /// A vertical wall segment rising from the body origin.
    pub fn wall(height: f32) -> Self {
        Self {
            segments: vec![(Vec2::ZERO, Vec2::new(0.0, height))],
        }
    }
}

/// Intersect a ray with one world-space segment.
///
/// Returns `(distance, point, normal)`; the normal is flipped to face the
/// ray.
fn ray_segment(
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    a: Vec2,
    b: Vec2,
) -> Option<(f32, Vec2, Vec2)> {
    let s = b - a;
    let denom = direction.perp_dot(s);
    if denom.abs() < 1e-9 {
        return None;
    }

    let w = a - origin;
    let t = w.perp_dot(s) / denom;
    let u = w.perp_dot(direction) / denom;
    if t < 0.0 || t > max_distance || !(0.0..=1.0).contains(&u) {
        return None;
    }

    let mut normal = s.perp().normalize_or_zero();
    if normal.dot(direction) > 0.0 {
        normal = -normal;
    }
    Some((t, origin + direction * t, normal))
}

/// Log of platform contact events, filled in by [`observe_contacts`].
#[derive(Resource, Default)]
pub struct ContactLog {
    /// `(kind, platform, controller)` in trigger order.
    pub events: Vec<(ContactKind, Entity, Entity)>,
}

/// Which contact event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Enter,
    Stay,
    Exit,
}

/// Register observers on a platform that record its contact events.
pub fn observe_contacts(app: &mut App, platform: Entity) {
    app.world_mut()
        .entity_mut(platform)
        .observe(
            |trigger: Trigger<ControllerEnter>, mut log: ResMut<ContactLog>| {
                let record = (ContactKind::Enter, trigger.target(), trigger.event().controller);
                log.events.push(record);
            },
        )
        .observe(
            |trigger: Trigger<ControllerStay>, mut log: ResMut<ContactLog>| {
                let record = (ContactKind::Stay, trigger.target(), trigger.event().controller);
                log.events.push(record);
            },
        )
        .observe(
            |trigger: Trigger<ControllerExit>, mut log: ResMut<ContactLog>| {
                let record = (ContactKind::Exit, trigger.target(), trigger.event().controller);
                log.events.push(record);
            },
        );
}

/// Backend that resolves controllers against [`SegmentBody`] geometry.
pub struct TestBackend;

impl ControllerPhysicsBackend for TestBackend {
    fn plugin() -> impl Plugin {
        TestBackendPlugin
    }
}

/// Plugin registering the segment resolution system and the contact log.
pub struct TestBackendPlugin;

impl Plugin for TestBackendPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ContactLog>();
        app.add_systems(
            FixedUpdate,
            resolve_against_segments.in_set(ControllerSet::Resolution),
        );
    }
}

/// [`PlatformBodies`] over plain `Transform`s (no hierarchy in tests).
struct LocalTransformBodies<'a, 'w, 's> {
    query: &'a Query<'w, 's, (Entity, &'static SegmentBody, &'static Transform),
        Without<KinematicController>>,
}

impl PlatformBodies for LocalTransformBodies<'_, '_, '_> {
    fn point_to_world(&self, body: Entity, local: Vec2) -> Option<Vec2> {
        self.query
            .get(body)
            .ok()
            .map(|(_, _, transform)| transform.transform_point(local.extend(0.0)).truncate())
    }

    fn point_to_local(&self, body: Entity, world: Vec2) -> Option<Vec2> {
        self.query.get(body).ok().map(|(_, _, transform)| {
            transform
                .compute_affine()
                .inverse()
                .transform_point3(world.extend(0.0))
                .truncate()
        })
    }
}

/// The test backend's resolution system.
fn resolve_against_segments(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    bodies: Query<
        (Entity, &'static SegmentBody, &'static Transform),
        Without<KinematicController>,
    >,
    mut controllers: Query<(
        Entity,
        &mut Transform,
        &mut KinematicController,
        &ControllerParameters,
        &ControllerBox,
        &RayLayout,
        &RayGeometry,
    )>,
) {
    let dt = time.delta_secs();

    // Flatten the scene into world-space segments once per frame.
    let segments: Vec<(Entity, Vec2, Vec2)> = bodies
        .iter()
        .flat_map(|(entity, body, transform)| {
            body.segments.iter().map(move |(a, b)| {
                (
                    entity,
                    transform.transform_point(a.extend(0.0)).truncate(),
                    transform.transform_point(b.extend(0.0)).truncate(),
                )
            })
        })
        .collect();

    let caster = |origin: Vec2, direction: Vec2, max_distance: f32| {
        segments
            .iter()
            .filter_map(|&(entity, a, b)| {
                ray_segment(origin, direction, max_distance, a, b)
                    .map(|(t, point, normal)| RayHit::new(t, point, normal, Some(entity)))
            })
            .min_by(|lhs, rhs| lhs.distance.total_cmp(&rhs.distance))
    };
    let lookup = LocalTransformBodies { query: &bodies };

    for (entity, mut transform, mut controller, defaults, controller_box, layout, geometry) in
        &mut controllers
    {
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
            &lookup,
            dt,
        );

        transform.translation += outcome.translation().extend(0.0);
        trigger_transition(&mut commands, entity, outcome.transition);
    }
}
