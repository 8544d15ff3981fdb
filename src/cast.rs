//! Ray query result structures and the traits the resolvers consume.
//!
//! The collision resolvers never talk to a physics engine directly. They see
//! the world through two narrow traits: [`RayCaster`] for raycast queries and
//! [`PlatformBodies`] for point transforms of bodies the controller stands on.
//! Backends (and tests) provide implementations.

use bevy::prelude::*;

/// Information about a raycast hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// World position of the hit point.
    pub point: Vec2,
    /// Normal of the surface at the hit point.
    pub normal: Vec2,
    /// Body that was hit (if the backend tracks one).
    pub body: Option<Entity>,
}

impl RayHit {
    /// Create a hit result.
    pub fn new(distance: f32, point: Vec2, normal: Vec2, body: Option<Entity>) -> Self {
        Self {
            distance,
            point,
            normal,
            body,
        }
    }
}

/// A synchronous raycast query against the collision world.
///
/// Returns `None` when nothing lies within `max_distance` along the ray; a
/// miss is a normal result, never an error. Filtering (collision masks,
/// excluding the casting entity) is the implementor's concern.
pub trait RayCaster {
    /// Cast a ray and return the closest hit, if any.
    fn cast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit>;
}

impl<F> RayCaster for F
where
    F: Fn(Vec2, Vec2, f32) -> Option<RayHit>,
{
    fn cast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit> {
        self(origin, direction, max_distance)
    }
}

/// Point transforms for external bodies the controller may stand on.
///
/// The controller holds only weak references to platforms; a body that has
/// despawned simply answers `None` and is treated as static.
pub trait PlatformBodies {
    /// Transform a point from the body's local frame to world space.
    fn point_to_world(&self, body: Entity, local: Vec2) -> Option<Vec2>;

    /// Transform a world-space point into the body's local frame.
    fn point_to_local(&self, body: Entity, world: Vec2) -> Option<Vec2>;
}

/// A body lookup that knows no bodies.
///
/// Useful for controllers that never encounter moving platforms, and for unit
/// tests of the resolvers.
pub struct NoBodies;

impl PlatformBodies for NoBodies {
    fn point_to_world(&self, _body: Entity, _local: Vec2) -> Option<Vec2> {
        None
    }

    fn point_to_local(&self, _body: Entity, _world: Vec2) -> Option<Vec2> {
        None
    }
}

/// [`PlatformBodies`] over a query of [`GlobalTransform`]s.
///
/// This is what ECS-backed resolution systems hand to the controller: any
/// entity with a `GlobalTransform` can act as a platform body.
pub struct TransformBodies<'a, 'w, 's> {
    /// The transform lookup for platform bodies.
    pub query: &'a Query<'w, 's, &'static GlobalTransform>,
}

impl PlatformBodies for TransformBodies<'_, '_, '_> {
    fn point_to_world(&self, body: Entity, local: Vec2) -> Option<Vec2> {
        self.query
            .get(body)
            .ok()
            .map(|transform| transform.transform_point(local.extend(0.0)).truncate())
    }

    fn point_to_local(&self, body: Entity, world: Vec2) -> Option<Vec2> {
        self.query.get(body).ok().map(|transform| {
            transform
                .affine()
                .inverse()
                .transform_point3(world.extend(0.0))
                .truncate()
        })
    }
}
