//! Moving-platform tracking and contact notifications.
//!
//! A controller standing on a body caches an attachment point in that body's
//! local frame. The next frame starts by re-projecting the cached point to
//! world space; the difference is the platform's carry displacement. After
//! resolution the link is re-cached and contact transitions are reported as
//! entity-targeted events on the platform body.

use bevy::prelude::*;

use crate::cast::PlatformBodies;

/// A controller entered this platform (it became the standing-on body).
///
/// Triggered on the platform entity; observe it there:
///
/// ```rust
/// use bevy::prelude::*;
/// use raycast_platformer_controller::prelude::*;
///
/// fn spawn_crumbling_platform(mut commands: Commands) {
///     commands.spawn(Transform::default()).observe(
///         |trigger: Trigger<ControllerEnter>| {
///             info!("controller {} stepped on", trigger.event().controller);
///         },
///     );
/// }
/// ```
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerEnter {
    /// The controller that stepped onto the platform.
    pub controller: Entity,
}

/// A controller is still standing on this platform (triggered every frame
/// after the enter frame).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerStay {
    /// The controller standing on the platform.
    pub controller: Entity,
}

/// A controller left this platform (stepped off, jumped, or moved to another
/// body).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerExit {
    /// The controller that left the platform.
    pub controller: Entity,
}

/// Contact change computed by the platform post-pass.
///
/// `exited` and `entered` are both set when the controller steps directly
/// from one body onto another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformTransition {
    /// Body the controller stopped standing on.
    pub exited: Option<Entity>,
    /// Body the controller started standing on.
    pub entered: Option<Entity>,
    /// Body the controller kept standing on.
    pub stayed: Option<Entity>,
}

impl PlatformTransition {
    /// Whether anything changed or persisted this frame.
    pub fn is_empty(&self) -> bool {
        self.exited.is_none() && self.entered.is_none() && self.stayed.is_none()
    }
}

/// Link between a controller and the body it stands on.
///
/// Holds only weak references: a platform that despawns mid-contact simply
/// stops answering point transforms and is treated as static until the
/// controller lands elsewhere.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlatformLink {
    /// Body resolved as standing-on this frame (set by the vertical sweep).
    pub standing_on: Option<Entity>,
    /// Body reported as standing-on last frame, for transition detection.
    pub last_standing_on: Option<Entity>,
    /// Cached controller position, world space, at the end of last frame.
    pub global_point: Vec2,
    /// Cached controller position in the platform's local frame.
    pub local_point: Vec2,
}

impl PlatformLink {
    /// Platform pre-pass: compute the carry displacement.
    ///
    /// Re-projects the cached local attachment point through the platform's
    /// current transform and compares it with the cached world point; the
    /// difference is how far the platform moved under the controller. Also
    /// clears `standing_on` so the coming vertical sweep re-detects it.
    ///
    /// Returns `(carry displacement, platform velocity)`.
    pub fn follow(&mut self, bodies: &impl PlatformBodies, dt: f32) -> (Vec2, Vec2) {
        let result = match self.standing_on {
            Some(body) => match bodies.point_to_world(body, self.local_point) {
                Some(new_global) => {
                    let carry = new_global - self.global_point;
                    let velocity = if dt > 0.0 { carry / dt } else { Vec2::ZERO };
                    (carry, velocity)
                }
                // Body despawned: treat the platform as static.
                None => (Vec2::ZERO, Vec2::ZERO),
            },
            None => (Vec2::ZERO, Vec2::ZERO),
        };

        self.standing_on = None;
        result
    }

    /// Platform post-pass: re-cache attachment points and diff against last
    /// frame's body.
    ///
    /// `position` is the controller's final position for this frame.
    pub fn reconcile(
        &mut self,
        bodies: &impl PlatformBodies,
        position: Vec2,
    ) -> PlatformTransition {
        let mut transition = PlatformTransition::default();

        match self.standing_on {
            Some(body) => {
                self.global_point = position;
                self.local_point = bodies.point_to_local(body, position).unwrap_or(position);

                if self.last_standing_on != Some(body) {
                    transition.exited = self.last_standing_on;
                    transition.entered = Some(body);
                    self.last_standing_on = Some(body);
                } else {
                    transition.stayed = Some(body);
                }
            }
            None => {
                transition.exited = self.last_standing_on.take();
            }
        }

        transition
    }
}

/// Trigger the contact events a [`PlatformTransition`] describes, targeted at
/// the platform bodies involved.
///
/// Platforms without observers ignore the events silently.
pub fn trigger_transition(
    commands: &mut Commands,
    controller: Entity,
    transition: PlatformTransition,
) {
    if let Some(body) = transition.exited {
        commands.trigger_targets(ControllerExit { controller }, body);
    }
    if let Some(body) = transition.entered {
        commands.trigger_targets(ControllerEnter { controller }, body);
    }
    if let Some(body) = transition.stayed {
        commands.trigger_targets(ControllerStay { controller }, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Bodies that translate points by a fixed per-body offset.
    struct OffsetBodies(HashMap<Entity, Vec2>);

    impl PlatformBodies for OffsetBodies {
        fn point_to_world(&self, body: Entity, local: Vec2) -> Option<Vec2> {
            self.0.get(&body).map(|offset| local + *offset)
        }

        fn point_to_local(&self, body: Entity, world: Vec2) -> Option<Vec2> {
            self.0.get(&body).map(|offset| world - *offset)
        }
    }

    fn body_at(entity: Entity, offset: Vec2) -> OffsetBodies {
        OffsetBodies(HashMap::from([(entity, offset)]))
    }

    #[test]
    fn follow_without_platform_is_a_no_op() {
        let mut link = PlatformLink::default();

        let (carry, velocity) = link.follow(&body_at(Entity::from_raw(1), Vec2::ZERO), 0.1);

        assert_eq!(carry, Vec2::ZERO);
        assert_eq!(velocity, Vec2::ZERO);
    }

    #[test]
    fn follow_tracks_platform_motion() {
        let platform = Entity::from_raw(1);
        let mut link = PlatformLink {
            standing_on: Some(platform),
            last_standing_on: Some(platform),
            global_point: Vec2::new(2.0, 1.0),
            local_point: Vec2::new(2.0, 1.0),
        };
        // Platform has moved 0.5 to the right since the points were cached.
        let bodies = body_at(platform, Vec2::new(0.5, 0.0));

        let (carry, velocity) = link.follow(&bodies, 0.1);

        assert_eq!(carry, Vec2::new(0.5, 0.0));
        assert_eq!(velocity, Vec2::new(5.0, 0.0));
        // Cleared for re-detection by the vertical sweep.
        assert!(link.standing_on.is_none());
    }

    #[test]
    fn follow_treats_despawned_platform_as_static() {
        let gone = Entity::from_raw(9);
        let mut link = PlatformLink {
            standing_on: Some(gone),
            global_point: Vec2::ONE,
            local_point: Vec2::ONE,
            ..default()
        };

        let (carry, velocity) = link.follow(&body_at(Entity::from_raw(1), Vec2::ZERO), 0.1);

        assert_eq!(carry, Vec2::ZERO);
        assert_eq!(velocity, Vec2::ZERO);
    }

    #[test]
    fn follow_skips_velocity_on_zero_timestep() {
        let platform = Entity::from_raw(1);
        let mut link = PlatformLink {
            standing_on: Some(platform),
            global_point: Vec2::ZERO,
            local_point: Vec2::ZERO,
            ..default()
        };

        let (carry, velocity) = link.follow(&body_at(platform, Vec2::X), 0.0);

        assert_eq!(carry, Vec2::X);
        assert_eq!(velocity, Vec2::ZERO);
    }

    #[test]
    fn reconcile_reports_enter_then_stay() {
        let platform = Entity::from_raw(1);
        let bodies = body_at(platform, Vec2::new(3.0, 0.0));
        let mut link = PlatformLink {
            standing_on: Some(platform),
            ..default()
        };

        let transition = link.reconcile(&bodies, Vec2::new(4.0, 2.0));
        assert_eq!(transition.entered, Some(platform));
        assert_eq!(transition.exited, None);
        assert_eq!(link.global_point, Vec2::new(4.0, 2.0));
        assert_eq!(link.local_point, Vec2::new(1.0, 2.0));

        link.standing_on = Some(platform);
        let transition = link.reconcile(&bodies, Vec2::new(4.5, 2.0));
        assert_eq!(transition.stayed, Some(platform));
        assert_eq!(transition.entered, None);
    }

    #[test]
    fn reconcile_reports_exit_when_airborne() {
        let platform = Entity::from_raw(1);
        let mut link = PlatformLink {
            standing_on: None,
            last_standing_on: Some(platform),
            ..default()
        };

        let transition = link.reconcile(&body_at(platform, Vec2::ZERO), Vec2::ZERO);

        assert_eq!(transition.exited, Some(platform));
        assert!(link.last_standing_on.is_none());

        // Still airborne next frame: nothing further to report.
        let transition = link.reconcile(&body_at(platform, Vec2::ZERO), Vec2::ZERO);
        assert!(transition.is_empty());
    }

    #[test]
    fn reconcile_reports_exit_and_enter_on_body_switch() {
        let first = Entity::from_raw(1);
        let second = Entity::from_raw(2);
        let bodies = OffsetBodies(HashMap::from([(first, Vec2::ZERO), (second, Vec2::X)]));
        let mut link = PlatformLink {
            standing_on: Some(second),
            last_standing_on: Some(first),
            ..default()
        };

        let transition = link.reconcile(&bodies, Vec2::new(2.0, 0.0));

        assert_eq!(transition.exited, Some(first));
        assert_eq!(transition.entered, Some(second));
        assert_eq!(transition.stayed, None);
        assert_eq!(link.last_standing_on, Some(second));
    }
}
