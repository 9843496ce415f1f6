use crate::base::{Extents, Rect, Vector};

use super::components::{world_space, ActivationPolicy, Active};
use super::EntityWorld;

pub const VIEWPORT_WIDTH_TILES: i32 = 32;
pub const VIEWPORT_HEIGHT_TILES: i32 = 20;

pub fn viewport_rect(camera_position: Vector) -> Rect {
    Rect {
        top_left: camera_position,
        size: Extents::new(VIEWPORT_WIDTH_TILES, VIEWPORT_HEIGHT_TILES),
    }
}

/// Recomputes the `Active` component of every positioned entity.
///
/// Entities without activation settings are active only while on screen.
pub fn mark_active_entities(world: &mut EntityWorld, camera_position: Vector) {
    let viewport = viewport_rect(camera_position);
    for entity in world.positions.entities(&world.registry) {
        let Some(&position) = world.positions.get(entity) else {
            continue;
        };
        let is_on_screen = match world.bounding_boxes.get(entity) {
            Some(bbox) => world_space(bbox, position).intersects(&viewport),
            None => viewport.contains_point(position),
        };

        let should_be_active = match world.activation.get_mut(entity) {
            None => is_on_screen,
            Some(settings) => match settings.policy {
                ActivationPolicy::Always => true,
                ActivationPolicy::WhenOnScreen => is_on_screen,
                ActivationPolicy::AlwaysAfterFirstActivation => {
                    if is_on_screen {
                        settings.has_been_activated = true;
                    }
                    settings.has_been_activated
                }
            },
        };

        if should_be_active {
            world.active.insert(entity, Active { is_on_screen });
        } else {
            world.active.remove(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::components::ActivationSettings;

    fn spawn_boxed(world: &mut EntityWorld, position: Vector) -> crate::world::Entity {
        let entity = world.spawn_at(position);
        world.bounding_boxes.insert(entity, Rect::new(0, 0, 2, 2));
        entity
    }

    #[test]
    fn entities_in_view_become_active() {
        let mut world = EntityWorld::default();
        let visible = spawn_boxed(&mut world, Vector::new(10, 10));
        let hidden = spawn_boxed(&mut world, Vector::new(60, 10));

        mark_active_entities(&mut world, Vector::ZERO);

        assert_eq!(world.active.get(visible), Some(&Active { is_on_screen: true }));
        assert!(!world.active.contains(hidden));
    }

    #[test]
    fn partially_visible_box_counts_as_on_screen() {
        let mut world = EntityWorld::default();
        let entity = spawn_boxed(&mut world, Vector::new(32, 5));
        mark_active_entities(&mut world, Vector::new(1, 0));
        assert!(world.is_on_screen(entity));
    }

    #[test]
    fn always_active_entities_stay_active_off_screen() {
        let mut world = EntityWorld::default();
        let entity = spawn_boxed(&mut world, Vector::new(100, 100));
        world
            .activation
            .insert(entity, ActivationSettings::new(ActivationPolicy::Always));
        mark_active_entities(&mut world, Vector::ZERO);
        assert_eq!(world.active.get(entity), Some(&Active { is_on_screen: false }));
    }

    #[test]
    fn activation_sticks_after_first_sighting() {
        let mut world = EntityWorld::default();
        let entity = spawn_boxed(&mut world, Vector::new(40, 10));
        world.activation.insert(
            entity,
            ActivationSettings::new(ActivationPolicy::AlwaysAfterFirstActivation),
        );

        mark_active_entities(&mut world, Vector::ZERO);
        assert!(!world.active.contains(entity));

        mark_active_entities(&mut world, Vector::new(20, 0));
        assert!(world.active.contains(entity));

        mark_active_entities(&mut world, Vector::ZERO);
        assert_eq!(world.active.get(entity), Some(&Active { is_on_screen: false }));
    }
}
