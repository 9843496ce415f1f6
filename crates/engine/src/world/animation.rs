use crate::base::{pixels_to_tiles, Extents, Rect};

use super::components::{AnimationLoop, Orientation, Sprite, SpriteDrawData, IGNORE_RENDER_SLOT};
use super::entity::Entity;
use super::EntityWorld;

/// Maps a logical frame to an index into the draw data's frame list.
///
/// Right-facing entities add the orientation offset first; the optional
/// frame map is applied to the result.
pub fn virtual_to_real_frame(
    virtual_frame: i32,
    draw_data: &SpriteDrawData,
    orientation: Option<Orientation>,
) -> i32 {
    let mut real_frame = virtual_frame;
    if let (Some(offset), Some(Orientation::Right)) = (draw_data.orientation_offset, orientation) {
        real_frame += offset;
    }
    if !draw_data.virtual_to_real_frame_map.is_empty() {
        real_frame = draw_data.virtual_to_real_frame_map[real_frame as usize];
    }
    real_frame
}

/// Resizes the entity's bounding box to the frame shown in `render_slot`.
pub fn synchronize_bounding_box_to_sprite(world: &mut EntityWorld, entity: Entity, render_slot: usize) {
    let Some(sprite) = world.sprites.get(entity) else {
        return;
    };
    let Some(&virtual_frame) = sprite.frames_to_render.get(render_slot) else {
        return;
    };
    if virtual_frame == IGNORE_RENDER_SLOT {
        return;
    }
    let orientation = world.orientations.get(entity).copied();
    let frame_index = virtual_to_real_frame(virtual_frame, &sprite.draw_data, orientation);
    let frame = &sprite.draw_data.frames[frame_index as usize];
    let bbox = Rect {
        top_left: frame.draw_offset,
        size: Extents::new(
            pixels_to_tiles(frame.image.width),
            pixels_to_tiles(frame.image.height),
        ),
    };
    world.bounding_boxes.insert(entity, bbox);
}

fn advance_animation(sprite: &mut Sprite, animation: &AnimationLoop) {
    let num_frames = sprite.num_frames();
    let end_frame = animation.end_frame.unwrap_or(num_frames - 1);
    assert!(
        end_frame >= 0 && end_frame < num_frames,
        "animation end frame {end_frame} outside of {num_frames} frames"
    );
    assert!(
        end_frame > animation.start_frame,
        "animations need at least two frames"
    );
    assert!(
        animation.render_slot < sprite.frames_to_render.len(),
        "animation render slot {} out of range",
        animation.render_slot
    );

    let mut next_frame = sprite.frames_to_render[animation.render_slot] + 1;
    if next_frame > end_frame {
        next_frame = animation.start_frame;
    }
    sprite.frames_to_render[animation.render_slot] = next_frame;
}

/// Advances animation loops, then sequences, then clears white flashes.
pub fn update_animated_sprites(world: &mut EntityWorld) {
    for entity in world.animation_loops.entities(&world.registry) {
        let Some(animation) = world.animation_loops.get_mut(entity) else {
            continue;
        };
        let Some(sprite) = world.sprites.get_mut(entity) else {
            continue;
        };
        animation.frames_elapsed += 1;
        if animation.frames_elapsed < animation.delay_in_frames {
            continue;
        }
        animation.frames_elapsed = 0;
        advance_animation(sprite, animation);
        if animation.render_slot == 0 && world.auto_bounding_boxes.contains(entity) {
            synchronize_bounding_box_to_sprite(world, entity, 0);
        }
    }

    for entity in world.animation_sequences.entities(&world.registry) {
        let Some(sequence) = world.animation_sequences.get_mut(entity) else {
            continue;
        };
        let Some(sprite) = world.sprites.get_mut(entity) else {
            continue;
        };
        sequence.current_frame += 1;
        if sequence.current_frame >= sequence.frames.len() {
            if sequence.repeat {
                sequence.current_frame = 0;
            } else {
                world.animation_sequences.remove(entity);
                continue;
            }
        }
        sprite.frames_to_render[sequence.render_slot] = sequence.frames[sequence.current_frame];
        if sequence.render_slot == 0 && world.auto_bounding_boxes.contains(entity) {
            synchronize_bounding_box_to_sprite(world, entity, 0);
        }
    }

    for (_, sprite) in world.sprites.iter_mut(&world.registry) {
        sprite.flashing_white = false;
    }
}
