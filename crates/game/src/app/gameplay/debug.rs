const DEBUG_BOUNDING_BOX_COLOR: Color = Color::rgba(255, 255, 0, 190);
const DEBUG_SOLID_EDGE_COLOR: Color = Color::rgba(255, 0, 0, 190);

/// Bounding boxes of every entity plus the solid edges of visible tiles.
/// Draws in viewport pixels; the caller sets the viewport translation.
fn render_debug_overlay(renderer: &mut Renderer, session: &LevelSession) {
    let camera_position = session.camera.position();
    let camera_px = tile_vector_to_pixel_vector(camera_position);

    for entity in session.world.bounding_boxes.entities(&session.world.registry) {
        let Some(bounds) = session.world.world_bbox(entity) else {
            continue;
        };
        let top_left = tile_vector_to_pixel_vector(bounds.top_left) - camera_px;
        let size = tile_extents_to_pixel_extents(bounds.size);
        let rect = Rect::new(top_left.x, top_left.y, size.width, size.height);
        renderer.draw_rectangle(rect, DEBUG_BOUNDING_BOX_COLOR);
    }

    let last_x = (camera_position.x + VIEWPORT_WIDTH_TILES).min(session.map.width());
    let last_y = (camera_position.y + VIEWPORT_HEIGHT_TILES).min(session.map.height());
    for y in camera_position.y..last_y {
        for x in camera_position.x..last_x {
            let flags = session.map.collision_data(x, y);
            if flags.is_empty() {
                continue;
            }
            let left = (x - camera_position.x) * TILE_SIZE_PX;
            let top = (y - camera_position.y) * TILE_SIZE_PX;
            let right = left + TILE_SIZE_PX - 1;
            let bottom = top + TILE_SIZE_PX - 1;

            if flags.contains(CollisionFlags::SOLID_TOP) {
                renderer.draw_line(left, top, right, top, DEBUG_SOLID_EDGE_COLOR);
            }
            if flags.contains(CollisionFlags::SOLID_BOTTOM) {
                renderer.draw_line(left, bottom, right, bottom, DEBUG_SOLID_EDGE_COLOR);
            }
            if flags.contains(CollisionFlags::SOLID_LEFT) {
                renderer.draw_line(left, top, left, bottom, DEBUG_SOLID_EDGE_COLOR);
            }
            if flags.contains(CollisionFlags::SOLID_RIGHT) {
                renderer.draw_line(right, top, right, bottom, DEBUG_SOLID_EDGE_COLOR);
            }
        }
    }
}
