mod backend;
mod map_renderer;
mod present;
mod renderer;
mod software;
mod sprites;
mod transform;
mod water;

pub use backend::{
    BackendCall, CallLog, Primitive, RecordedSubmission, RecordingBackend, RenderBackend,
    RenderMode, RenderTargetId, Submission, TextureData, TextureId, Uniforms,
};
pub use map_renderer::{placeholder_tile_set, MapRenderData, MapRenderer};
pub use present::PixelsPresenter;
pub use renderer::{
    RenderState, RenderTarget, RenderTargetBinder, RenderTargetTexture, Renderer, MAX_BATCH_QUADS,
};
pub use software::SoftwareBackend;
pub use sprites::{draw_sprite_frame, RenderingSystem};
pub use transform::{
    determine_default_viewport, game_screen_upscale, projection_matrix, transform_point,
    GAME_SCREEN_HEIGHT, GAME_SCREEN_WIDTH, INGAME_VIEWPORT_OFFSET, INGAME_VIEWPORT_SIZE_PX,
    LOGICAL_DISPLAY_HEIGHT, LOGICAL_DISPLAY_WIDTH,
};
pub use water::{
    apply_water_effect, create_water_surface_anim_image, palette_index, water_index,
    DEFAULT_INGAME_PALETTE, WATER_ANIM_STEPS, WATER_MASK_HEIGHT, WATER_MASK_INDEX_FILLED,
    WATER_MASK_WIDTH, WATER_NUM_MASKS,
};
