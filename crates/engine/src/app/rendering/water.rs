use crate::base::{Color, Image};

pub const WATER_MASK_WIDTH: i32 = 8;
pub const WATER_MASK_HEIGHT: i32 = 8;
pub const WATER_NUM_MASKS: i32 = 5;
pub const WATER_MASK_INDEX_FILLED: i32 = 4;
pub const WATER_ANIM_STEPS: i32 = 4;

const PATTERN_CALM_SURFACE: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1];
const PATTERN_WAVE_RIGHT: [u8; 16] = [0, 0, 0, 0, 0, 1, 1, 0, 1, 0, 0, 1, 1, 1, 1, 1];
const PATTERN_WAVE_LEFT: [u8; 16] = [0, 1, 1, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 0, 1];

pub const DEFAULT_INGAME_PALETTE: [Color; 16] = [
    Color::rgb(0, 0, 0),
    Color::rgb(20, 20, 20),
    Color::rgb(40, 40, 40),
    Color::rgb(60, 60, 60),
    Color::rgb(85, 85, 85),
    Color::rgb(105, 105, 105),
    Color::rgb(125, 125, 125),
    Color::rgb(145, 145, 145),
    Color::rgb(0, 20, 60),
    Color::rgb(0, 40, 105),
    Color::rgb(20, 60, 145),
    Color::rgb(40, 85, 190),
    Color::rgb(170, 85, 0),
    Color::rgb(210, 125, 20),
    Color::rgb(230, 190, 60),
    Color::rgb(255, 255, 255),
];

/// Mask texture for the water effect: five 8x8 masks stacked vertically
/// (calm, wave right, calm, wave left, filled).
///
/// The animated masks only describe their top two rows; everything below
/// is fully covered.
pub fn create_water_surface_anim_image() -> Image {
    let width = WATER_MASK_WIDTH as u32;
    let height = (WATER_MASK_HEIGHT * WATER_NUM_MASKS) as u32;
    let mut image = Image::filled(width, height, Color::WHITE);

    let patterns = [
        &PATTERN_CALM_SURFACE,
        &PATTERN_WAVE_RIGHT,
        &PATTERN_CALM_SURFACE,
        &PATTERN_WAVE_LEFT,
    ];
    for (mask_index, pattern) in patterns.iter().enumerate() {
        let start_row = mask_index as u32 * WATER_MASK_HEIGHT as u32;
        for (offset, value) in pattern.iter().enumerate() {
            let level = 255 * value;
            let x = offset as u32 % width;
            let y = start_row + offset as u32 / width;
            image.set_pixel(x, y, Color::rgba(level, level, level, level));
        }
    }
    image
}

/// Index of the last palette entry matching `color` by RGB, or 0.
pub fn palette_index(color: Color, palette: &[Color; 16]) -> usize {
    palette
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.r == color.r && entry.g == color.g && entry.b == color.b)
        .map(|(index, _)| index)
        .last()
        .unwrap_or(0)
}

pub fn water_index(index: usize) -> usize {
    (index & 0x3) | 0x8
}

/// Palette-shifted underwater version of `color`. Alpha is kept.
pub fn apply_water_effect(color: Color, palette: &[Color; 16]) -> Color {
    let replacement = palette[water_index(palette_index(color, palette))];
    Color::rgba(replacement.r, replacement.g, replacement.b, color.a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_index_five_maps_to_nine() {
        assert_eq!(water_index(5), 0x9);
        let shifted = apply_water_effect(DEFAULT_INGAME_PALETTE[5], &DEFAULT_INGAME_PALETTE);
        assert_eq!(shifted, DEFAULT_INGAME_PALETTE[9]);
    }

    #[test]
    fn unknown_colors_use_palette_entry_zero() {
        let shifted = apply_water_effect(Color::rgba(1, 2, 3, 77), &DEFAULT_INGAME_PALETTE);
        let expected = DEFAULT_INGAME_PALETTE[8];
        assert_eq!(shifted, Color::rgba(expected.r, expected.g, expected.b, 77));
    }

    #[test]
    fn last_matching_palette_entry_wins() {
        let mut palette = DEFAULT_INGAME_PALETTE;
        palette[14] = palette[2];
        assert_eq!(palette_index(palette[2], &palette), 14);
    }

    #[test]
    fn mask_image_layout() {
        let image = create_water_surface_anim_image();
        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 40);

        // calm: first row empty, second row full
        assert_eq!(image.pixel(3, 0).r, 0);
        assert_eq!(image.pixel(3, 1).r, 255);
        // wave right: pixel 5 of the first row is set
        assert_eq!(image.pixel(5, 8).r, 255);
        assert_eq!(image.pixel(1, 9).r, 0);
        // wave left
        assert_eq!(image.pixel(1, 24).r, 255);
        // everything below the pattern rows and the filled mask are covered
        assert_eq!(image.pixel(0, 7).r, 255);
        assert!((32..40).all(|y| (0..8).all(|x| image.pixel(x, y).r == 255)));
    }
}
