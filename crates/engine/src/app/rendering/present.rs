use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::base::Image;

/// Copies a CPU framebuffer to the window through `pixels`.
pub struct PixelsPresenter {
    window: &'static Window,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl PixelsPresenter {
    pub fn new(window: &'static Window) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(window, size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(self.window, width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(window: &'static Window, width: u32, height: u32) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// Presents `framebuffer`; a size mismatch during a resize is skipped.
    pub fn present(&mut self, framebuffer: &Image) -> Result<(), Error> {
        if framebuffer.width() != self.width || framebuffer.height() != self.height {
            return Ok(());
        }
        copy_image_to_frame(framebuffer, self.pixels.frame_mut());
        self.pixels.render()
    }
}

fn copy_image_to_frame(image: &Image, frame: &mut [u8]) {
    for (chunk, color) in frame.chunks_exact_mut(4).zip(image.pixels()) {
        chunk.copy_from_slice(&[color.r, color.g, color.b, 255]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Color;

    #[test]
    fn frame_copy_is_opaque_rgba() {
        let mut image = Image::filled(2, 1, Color::rgba(10, 20, 30, 0));
        image.set_pixel(1, 0, Color::WHITE);
        let mut frame = vec![0u8; 8];

        copy_image_to_frame(&image, &mut frame);

        assert_eq!(frame, vec![10, 20, 30, 255, 255, 255, 255, 255]);
    }
}
