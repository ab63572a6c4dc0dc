use crate::error::{AtlasError, Result};
use image::{GenericImage, Rgba, RgbaImage};

/// Backing storage the builder copies sprite pixels into.
///
/// `RgbaImage` keeps the atlas on the CPU; a renderer can implement this to
/// receive the blits directly (e.g. as sub-image texture uploads).
pub trait Surface: Sized {
    /// Creates a `width x height` surface filled with `background`.
    fn allocate(width: u32, height: u32, background: Rgba<u8>) -> Result<Self>;

    /// Copies `pixels` with its top-left corner at `(x, y)`.
    fn blit(&mut self, x: u32, y: u32, pixels: &RgbaImage) -> Result<()>;
}

impl Surface for RgbaImage {
    fn allocate(width: u32, height: u32, background: Rgba<u8>) -> Result<Self> {
        Ok(RgbaImage::from_pixel(width, height, background))
    }

    fn blit(&mut self, x: u32, y: u32, pixels: &RgbaImage) -> Result<()> {
        let (sw, sh) = pixels.dimensions();
        let (cw, ch) = self.dimensions();
        if x as u64 + sw as u64 > cw as u64 || y as u64 + sh as u64 > ch as u64 {
            return Err(AtlasError::OutOfBounds {
                x,
                y,
                width: sw,
                height: sh,
                surface_width: cw,
                surface_height: ch,
            });
        }
        self.copy_from(pixels, x, y)?;
        Ok(())
    }
}

/// Layout-only builds: nothing is allocated and blits are dropped.
impl Surface for () {
    fn allocate(_width: u32, _height: u32, _background: Rgba<u8>) -> Result<Self> {
        Ok(())
    }

    fn blit(&mut self, _x: u32, _y: u32, _pixels: &RgbaImage) -> Result<()> {
        Ok(())
    }
}
