use image::RgbaImage;

pub const PLACEHOLDER_SIZE: (u32, u32) = (2, 2);

/// 2x2 magenta/black checkerboard, row-major RGBA.
pub const PLACEHOLDER_PIXELS: [u8; 16] = [
    255, 0, 255, 255, 0, 0, 0, 255, //
    0, 0, 0, 255, 255, 0, 255, 255,
];

/// The image substituted for sprites whose pixels could not be obtained.
pub fn placeholder_image() -> RgbaImage {
    let (w, h) = PLACEHOLDER_SIZE;
    RgbaImage::from_fn(w, h, |x, y| {
        let i = ((y * w + x) * 4) as usize;
        image::Rgba([
            PLACEHOLDER_PIXELS[i],
            PLACEHOLDER_PIXELS[i + 1],
            PLACEHOLDER_PIXELS[i + 2],
            PLACEHOLDER_PIXELS[i + 3],
        ])
    })
}
