use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Nothing to pack")]
    Empty,
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Key not found in atlas: {0}")]
    NotFound(String),
    #[error("Atlas grew to {width}x{height}, exceeding the limit of {max_width}x{max_height}")]
    TooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error(
        "Blit of {width}x{height} at ({x}, {y}) falls outside the {surface_width}x{surface_height} surface"
    )]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        surface_width: u32,
        surface_height: u32,
    },
    #[error("Encoding error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, AtlasError>;

/// Failure to obtain pixel data for a single sprite.
///
/// These are contained by the builder: the sprite is replaced with the
/// placeholder image and the batch continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RGBA buffer for {width}x{height} must be {expected} bytes, got {actual}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Image has zero size: {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
    #[error("{0}")]
    Other(String),
}
