//! Packs sprites into one auto-sized texture atlas.
//!
//! - Packer: binary region tree that grows right or down on demand, keeping the atlas near square
//! - Builder: sorts sprites, substitutes a placeholder for sprites that failed to decode, packs and blits
//! - Atlas: immutable key -> rectangle table with normalized UV queries
//!
//! Quick example:
//! ```ignore
//! use growpack_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let mut builder = AtlasBuilder::new(BuilderConfig::default());
//! builder.add_image("hero".to_string(), image::open("hero.png")?);
//! builder.add_image("tree".to_string(), image::open("tree.png")?);
//! let atlas = builder.build()?;
//! let uv = atlas.uv("hero")?;
//! println!("{}x{} hero at {:?}", atlas.width(), atlas.height(), uv);
//! # Ok(()) }
//! ```

pub mod atlas;
pub mod builder;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod packer;
pub mod placeholder;
pub mod surface;

pub use atlas::*;
pub use builder::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use packer::*;
pub use placeholder::*;
pub use surface::*;

/// Convenience prelude for common types and functions.
/// Importing `growpack_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::atlas::Atlas;
    pub use crate::builder::{
        AtlasBuilder, DecodeResult, InputSprite, SpriteDecoder, build_atlas, pack_layout,
    };
    pub use crate::config::{BuilderConfig, BuilderConfigBuilder, DuplicateKeyPolicy, SortOrder};
    pub use crate::error::{AtlasError, DecodeError};
    pub use crate::model::{AtlasStats, Block, Placement, Rect, UvRect};
    pub use crate::packer::GrowingPacker;
    pub use crate::surface::Surface;
}
