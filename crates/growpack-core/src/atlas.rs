use crate::error::{AtlasError, Result};
use crate::model::{AtlasStats, Placement, Rect, UvRect};
use image::RgbaImage;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map::Iter;
use std::fmt::Display;
use std::hash::Hash;

/// A finished atlas: its size, backing surface and where each key was placed.
///
/// Immutable once built. Lookups for keys that were never packed fail with
/// [`AtlasError::NotFound`].
#[derive(Debug, Clone)]
pub struct Atlas<K, S = RgbaImage> {
    width: u32,
    height: u32,
    surface: S,
    regions: HashMap<K, Placement>,
}

impl<K: Eq + Hash, S> Atlas<K, S> {
    pub(crate) fn new(width: u32, height: u32, surface: S, regions: HashMap<K, Placement>) -> Self {
        Self {
            width,
            height,
            surface,
            regions,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Splits the atlas into its surface and the key -> placement table.
    pub fn into_parts(self) -> (S, HashMap<K, Placement>) {
        (self.surface, self.regions)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.regions.contains_key(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&Placement>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.regions.get(key)
    }

    pub fn iter(&self) -> Iter<'_, K, Placement> {
        self.regions.iter()
    }

    /// Pixel rectangle of `key` inside the atlas.
    pub fn region<Q>(&self, key: &Q) -> Result<Rect>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        self.regions
            .get(key)
            .map(|p| p.rect)
            .ok_or_else(|| AtlasError::NotFound(key.to_string()))
    }

    /// Normalized texture coordinates of `key`.
    pub fn uv<Q>(&self, key: &Q) -> Result<UvRect>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        let rect = self.region(key)?;
        Ok(UvRect::from_rect(&rect, self.width, self.height))
    }

    pub fn u0<Q>(&self, key: &Q) -> Result<f32>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        self.uv(key).map(|uv| uv.u0)
    }

    pub fn v0<Q>(&self, key: &Q) -> Result<f32>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        self.uv(key).map(|uv| uv.v0)
    }

    pub fn u1<Q>(&self, key: &Q) -> Result<f32>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        self.uv(key).map(|uv| uv.u1)
    }

    pub fn v1<Q>(&self, key: &Q) -> Result<f32>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        self.uv(key).map(|uv| uv.v1)
    }

    /// True if `key` was packed with the placeholder image.
    pub fn is_placeholder<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.regions.get(key).is_some_and(|p| p.placeholder)
    }

    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> AtlasStats {
        AtlasStats::from_placements(self.width, self.height, self.regions.values())
    }
}
