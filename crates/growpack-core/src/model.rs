use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share any pixel. Empty rectangles never intersect.
    pub fn intersects(&self, r: &Rect) -> bool {
        if self.is_empty() || r.is_empty() {
            return false;
        }
        !(self.x >= r.x + r.w || r.x >= self.x + self.w || self.y >= r.y + r.h || r.y >= self.y + self.h)
    }
}

/// A placement request: a `w x h` rectangle and, once packed, its origin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub w: u32,
    pub h: u32,
    /// Top-left corner assigned by the packer; `None` until placed.
    pub fit: Option<(u32, u32)>,
}

impl Block {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h, fit: None }
    }

    /// The placed rectangle, if the block has been packed.
    pub fn placement(&self) -> Option<Rect> {
        self.fit.map(|(x, y)| Rect::new(x, y, self.w, self.h))
    }

    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
}

/// Normalized texture coordinates of a placed region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    /// Maps a pixel rectangle into `[0, 1]` space of a `width x height` surface.
    pub fn from_rect(rect: &Rect, width: u32, height: u32) -> Self {
        let fw = width as f32;
        let fh = height as f32;
        Self {
            u0: rect.x as f32 / fw,
            v0: rect.y as f32 / fh,
            u1: (rect.x + rect.w) as f32 / fw,
            v1: (rect.y + rect.h) as f32 / fh,
        }
    }
}

/// Where a sprite ended up inside the atlas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement {
    pub rect: Rect,
    /// True if the sprite's pixels could not be obtained and the placeholder was used.
    pub placeholder: bool,
}

/// Atlas-level metadata written alongside exported layouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Schema version of the exported JSON; bumped on incompatible changes.
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub size: (u32, u32),
    pub sort_order: String,
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtlasStats {
    /// Number of sprites placed.
    pub num_sprites: usize,
    /// Number of sprites that fell back to the placeholder image.
    pub num_placeholders: usize,
    pub width: u32,
    pub height: u32,
    /// `width * height`.
    pub atlas_area: u64,
    /// Sum of placed sprite areas.
    pub used_area: u64,
    /// Occupancy ratio: used_area / atlas_area (0.0 to 1.0).
    /// Higher is better (less wasted space).
    pub occupancy: f64,
}

impl AtlasStats {
    pub(crate) fn from_placements<'a>(
        width: u32,
        height: u32,
        placements: impl Iterator<Item = &'a Placement>,
    ) -> Self {
        let mut num_sprites = 0;
        let mut num_placeholders = 0;
        let mut used_area = 0u64;
        for p in placements {
            num_sprites += 1;
            used_area += p.rect.area();
            if p.placeholder {
                num_placeholders += 1;
            }
        }
        let atlas_area = (width as u64) * (height as u64);
        let occupancy = if atlas_area > 0 {
            used_area as f64 / atlas_area as f64
        } else {
            0.0
        };
        Self {
            num_sprites,
            num_placeholders,
            width,
            height,
            atlas_area,
            used_area,
            occupancy,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Size: {}x{}, Sprites: {}, Placeholders: {}, Occupancy: {:.2}%, Atlas Area: {} px², Used Area: {} px²",
            self.width,
            self.height,
            self.num_sprites,
            self.num_placeholders,
            self.occupancy * 100.0,
            self.atlas_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.atlas_area.saturating_sub(self.used_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.atlas_area > 0 {
            (self.wasted_area() as f64 / self.atlas_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
