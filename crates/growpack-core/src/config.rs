use crate::model::Block;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Orders in which sprites are handed to the packer.
///
/// Larger-first orders reduce fragmentation in a growing packer. All sorts are
/// stable, so equal blocks keep their input order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Height descending, then width descending.
    HeightDesc,
    /// Width descending, then height descending.
    WidthDesc,
    /// Area descending, then height descending.
    AreaDesc,
    /// Longer side descending, then shorter side descending.
    MaxSideDesc,
    /// Keep input order.
    None,
}

impl SortOrder {
    pub fn compare(&self, a: &Block, b: &Block) -> Ordering {
        match self {
            SortOrder::HeightDesc => b.h.cmp(&a.h).then_with(|| b.w.cmp(&a.w)),
            SortOrder::WidthDesc => b.w.cmp(&a.w).then_with(|| b.h.cmp(&a.h)),
            SortOrder::AreaDesc => b.area().cmp(&a.area()).then_with(|| b.h.cmp(&a.h)),
            SortOrder::MaxSideDesc => b
                .w
                .max(b.h)
                .cmp(&a.w.max(a.h))
                .then_with(|| b.w.min(b.h).cmp(&a.w.min(a.h))),
            SortOrder::None => Ordering::Equal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::HeightDesc => "height_desc",
            SortOrder::WidthDesc => "width_desc",
            SortOrder::AreaDesc => "area_desc",
            SortOrder::MaxSideDesc => "max_side_desc",
            SortOrder::None => "none",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "height_desc" | "height" => Ok(Self::HeightDesc),
            "width_desc" | "width" => Ok(Self::WidthDesc),
            "area_desc" | "area" => Ok(Self::AreaDesc),
            "max_side_desc" | "maxside" => Ok(Self::MaxSideDesc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// What to do when the same key is submitted more than once in a build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// Fail the build with `AtlasError::DuplicateKey`.
    Reject,
    /// The first occurrence wins; later ones are dropped before packing.
    KeepFirst,
    /// The last occurrence wins; earlier ones are dropped before packing.
    KeepLast,
}

impl FromStr for DuplicateKeyPolicy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "keep_first" | "first" => Ok(Self::KeepFirst),
            "keep_last" | "last" => Ok(Self::KeepLast),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuilderConfig {
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
    #[serde(default = "default_duplicate_keys")]
    pub duplicate_keys: DuplicateKeyPolicy,
    /// RGBA fill for surface pixels no sprite covers.
    #[serde(default)]
    pub background_color: [u8; 4],
    /// Upper bound on the grown atlas width. None disables the check.
    #[serde(default)]
    pub max_width: Option<u32>,
    /// Upper bound on the grown atlas height. None disables the check.
    #[serde(default)]
    pub max_height: Option<u32>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            sort_order: default_sort_order(),
            duplicate_keys: default_duplicate_keys(),
            background_color: [0, 0, 0, 0],
            max_width: None,
            max_height: None,
        }
    }
}

impl BuilderConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if a size limit is set to zero.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasError;

        if self.max_width == Some(0) || self.max_height == Some(0) {
            return Err(AtlasError::InvalidDimensions {
                width: self.max_width.unwrap_or(0),
                height: self.max_height.unwrap_or(0),
            });
        }
        Ok(())
    }

    /// Checks grown atlas dimensions against `max_width`/`max_height`.
    pub(crate) fn check_size(&self, width: u32, height: u32) -> crate::error::Result<()> {
        let max_w = self.max_width.unwrap_or(u32::MAX);
        let max_h = self.max_height.unwrap_or(u32::MAX);
        if width > max_w || height > max_h {
            return Err(crate::error::AtlasError::TooLarge {
                width,
                height,
                max_width: max_w,
                max_height: max_h,
            });
        }
        Ok(())
    }

    /// Create a fluent builder for `BuilderConfig`.
    pub fn builder() -> BuilderConfigBuilder {
        BuilderConfigBuilder::new()
    }
}

fn default_sort_order() -> SortOrder {
    SortOrder::HeightDesc
}
fn default_duplicate_keys() -> DuplicateKeyPolicy {
    DuplicateKeyPolicy::KeepLast
}

/// Builder for `BuilderConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct BuilderConfigBuilder {
    cfg: BuilderConfig,
}

impl BuilderConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: BuilderConfig::default(),
        }
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.sort_order = v;
        self
    }
    pub fn duplicate_keys(mut self, v: DuplicateKeyPolicy) -> Self {
        self.cfg.duplicate_keys = v;
        self
    }
    pub fn background_color(mut self, v: [u8; 4]) -> Self {
        self.cfg.background_color = v;
        self
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = Some(w);
        self.cfg.max_height = Some(h);
        self
    }
    pub fn build(self) -> BuilderConfig {
        self.cfg
    }
}
