use crate::atlas::Atlas;
use crate::config::{BuilderConfig, DuplicateKeyPolicy};
use crate::error::{AtlasError, DecodeError, Result};
use crate::model::{Block, Placement, Rect};
use crate::packer::GrowingPacker;
use crate::placeholder::placeholder_image;
use crate::surface::Surface;
use image::{DynamicImage, Rgba, RgbaImage};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use tracing::{debug, instrument, warn};

/// Outcome of decoding one sprite's pixels.
pub type DecodeResult = std::result::Result<RgbaImage, DecodeError>;

/// Custom ordering over blocks, applied before packing.
pub type Comparator = Box<dyn Fn(&Block, &Block) -> Ordering>;

/// One sprite to pack: a key and either its RGBA pixels or why they are missing.
#[derive(Debug)]
pub struct InputSprite<K> {
    pub key: K,
    pub pixels: DecodeResult,
}

impl<K> InputSprite<K> {
    pub fn new(key: K, pixels: DecodeResult) -> Self {
        Self { key, pixels }
    }

    pub fn from_image(key: K, image: DynamicImage) -> Self {
        Self::new(key, Ok(image.into_rgba8()))
    }

    /// Wraps a raw row-major RGBA8 buffer without padding. A buffer whose
    /// length is not `width * height * 4` becomes a decode failure.
    pub fn from_raw(key: K, width: u32, height: u32, data: Vec<u8>) -> Self {
        let expected = width as usize * height as usize * 4;
        let actual = data.len();
        let pixels = if actual != expected {
            Err(DecodeError::BufferSize {
                width,
                height,
                expected,
                actual,
            })
        } else {
            RgbaImage::from_raw(width, height, data).ok_or(DecodeError::BufferSize {
                width,
                height,
                expected,
                actual,
            })
        };
        Self::new(key, pixels)
    }

    pub fn failed(key: K, error: DecodeError) -> Self {
        Self::new(key, Err(error))
    }
}

/// Turns a caller-side source (path, bytes, handle...) into RGBA pixels.
pub trait SpriteDecoder<S> {
    fn decode(&mut self, source: S) -> DecodeResult;
}

impl<S, F> SpriteDecoder<S> for F
where
    F: FnMut(S) -> DecodeResult,
{
    fn decode(&mut self, source: S) -> DecodeResult {
        self(source)
    }
}

struct Sprite<K> {
    key: K,
    block: Block,
    pixels: RgbaImage,
    placeholder: bool,
}

/// Collects sprites and packs them into a single growing atlas.
///
/// Sprites whose pixels cannot be obtained are replaced by the 2x2 placeholder
/// and the build carries on. Sprites are sorted (by `sort_order`, or a custom
/// comparator) before packing; the sort is stable.
pub struct AtlasBuilder<K> {
    cfg: BuilderConfig,
    inputs: Vec<InputSprite<K>>,
    comparator: Option<Comparator>,
}

impl<K: Eq + Hash + Display> AtlasBuilder<K> {
    pub fn new(cfg: BuilderConfig) -> Self {
        Self {
            cfg,
            inputs: Vec::new(),
            comparator: None,
        }
    }

    /// Orders blocks with `cmp` instead of the configured `sort_order`.
    pub fn with_comparator<F>(mut self, cmp: F) -> Self
    where
        F: Fn(&Block, &Block) -> Ordering + 'static,
    {
        self.comparator = Some(Box::new(cmp));
        self
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.cfg
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn push(&mut self, input: InputSprite<K>) -> &mut Self {
        self.inputs.push(input);
        self
    }

    pub fn add(&mut self, key: K, pixels: DecodeResult) -> &mut Self {
        self.push(InputSprite::new(key, pixels))
    }

    pub fn add_image(&mut self, key: K, image: DynamicImage) -> &mut Self {
        self.push(InputSprite::from_image(key, image))
    }

    pub fn add_raw(&mut self, key: K, width: u32, height: u32, data: Vec<u8>) -> &mut Self {
        self.push(InputSprite::from_raw(key, width, height, data))
    }

    pub fn add_failed(&mut self, key: K, error: DecodeError) -> &mut Self {
        self.push(InputSprite::failed(key, error))
    }

    /// Decodes each `(key, source)` with `decoder`, in order.
    pub fn decode_all<S, D, I>(&mut self, items: I, decoder: &mut D) -> &mut Self
    where
        I: IntoIterator<Item = (K, S)>,
        D: SpriteDecoder<S>,
    {
        for (key, source) in items {
            let pixels = decoder.decode(source);
            self.add(key, pixels);
        }
        self
    }

    /// Packs into a CPU `RgbaImage` surface.
    pub fn build(self) -> Result<Atlas<K>> {
        self.build_into::<RgbaImage>()
    }

    /// Packs and blits every sprite into a freshly allocated `S`.
    #[instrument(skip_all, fields(inputs = self.inputs.len()))]
    pub fn build_into<S: Surface>(self) -> Result<Atlas<K, S>> {
        let AtlasBuilder {
            cfg,
            inputs,
            comparator,
        } = self;
        cfg.validate()?;
        if inputs.is_empty() {
            return Err(AtlasError::Empty);
        }

        let inputs = resolve_duplicates(inputs, |i| &i.key, cfg.duplicate_keys)?;
        let mut sprites: Vec<Sprite<K>> = inputs.into_iter().map(into_sprite).collect();

        match &comparator {
            Some(cmp) => sprites.sort_by(|a, b| cmp(&a.block, &b.block)),
            None => sprites.sort_by(|a, b| cfg.sort_order.compare(&a.block, &b.block)),
        }

        let mut blocks: Vec<Block> = sprites.iter().map(|s| s.block).collect();
        let mut packer = GrowingPacker::new();
        packer.fit(&mut blocks)?;
        let (width, height) = (packer.width(), packer.height());
        drop(packer);
        cfg.check_size(width, height)?;
        debug!(width, height, sprites = sprites.len(), "packed");

        let mut surface = S::allocate(width, height, Rgba(cfg.background_color))?;
        let mut regions = HashMap::with_capacity(sprites.len());
        for (sprite, block) in sprites.into_iter().zip(blocks) {
            let Sprite {
                key,
                pixels,
                placeholder,
                ..
            } = sprite;
            let rect = block
                .placement()
                .ok_or_else(|| AtlasError::InvalidInput(format!("sprite {} was not placed", key)))?;
            let copied = surface.blit(rect.x, rect.y, &pixels);
            drop(pixels);
            copied?;
            regions.insert(key, Placement { rect, placeholder });
        }

        Ok(Atlas::new(width, height, surface, regions))
    }
}

/// Builds an atlas from `inputs` in one call.
pub fn build_atlas<K: Eq + Hash + Display>(
    inputs: Vec<InputSprite<K>>,
    cfg: BuilderConfig,
) -> Result<Atlas<K>> {
    let mut builder = AtlasBuilder::new(cfg);
    for input in inputs {
        builder.push(input);
    }
    builder.build()
}

/// Packs sizes only. Inputs are `(key, width, height)`; the result has no pixels.
///
/// Sorting, duplicate handling and growth match [`AtlasBuilder::build`], so the
/// placements equal those of a full build over images of the same sizes.
#[instrument(skip_all, fields(inputs = items.len()))]
pub fn pack_layout<K: Eq + Hash + Display>(
    items: Vec<(K, u32, u32)>,
    cfg: BuilderConfig,
) -> Result<Atlas<K, ()>> {
    cfg.validate()?;
    if items.is_empty() {
        return Err(AtlasError::Empty);
    }
    if let Some((_, w, h)) = items.iter().find(|(_, w, h)| *w == 0 || *h == 0) {
        return Err(AtlasError::InvalidDimensions {
            width: *w,
            height: *h,
        });
    }

    let mut items = resolve_duplicates(items, |(k, _, _)| k, cfg.duplicate_keys)?;
    items.sort_by(|a, b| {
        cfg.sort_order
            .compare(&Block::new(a.1, a.2), &Block::new(b.1, b.2))
    });

    let mut blocks: Vec<Block> = items.iter().map(|(_, w, h)| Block::new(*w, *h)).collect();
    let mut packer = GrowingPacker::new();
    packer.fit(&mut blocks)?;
    let (width, height) = (packer.width(), packer.height());
    cfg.check_size(width, height)?;

    let mut regions = HashMap::with_capacity(items.len());
    for ((key, w, h), block) in items.into_iter().zip(blocks) {
        let (x, y) = block
            .fit
            .ok_or_else(|| AtlasError::InvalidInput(format!("item {} was not placed", key)))?;
        regions.insert(
            key,
            Placement {
                rect: Rect::new(x, y, w, h),
                placeholder: false,
            },
        );
    }
    Ok(Atlas::new(width, height, (), regions))
}

fn into_sprite<K: Display>(input: InputSprite<K>) -> Sprite<K> {
    let InputSprite { key, pixels } = input;
    let decoded = pixels.and_then(|img| {
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            Err(DecodeError::ZeroSize {
                width: w,
                height: h,
            })
        } else {
            Ok(img)
        }
    });
    let (pixels, placeholder) = match decoded {
        Ok(img) => (img, false),
        Err(e) => {
            warn!(key = %key, error = %e, "failed to load sprite; using placeholder");
            (placeholder_image(), true)
        }
    };
    let (w, h) = pixels.dimensions();
    Sprite {
        key,
        block: Block::new(w, h),
        pixels,
        placeholder,
    }
}

/// Applies `policy` to repeated keys, keeping input order among survivors.
fn resolve_duplicates<T, K, F>(items: Vec<T>, key_of: F, policy: DuplicateKeyPolicy) -> Result<Vec<T>>
where
    K: Eq + Hash + Display,
    F: Fn(&T) -> &K,
{
    let mut keep = vec![true; items.len()];
    let mut seen: HashMap<&K, usize> = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let key = key_of(item);
        let Some(&prev) = seen.get(key) else {
            seen.insert(key, i);
            continue;
        };
        debug!(key = %key, ?policy, "duplicate key");
        match policy {
            DuplicateKeyPolicy::Reject => return Err(AtlasError::DuplicateKey(key.to_string())),
            DuplicateKeyPolicy::KeepFirst => keep[i] = false,
            DuplicateKeyPolicy::KeepLast => {
                keep[prev] = false;
                seen.insert(key, i);
            }
        }
    }
    drop(seen);
    Ok(items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, k)| k.then_some(item))
        .collect())
}
