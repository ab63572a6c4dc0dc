use growpack_core::placeholder::{PLACEHOLDER_SIZE, placeholder_image};
use growpack_core::prelude::*;
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::HashMap;

fn solid(w: u32, h: u32, c: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba(c))
}

fn disjoint<K, S>(atlas: &Atlas<K, S>) -> bool
where
    K: Eq + std::hash::Hash,
{
    let rects: Vec<Rect> = atlas.iter().map(|(_, p)| p.rect).collect();
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i].intersects(&rects[j]) {
                return false;
            }
        }
    }
    true
}

#[test]
fn builds_and_blits_each_sprite() {
    let mut b = AtlasBuilder::new(BuilderConfig::default());
    b.add("red".to_string(), Ok(solid(64, 64, [255, 0, 0, 255])));
    b.add("green".to_string(), Ok(solid(32, 32, [0, 255, 0, 255])));
    b.add("blue".to_string(), Ok(solid(16, 16, [0, 0, 255, 255])));
    b.add("white".to_string(), Ok(solid(16, 16, [255, 255, 255, 255])));
    let atlas = b.build().expect("build");

    assert_eq!(atlas.dimensions(), (96, 64));
    assert_eq!(atlas.len(), 4);
    assert!(disjoint(&atlas));
    assert_eq!(atlas.region("red").expect("red"), Rect::new(0, 0, 64, 64));
    assert_eq!(atlas.region("green").expect("green"), Rect::new(64, 0, 32, 32));

    let surface = atlas.surface();
    assert_eq!(surface.dimensions(), (96, 64));
    for (key, color) in [
        ("red", [255, 0, 0, 255]),
        ("green", [0, 255, 0, 255]),
        ("blue", [0, 0, 255, 255]),
        ("white", [255, 255, 255, 255]),
    ] {
        let r = atlas.region(key).expect("present");
        assert_eq!(*surface.get_pixel(r.x, r.y), Rgba(color), "top-left of {}", key);
        assert_eq!(*surface.get_pixel(r.right(), r.bottom()), Rgba(color), "bottom-right of {}", key);
    }
}

#[test]
fn uncovered_pixels_use_background_color() {
    let cfg = BuilderConfig::builder()
        .background_color([1, 2, 3, 4])
        .build();
    let mut b = AtlasBuilder::new(cfg);
    b.add("a".to_string(), Ok(solid(4, 4, [9, 9, 9, 255])));
    b.add("b".to_string(), Ok(solid(2, 2, [8, 8, 8, 255])));
    let atlas = b.build().expect("build");
    // 4x4 then 2x2: grows right to 6x4, leaving (4..6, 2..4) free
    assert_eq!(atlas.dimensions(), (6, 4));
    assert_eq!(*atlas.surface().get_pixel(5, 3), Rgba([1, 2, 3, 4]));
}

#[test]
fn failed_decode_becomes_placeholder() {
    let mut b = AtlasBuilder::new(BuilderConfig::default());
    b.add("ok".to_string(), Ok(solid(8, 8, [10, 20, 30, 255])));
    b.add_failed("broken".to_string(), DecodeError::Other("truncated file".into()));
    let atlas = b.build().expect("a bad input must not fail the build");

    assert!(atlas.contains("broken"));
    assert!(atlas.is_placeholder("broken"));
    assert!(!atlas.is_placeholder("ok"));
    let r = atlas.region("broken").expect("placeholder region");
    assert_eq!((r.w, r.h), PLACEHOLDER_SIZE);

    let expected = placeholder_image();
    for y in 0..r.h {
        for x in 0..r.w {
            assert_eq!(atlas.surface().get_pixel(r.x + x, r.y + y), expected.get_pixel(x, y));
        }
    }
    assert_eq!(atlas.stats().num_placeholders, 1);
}

#[test]
fn placeholder_is_a_diagonal_checkerboard() {
    let img = placeholder_image();
    assert_eq!(img.dimensions(), (2, 2));
    assert_eq!(img.get_pixel(0, 0), img.get_pixel(1, 1));
    assert_eq!(img.get_pixel(1, 0), img.get_pixel(0, 1));
    assert_ne!(img.get_pixel(0, 0), img.get_pixel(1, 0));
}

#[test]
fn bad_raw_buffer_and_zero_size_use_placeholder() {
    let mut b = AtlasBuilder::new(BuilderConfig::default());
    b.add_raw("short".to_string(), 4, 4, vec![0u8; 10]);
    b.add("empty".to_string(), Ok(RgbaImage::new(0, 5)));
    b.add_raw("good".to_string(), 3, 1, vec![255u8; 12]);
    let atlas = b.build().expect("build");

    assert!(atlas.is_placeholder("short"));
    assert!(atlas.is_placeholder("empty"));
    assert!(!atlas.is_placeholder("good"));
    let good = atlas.region("good").expect("good");
    assert_eq!((good.w, good.h), (3, 1));
    assert_eq!(*atlas.surface().get_pixel(good.x, good.y), Rgba([255, 255, 255, 255]));
}

#[test]
fn empty_build_is_an_error() {
    let b: AtlasBuilder<String> = AtlasBuilder::new(BuilderConfig::default());
    assert!(matches!(b.build(), Err(AtlasError::Empty)));
}

#[test]
fn default_sort_is_height_then_width() {
    // Input order is deliberately smallest-first
    let mut b = AtlasBuilder::new(BuilderConfig::default());
    b.add("small".to_string(), Ok(solid(10, 10, [0; 4])));
    b.add("wide".to_string(), Ok(solid(40, 20, [0; 4])));
    b.add("tall".to_string(), Ok(solid(20, 40, [0; 4])));
    let atlas = b.build().expect("build");
    // the tallest block seeds the root at the origin
    assert_eq!(atlas.region("tall").expect("tall"), Rect::new(0, 0, 20, 40));
    assert!(disjoint(&atlas));
}

#[test]
fn custom_comparator_overrides_sort_order() {
    let mut b = AtlasBuilder::new(BuilderConfig::default())
        .with_comparator(|a: &Block, b: &Block| a.area().cmp(&b.area()));
    b.add("big".to_string(), Ok(solid(30, 30, [0; 4])));
    b.add("tiny".to_string(), Ok(solid(5, 5, [0; 4])));
    let atlas = b.build().expect("build");
    // ascending area: the tiny block seeds the root
    assert_eq!(atlas.region("tiny").expect("tiny"), Rect::new(0, 0, 5, 5));
    assert!(disjoint(&atlas));
}

#[test]
fn unsorted_order_keeps_input_sequence() {
    let cfg = BuilderConfig::builder().sort_order(SortOrder::None).build();
    let mut b = AtlasBuilder::new(cfg);
    b.add("first".to_string(), Ok(solid(5, 5, [0; 4])));
    b.add("second".to_string(), Ok(solid(50, 50, [0; 4])));
    let atlas = b.build().expect("build");
    assert_eq!(atlas.region("first").expect("first"), Rect::new(0, 0, 5, 5));
    // second outgrows the root both ways and still lands beside first
    assert_eq!(atlas.region("second").expect("second"), Rect::new(5, 0, 50, 50));
    assert_eq!(atlas.dimensions(), (55, 50));
    assert!(disjoint(&atlas));
}

#[test]
fn unsorted_layout_handles_growing_sizes() {
    let cfg = BuilderConfig::builder().sort_order(SortOrder::None).build();
    let items = vec![("a", 2, 2), ("b", 3, 3), ("c", 9, 4), ("d", 1, 20)];
    let atlas = pack_layout(items, cfg).expect("layout");
    assert_eq!(atlas.region("a").expect("a"), Rect::new(0, 0, 2, 2));
    assert_eq!(atlas.region("b").expect("b"), Rect::new(2, 0, 3, 3));
    assert!(disjoint(&atlas));
    let bounds = Rect::new(0, 0, atlas.width(), atlas.height());
    assert!(atlas.iter().all(|(_, p)| bounds.contains(&p.rect)));
}

// Repeated keys have no single obvious meaning; each policy is pinned down here.
#[test]
fn duplicate_keys_keep_last_by_default() {
    let mut b = AtlasBuilder::new(BuilderConfig::default());
    b.add("dup".to_string(), Ok(solid(8, 8, [1, 1, 1, 255])));
    b.add("other".to_string(), Ok(solid(4, 4, [2, 2, 2, 255])));
    b.add("dup".to_string(), Ok(solid(6, 3, [3, 3, 3, 255])));
    let atlas = b.build().expect("build");

    assert_eq!(atlas.len(), 2);
    let r = atlas.region("dup").expect("dup");
    assert_eq!((r.w, r.h), (6, 3));
    assert_eq!(*atlas.surface().get_pixel(r.x, r.y), Rgba([3, 3, 3, 255]));
    // the discarded 8x8 took no space
    assert_eq!(atlas.stats().used_area, 6 * 3 + 4 * 4);
}

#[test]
fn duplicate_keys_keep_first() {
    let cfg = BuilderConfig::builder()
        .duplicate_keys(DuplicateKeyPolicy::KeepFirst)
        .build();
    let mut b = AtlasBuilder::new(cfg);
    b.add("dup".to_string(), Ok(solid(8, 8, [1, 1, 1, 255])));
    b.add("dup".to_string(), Ok(solid(6, 3, [3, 3, 3, 255])));
    let atlas = b.build().expect("build");
    assert_eq!(atlas.len(), 1);
    assert_eq!(atlas.region("dup").expect("dup"), Rect::new(0, 0, 8, 8));
}

#[test]
fn duplicate_keys_rejected() {
    let cfg = BuilderConfig::builder()
        .duplicate_keys(DuplicateKeyPolicy::Reject)
        .build();
    let mut b = AtlasBuilder::new(cfg);
    b.add("dup".to_string(), Ok(solid(8, 8, [0; 4])));
    b.add("dup".to_string(), Ok(solid(6, 3, [0; 4])));
    match b.build() {
        Err(AtlasError::DuplicateKey(k)) => assert_eq!(k, "dup"),
        other => panic!("expected DuplicateKey, got {:?}", other.map(|a| a.dimensions())),
    }
}

#[test]
fn max_dimensions_are_enforced() {
    let cfg = BuilderConfig::builder().with_max_dimensions(64, 64).build();
    let mut b = AtlasBuilder::new(cfg);
    b.add("a".to_string(), Ok(solid(64, 64, [0; 4])));
    b.add("b".to_string(), Ok(solid(32, 32, [0; 4])));
    match b.build() {
        Err(AtlasError::TooLarge { width, height, .. }) => {
            assert_eq!((width, height), (96, 64));
        }
        other => panic!("expected TooLarge, got {:?}", other.map(|a| a.dimensions())),
    }
}

#[test]
fn zero_max_dimension_is_invalid() {
    let cfg = BuilderConfig {
        max_width: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        cfg.validate(),
        Err(AtlasError::InvalidDimensions { width: 0, .. })
    ));
}

#[test]
fn decode_all_routes_failures_to_placeholders() {
    let sources = vec![("a", 3u32), ("b", 0u32), ("c", 5u32)];
    let mut decoder = |size: u32| -> DecodeResult {
        if size == 0 {
            Err(DecodeError::Other("no data".into()))
        } else {
            Ok(solid(size, size, [7, 7, 7, 255]))
        }
    };
    let mut b = AtlasBuilder::new(BuilderConfig::default());
    b.decode_all(sources, &mut decoder);
    let atlas = b.build().expect("build");
    assert_eq!(atlas.len(), 3);
    assert!(atlas.is_placeholder("b"));
    assert_eq!(atlas.region("c").expect("c"), Rect::new(0, 0, 5, 5));
}

#[test]
fn build_atlas_accepts_dynamic_images() {
    let inputs = vec![
        InputSprite::from_image("x".to_string(), DynamicImage::ImageRgba8(solid(12, 7, [0; 4]))),
        InputSprite::from_image("y".to_string(), DynamicImage::new_rgb8(7, 12)),
    ];
    let atlas = build_atlas(inputs, BuilderConfig::default()).expect("build");
    assert_eq!(atlas.len(), 2);
    assert!(disjoint(&atlas));
    // rgb input is widened to opaque rgba
    let r = atlas.region("y").expect("y");
    assert_eq!(atlas.surface().get_pixel(r.x, r.y)[3], 255);
}

#[test]
fn layout_matches_full_build() {
    let sizes = vec![("a", 40, 20), ("b", 16, 32), ("c", 10, 10), ("d", 8, 48), ("e", 33, 9)];
    let layout = pack_layout(
        sizes.iter().map(|(k, w, h)| (k.to_string(), *w, *h)).collect(),
        BuilderConfig::default(),
    )
    .expect("layout");

    let mut b = AtlasBuilder::new(BuilderConfig::default());
    for (k, w, h) in &sizes {
        b.add(k.to_string(), Ok(RgbaImage::new(*w, *h)));
    }
    let full = b.build().expect("build");

    assert_eq!(layout.dimensions(), full.dimensions());
    let lm: HashMap<&String, Rect> = layout.iter().map(|(k, p)| (k, p.rect)).collect();
    for (k, p) in full.iter() {
        assert_eq!(lm.get(k), Some(&p.rect), "rect mismatch for key={}", k);
    }
}

#[test]
fn layout_rejects_zero_sizes() {
    let res = pack_layout(vec![("a", 4, 0)], BuilderConfig::default());
    assert!(matches!(
        res,
        Err(AtlasError::InvalidDimensions { width: 4, height: 0 })
    ));
}

/// Accepts the first blit, then refuses every later one.
struct OneShotSurface {
    width: u32,
    height: u32,
    blits: usize,
}

impl Surface for OneShotSurface {
    fn allocate(width: u32, height: u32, _background: Rgba<u8>) -> growpack_core::Result<Self> {
        Ok(Self {
            width,
            height,
            blits: 0,
        })
    }

    fn blit(&mut self, x: u32, y: u32, pixels: &RgbaImage) -> growpack_core::Result<()> {
        self.blits += 1;
        if self.blits > 1 {
            return Err(AtlasError::OutOfBounds {
                x,
                y,
                width: pixels.width(),
                height: pixels.height(),
                surface_width: self.width,
                surface_height: self.height,
            });
        }
        Ok(())
    }
}

#[test]
fn failing_blit_aborts_build() {
    let mut b = AtlasBuilder::new(BuilderConfig::default());
    b.add("big".to_string(), Ok(solid(64, 64, [1, 1, 1, 255])));
    b.add("small".to_string(), Ok(solid(32, 32, [2, 2, 2, 255])));
    b.add("tiny".to_string(), Ok(solid(16, 16, [3, 3, 3, 255])));
    match b.build_into::<OneShotSurface>() {
        Err(AtlasError::OutOfBounds {
            x,
            y,
            width,
            height,
            surface_width,
            surface_height,
        }) => {
            // big went through; small (second in height order) is the one refused
            assert_eq!((x, y, width, height), (64, 0, 32, 32));
            assert_eq!((surface_width, surface_height), (96, 64));
        }
        Err(e) => panic!("expected OutOfBounds, got {e}"),
        Ok(_) => panic!("build should fail"),
    }
}

#[test]
fn rgba_blit_outside_surface_is_rejected() {
    let mut canvas = RgbaImage::allocate(8, 8, Rgba([9, 9, 9, 255])).expect("allocate");
    let sprite = solid(4, 4, [200, 0, 0, 255]);

    assert!(matches!(
        canvas.blit(6, 0, &sprite),
        Err(AtlasError::OutOfBounds { x: 6, y: 0, width: 4, height: 4, surface_width: 8, surface_height: 8 })
    ));
    assert!(matches!(
        canvas.blit(0, u32::MAX, &sprite),
        Err(AtlasError::OutOfBounds { .. })
    ));
    // a refused blit leaves the canvas untouched
    assert!(canvas.pixels().all(|p| *p == Rgba([9, 9, 9, 255])));

    canvas.blit(4, 4, &sprite).expect("fits exactly");
    assert_eq!(*canvas.get_pixel(7, 7), Rgba([200, 0, 0, 255]));
    assert_eq!(*canvas.get_pixel(3, 3), Rgba([9, 9, 9, 255]));
}
