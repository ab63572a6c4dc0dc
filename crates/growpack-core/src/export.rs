use crate::atlas::Atlas;
use crate::config::SortOrder;
use crate::error::{AtlasError, Result};
use crate::model::{Meta, UvRect};
use serde_json::{Value, json};
use std::hash::Hash;

/// Metadata block for an exported atlas of `width x height`.
pub fn meta_for(width: u32, height: u32, sort_order: SortOrder) -> Meta {
    Meta {
        schema_version: "1".into(),
        app: "growpack".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        format: "RGBA8888".into(),
        size: (width, height),
        sort_order: sort_order.as_str().into(),
    }
}

/// Flatten placements keyed by name.
/// Shape: `{ frames: { name: { frame, uv, placeholder } }, meta }`.
pub fn to_json_hash<K, S>(atlas: &Atlas<K, S>, sort_order: SortOrder) -> Value
where
    K: ToString + Eq + Hash,
{
    let (width, height) = atlas.dimensions();
    let mut entries: Vec<(String, Value)> = atlas
        .iter()
        .map(|(key, p)| {
            let r = p.rect;
            let uv = UvRect::from_rect(&r, width, height);
            let frame = json!({"x": r.x, "y": r.y, "w": r.w, "h": r.h});
            let uv = json!({"u0": uv.u0, "v0": uv.v0, "u1": uv.u1, "v1": uv.v1});
            (
                key.to_string(),
                json!({
                    "frame": frame,
                    "uv": uv,
                    "placeholder": p.placeholder,
                }),
            )
        })
        .collect();
    // HashMap iteration order is unspecified; sort so output is reproducible.
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let frames: serde_json::Map<String, Value> = entries.into_iter().collect();
    let meta = meta_for(width, height, sort_order);
    json!({ "frames": frames, "meta": meta })
}

/// Pretty-printed [`to_json_hash`].
pub fn to_json_string<K, S>(atlas: &Atlas<K, S>, sort_order: SortOrder) -> Result<String>
where
    K: ToString + Eq + Hash,
{
    serde_json::to_string_pretty(&to_json_hash(atlas, sort_order))
        .map_err(|e| AtlasError::Encode(e.to_string()))
}
