//! Structural defaults for ads and creatives.
//!
//! A default is only applied when its key is absent; an existing value, `null`
//! included, always wins.

use crate::models::{AdType, CreativeType};
use serde_json::{json, Value};
use std::sync::LazyLock;

static AD_DEFAULTS: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "system": { "version": null },
        "errors": []
    })
});

static CREATIVE_DEFAULTS: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "id": null,
        "sequence": null,
        "adID": null
    })
});

static INLINE_DEFAULTS: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "description": null,
        "survey": null
    })
});

static LINEAR_DEFAULTS: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "trackingEvents": [],
        "parameters": null,
        "videoClicks": null
    })
});

static MEDIA_FILE_DEFAULTS: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "id": null,
        "bitrate": null,
        "scalable": null,
        "maintainAspectRatio": null,
        "apiFramework": null
    })
});

static COMPANION_DEFAULTS: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "expandedWidth": null,
        "expandedHeight": null,
        "apiFramework": null,
        "trackingEvents": [],
        "clickThrough": null,
        "altText": null,
        "parameters": null
    })
});

static NON_LINEAR_DEFAULTS: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "trackingEvents": []
    })
});

static NON_LINEAR_AD_DEFAULTS: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "id": null,
        "expandedWidth": null,
        "expandedHeight": null,
        "scalable": null,
        "maintainAspectRatio": null,
        "minSuggestedDuration": null,
        "apiFramework": null,
        "clickThrough": null,
        "parameters": null
    })
});

/// Fill `target` with whatever `config` has that `target` lacks
///
/// Objects are merged key by key, recursing where both sides hold containers.
/// Arrays are unioned: config items are appended after the target's own items,
/// skipping scalars the target already contains.
pub fn defaults(config: &Value, target: &mut Value) {
    match (config, target) {
        (Value::Array(config), Value::Array(target)) => {
            for item in config {
                let is_container = item.is_object() || item.is_array();
                if is_container || !target.contains(item) {
                    target.push(item.clone());
                }
            }
        }
        (Value::Object(config), Value::Object(target)) => {
            for (key, value) in config {
                match target.get_mut(key) {
                    Some(existing) => defaults(value, existing),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        _ => {}
    }
}

/// The ad type named by a graph node's `type` field
pub fn ad_type(ad: &Value) -> Option<AdType> {
    ad.get("type").and_then(Value::as_str).and_then(AdType::parse)
}

/// The creative type named by a graph node's `type` field
pub fn creative_type(creative: &Value) -> Option<CreativeType> {
    creative
        .get("type")
        .and_then(Value::as_str)
        .and_then(CreativeType::parse)
}

/// Give an ad and all of its creatives their default fields
pub fn normalize_ad(ad: &mut Value) {
    defaults(&AD_DEFAULTS, ad);

    for creative in items_mut(ad, "creatives") {
        normalize_creative(creative);
    }

    match ad_type(ad) {
        Some(AdType::Inline) => defaults(&INLINE_DEFAULTS, ad),
        Some(AdType::Wrapper) | None => {}
    }
}

fn normalize_creative(creative: &mut Value) {
    defaults(&CREATIVE_DEFAULTS, creative);

    match creative_type(creative) {
        Some(CreativeType::Linear) => {
            defaults(&LINEAR_DEFAULTS, creative);
            for media_file in items_mut(creative, "mediaFiles") {
                defaults(&MEDIA_FILE_DEFAULTS, media_file);
            }
        }
        Some(CreativeType::Companions) => {
            for companion in items_mut(creative, "companions") {
                defaults(&COMPANION_DEFAULTS, companion);
            }
        }
        Some(CreativeType::NonLinear) => {
            defaults(&NON_LINEAR_DEFAULTS, creative);
            for ad in items_mut(creative, "ads") {
                defaults(&NON_LINEAR_AD_DEFAULTS, ad);
            }
        }
        None => {}
    }
}

fn items_mut<'a>(value: &'a mut Value, key: &str) -> impl Iterator<Item = &'a mut Value> {
    value
        .get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_never_overwrite() {
        let mut target = json!({ "a": null, "b": 0, "nested": { "x": 1 } });
        defaults(
            &json!({ "a": 1, "b": 2, "c": 3, "nested": { "x": 2, "y": 3 } }),
            &mut target,
        );

        assert_eq!(
            target,
            json!({ "a": null, "b": 0, "c": 3, "nested": { "x": 1, "y": 3 } })
        );
    }

    #[test]
    fn defaults_union_arrays_after_existing_items() {
        let mut target = json!({ "errors": ["i", "shared"], "impressions": [{ "uri": "ii" }] });
        defaults(
            &json!({ "errors": ["w", "shared"], "impressions": [{ "uri": "wi" }] }),
            &mut target,
        );

        assert_eq!(target["errors"], json!(["i", "shared", "w"]));
        assert_eq!(target["impressions"], json!([{ "uri": "ii" }, { "uri": "wi" }]));
    }

    #[test]
    fn normalizes_minimal_inline_ad() {
        let mut ad = json!({
            "type": "inline",
            "system": { "name": "ad-system" },
            "title": "My Ad",
            "impressions": [{ "uri": "http://example.com/impression" }],
            "creatives": [
                {
                    "type": "linear",
                    "duration": 60,
                    "mediaFiles": [{ "uri": "http://example.com/video.mp4", "width": 1920 }]
                },
                {
                    "type": "companions",
                    "companions": [{ "width": 300, "resources": [{ "type": "iframe", "data": "x" }] }]
                },
                {
                    "type": "nonLinear",
                    "ads": [{ "width": 1920, "resources": [{ "type": "html", "data": "<p>hi</p>" }] }]
                }
            ]
        });

        normalize_ad(&mut ad);

        assert_eq!(ad["system"], json!({ "name": "ad-system", "version": null }));
        assert_eq!(ad["errors"], json!([]));
        assert_eq!(ad["description"], Value::Null);
        assert!(ad.as_object().unwrap().contains_key("survey"));

        let linear = &ad["creatives"][0];
        assert_eq!(linear["adID"], Value::Null);
        assert_eq!(linear["trackingEvents"], json!([]));
        assert!(linear.as_object().unwrap().contains_key("videoClicks"));
        assert_eq!(
            linear["mediaFiles"][0],
            json!({
                "uri": "http://example.com/video.mp4",
                "width": 1920,
                "id": null,
                "bitrate": null,
                "scalable": null,
                "maintainAspectRatio": null,
                "apiFramework": null
            })
        );

        let companion = &ad["creatives"][1]["companions"][0];
        assert_eq!(companion["trackingEvents"], json!([]));
        assert!(companion.as_object().unwrap().contains_key("altText"));

        let non_linear = &ad["creatives"][2];
        assert_eq!(non_linear["trackingEvents"], json!([]));
        assert!(non_linear["ads"][0].as_object().unwrap().contains_key("minSuggestedDuration"));
    }

    #[test]
    fn wrapper_ads_get_no_inline_fields() {
        let mut ad = json!({
            "type": "wrapper",
            "system": { "name": "ad-system" },
            "vastAdTagURI": "http://example.com/tag.xml",
            "creatives": []
        });

        normalize_ad(&mut ad);

        assert_eq!(
            ad,
            json!({
                "type": "wrapper",
                "system": { "name": "ad-system", "version": null },
                "errors": [],
                "vastAdTagURI": "http://example.com/tag.xml",
                "creatives": []
            })
        );
    }
}
