use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Represents a VAST document (Video Ad Serving Template)
///
/// Every optional field is skipped when `None`, so serializing a freshly
/// built model yields the trimmed object graph a `Document` is created from.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Vast {
    /// The VAST version (e.g., "2.0", "3.0")
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,

    /// The Ad elements within the VAST document
    #[serde(default)]
    pub ads: Vec<Ad>,
}

/// Represents an Ad within a VAST document
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Ad {
    /// The ad ID
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// The ad system name and version
    #[serde(default)]
    pub system: AdSystem,

    /// Error tracking URLs
    #[serde(default, deserialize_with = "lenient::strings")]
    pub errors: Vec<String>,

    /// Impression tracking URLs
    #[serde(default)]
    pub impressions: Vec<Impression>,

    /// Creative elements
    #[serde(default)]
    pub creatives: Vec<Creative>,

    /// The in-line or wrapper specific fields, tagged by `type`
    #[serde(flatten)]
    pub kind: AdKind,
}

/// The concrete kind of an ad
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AdKind {
    Inline(Inline),
    Wrapper(Wrapper),
}

/// Fields only an InLine ad carries
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Inline {
    /// The ad title
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,

    /// The description of the ad
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    /// The survey URL
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub survey: Option<String>,
}

/// Fields only a Wrapper ad carries
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Wrapper {
    /// The URL of the next VAST document
    #[serde(
        rename = "vastAdTagURI",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub vast_ad_tag_uri: Option<String>,
}

/// Represents the ad system information
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct AdSystem {
    /// The ad system name
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    /// The ad system version
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
}

/// Represents an impression tracking URL
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Impression {
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub uri: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
}

/// Represents a creative element
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Creative {
    /// The creative ID
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// The creative sequence number
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub sequence: Option<Number>,

    /// The creative ad ID (`AdID` attribute)
    #[serde(
        rename = "adID",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub ad_id: Option<String>,

    /// Linear, companion or non-linear details, tagged by `type`
    #[serde(flatten)]
    pub kind: CreativeKind,
}

/// The concrete kind of a creative
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CreativeKind {
    Linear(Linear),
    Companions(Companions),
    NonLinear(NonLinear),
}

/// Represents a linear ad
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Linear {
    /// The duration of the ad in seconds
    #[serde(
        default,
        deserialize_with = "lenient::seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<u64>,

    /// Tracking events
    #[serde(default)]
    pub tracking_events: Vec<TrackingEvent>,

    /// The `AdParameters` payload
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameters: Option<String>,

    /// Video clicks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_clicks: Option<VideoClicks>,

    /// Media files
    #[serde(default)]
    pub media_files: Vec<MediaFile>,
}

/// Represents video click-through and click-tracking URLs
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoClicks {
    /// The click-through URL
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub click_through: Option<String>,

    /// Click tracking URLs
    #[serde(default, deserialize_with = "lenient::strings")]
    pub click_trackings: Vec<String>,

    /// Custom click URLs
    #[serde(default)]
    pub custom_clicks: Vec<CustomClick>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct CustomClick {
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub uri: Option<String>,
}

/// Represents a media file
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// The media file delivery type (progressive or streaming)
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivery: Option<String>,

    /// The media file MIME type
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub mime_type: Option<String>,

    /// The media file URL
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub uri: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub bitrate: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub width: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub height: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::boolean",
        skip_serializing_if = "Option::is_none"
    )]
    pub scalable: Option<bool>,

    #[serde(
        default,
        deserialize_with = "lenient::boolean",
        skip_serializing_if = "Option::is_none"
    )]
    pub maintain_aspect_ratio: Option<bool>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_framework: Option<String>,
}

/// Represents a tracking event
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct TrackingEvent {
    /// The event type (e.g., "start", "firstQuartile", "midpoint", "complete")
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub event: Option<String>,

    /// The tracking URL
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub uri: Option<String>,
}

/// Represents companion ads
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Companions {
    #[serde(default)]
    pub companions: Vec<Companion>,
}

/// Represents a companion ad
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Companion {
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub width: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub height: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub expanded_width: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub expanded_height: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_framework: Option<String>,

    /// Static, iframe or HTML resources
    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default)]
    pub tracking_events: Vec<TrackingEvent>,

    /// The `CompanionClickThrough` URL
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub click_through: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub alt_text: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameters: Option<String>,
}

/// Represents non-linear ads
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NonLinear {
    /// The non-linear ad slots
    #[serde(default)]
    pub ads: Vec<NonLinearAd>,

    #[serde(default)]
    pub tracking_events: Vec<TrackingEvent>,
}

/// Represents a single non-linear ad slot
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NonLinearAd {
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub width: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub height: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub expanded_width: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub expanded_height: Option<Number>,

    #[serde(
        default,
        deserialize_with = "lenient::boolean",
        skip_serializing_if = "Option::is_none"
    )]
    pub scalable: Option<bool>,

    #[serde(
        default,
        deserialize_with = "lenient::boolean",
        skip_serializing_if = "Option::is_none"
    )]
    pub maintain_aspect_ratio: Option<bool>,

    /// The minimum suggested duration in seconds
    #[serde(
        default,
        deserialize_with = "lenient::seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_suggested_duration: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_framework: Option<String>,

    #[serde(default)]
    pub resources: Vec<Resource>,

    /// The `NonLinearClickThrough` URL
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub click_through: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameters: Option<String>,
}

/// A companion or non-linear resource
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: ResourceType,

    /// The MIME type of a static resource
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub creative_type: Option<String>,

    /// The resource URL or HTML content
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<String>,
}

/// The resource element a `Resource` was read from
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Static,
    Iframe,
    Html,
}

impl ResourceType {
    /// Map a `*Resource` element name to its resource type
    pub fn from_tag(tag: &str) -> Option<Self> {
        let prefix = tag.strip_suffix("Resource")?;
        match prefix.to_lowercase().as_str() {
            "static" => Some(ResourceType::Static),
            "iframe" => Some(ResourceType::Iframe),
            "html" => Some(ResourceType::Html),
            _ => None,
        }
    }

    /// The element name this resource type is written as
    pub fn tag(self) -> &'static str {
        match self {
            ResourceType::Static => "StaticResource",
            ResourceType::Iframe => "IFrameResource",
            ResourceType::Html => "HTMLResource",
        }
    }
}

/// The `type` discriminator of an ad in the generic document graph
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum AdType {
    Inline,
    Wrapper,
}

impl AdType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "inline" => Some(AdType::Inline),
            "wrapper" => Some(AdType::Wrapper),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdType::Inline => "inline",
            AdType::Wrapper => "wrapper",
        }
    }
}

/// The `type` discriminator of a creative in the generic document graph
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CreativeType {
    Linear,
    Companions,
    NonLinear,
}

impl CreativeType {
    /// All creative types, in the order leftover wrapper creatives are carried forward
    pub const ALL: [CreativeType; 3] = [
        CreativeType::Linear,
        CreativeType::Companions,
        CreativeType::NonLinear,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "linear" => Some(CreativeType::Linear),
            "companions" => Some(CreativeType::Companions),
            "nonLinear" => Some(CreativeType::NonLinear),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CreativeType::Linear => "linear",
            CreativeType::Companions => "companions",
            CreativeType::NonLinear => "nonLinear",
        }
    }
}

impl AdKind {
    pub fn ad_type(&self) -> AdType {
        match self {
            AdKind::Inline(_) => AdType::Inline,
            AdKind::Wrapper(_) => AdType::Wrapper,
        }
    }
}

impl CreativeKind {
    pub fn creative_type(&self) -> CreativeType {
        match self {
            CreativeKind::Linear(_) => CreativeType::Linear,
            CreativeKind::Companions(_) => CreativeType::Companions,
            CreativeKind::NonLinear(_) => CreativeType::NonLinear,
        }
    }
}

/// Field deserializers that accept the scalar shapes a hand-built or edited
/// graph may hold, coercing them the way the XML builder would.
mod lenient {
    use crate::convert::{numberify, string_to_boolean, timestamp_to_seconds, whole_seconds};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::{Number, Value};

    fn text<E: Error>(value: Value) -> Result<Option<String>, E> {
        match value {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(text)),
            Value::Number(number) => Ok(Some(number.to_string())),
            Value::Bool(flag) => Ok(Some(flag.to_string())),
            other => Err(E::custom(format!("expected a string, got {}", other))),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        text(Value::deserialize(deserializer)?)
    }

    pub fn strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| text(item).transpose())
                .collect(),
            other => Err(D::Error::custom(format!("expected a list, got {}", other))),
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Number>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => Ok(Some(number)),
            Value::String(text) => Ok(numberify(Some(text.as_str()))),
            Value::Null | Value::Bool(_) => Ok(None),
            other => Err(D::Error::custom(format!("expected a number, got {}", other))),
        }
    }

    pub fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => Ok(whole_seconds(&number)),
            Value::String(text) => Ok(numberify(Some(text.as_str()))
                .as_ref()
                .and_then(whole_seconds)
                .or_else(|| timestamp_to_seconds(&text))),
            Value::Null | Value::Bool(_) => Ok(None),
            other => Err(D::Error::custom(format!("expected seconds, got {}", other))),
        }
    }

    pub fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(flag) => Ok(Some(flag)),
            Value::String(text) => Ok(string_to_boolean(Some(text.as_str()))),
            Value::Null | Value::Number(_) => Ok(None),
            other => Err(D::Error::custom(format!("expected a boolean, got {}", other))),
        }
    }
}
