use crate::compiler;
use crate::error::{Result, VastError};
use crate::models::{AdType, CreativeType, Vast};
use crate::normalize::{ad_type, creative_type, normalize_ad};
use crate::parser;
use crate::path::PathAccess;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;

/// A VAST document held as a normalized object graph
///
/// The graph is owned by the document; constructing one from a value takes
/// that value, and [`Document::to_pojo`] hands back an independent copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

/// Outcome of [`Document::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    /// Every rule violation, in the order the rules were checked; `None` when valid
    pub reasons: Option<Vec<String>>,
}

impl Document {
    /// Build a document from a plain object graph, filling structural defaults
    pub fn new(mut pojo: Value) -> Result<Self> {
        if !pojo.is_object() {
            return Err(VastError::InvalidArgument(
                "a VAST document must be an object".to_string(),
            ));
        }

        if let Some(ads) = pojo.get_mut("ads").and_then(Value::as_array_mut) {
            for ad in ads {
                normalize_ad(ad);
            }
        }

        Ok(Document { root: pojo })
    }

    /// Parse VAST XML into a document
    pub fn from_xml(xml: &str) -> Result<Self> {
        Self::from_vast(&parser::parse_vast(xml)?)
    }

    /// Build a document from the typed model
    pub fn from_vast(vast: &Vast) -> Result<Self> {
        Self::new(serde_json::to_value(vast)?)
    }

    pub fn version(&self) -> Option<&str> {
        self.root.get("version").and_then(Value::as_str)
    }

    /// All ads, in document order
    pub fn ads(&self) -> &[Value] {
        self.root
            .get("ads")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The wrapper ads, as currently held by the document
    pub fn wrappers(&self) -> Vec<&Value> {
        self.ads_of_type(AdType::Wrapper)
    }

    /// The inline ads, as currently held by the document
    pub fn inlines(&self) -> Vec<&Value> {
        self.ads_of_type(AdType::Inline)
    }

    fn ads_of_type(&self, kind: AdType) -> Vec<&Value> {
        self.filter("ads", |ad, _, _| ad_type(ad) == Some(kind))
    }

    /// A plain copy of the document's graph
    pub fn to_pojo(&self) -> Value {
        self.root.clone()
    }

    pub fn into_pojo(self) -> Value {
        self.root
    }

    /// A new, independent document with the same content
    pub fn copy(&self) -> Result<Self> {
        Self::new(self.to_pojo())
    }

    /// Read the value at a path such as `ads[0].creatives[1].type`
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.get_path(path)
    }

    /// Like [`Document::get`], but `ads.length` style paths yield the length
    pub fn lookup(&self, path: &str) -> Option<Cow<'_, Value>> {
        self.lookup_path(path)
    }

    /// Write a value at a path, creating missing objects and arrays
    pub fn set(&mut self, path: &str, value: Value) -> Result<&Value> {
        self.set_path(path, value)
    }

    pub fn map<T, F>(&self, path: &str, mapper: F) -> Vec<T>
    where
        F: FnMut(&Value, usize, &[Value]) -> T,
    {
        self.map_path(path, mapper)
    }

    pub fn filter<F>(&self, path: &str, predicate: F) -> Vec<&Value>
    where
        F: FnMut(&Value, usize, &[Value]) -> bool,
    {
        self.filter_path(path, predicate)
    }

    pub fn find<F>(&self, path: &str, predicate: F) -> Option<&Value>
    where
        F: FnMut(&Value, usize, &[Value]) -> bool,
    {
        self.find_path(path, predicate)
    }

    /// Check the document against the structural rules VAST output must satisfy
    pub fn validate(&self) -> Validation {
        let mut validator = Validator {
            document: self,
            reasons: Vec::new(),
        };
        validator.document();

        let valid = validator.reasons.is_empty();
        Validation {
            valid,
            reasons: (!valid).then_some(validator.reasons),
        }
    }

    /// Convert the graph back into the typed model
    pub fn to_vast(&self) -> Result<Vast> {
        Ok(serde_json::from_value(self.to_pojo())?)
    }

    /// Compile the document into VAST XML, failing if it does not validate
    pub fn to_xml(&self) -> Result<String> {
        if let Some(reasons) = self.validate().reasons {
            return Err(VastError::Validation(reasons));
        }

        Ok(compiler::compile(&self.to_vast()?))
    }
}

impl PathAccess for Document {
    fn root(&self) -> &Value {
        &self.root
    }

    fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pojo = Value::deserialize(deserializer)?;
        Document::new(pojo).map_err(serde::de::Error::custom)
    }
}

/// Truthiness of a graph value: null, false, zero and empty strings fail
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

struct Validator<'a> {
    document: &'a Document,
    reasons: Vec<String>,
}

impl Validator<'_> {
    fn exists(&mut self, path: String) {
        if !is_truthy(self.document.get(&path)) {
            self.reasons.push(format!("{} is required", path));
        }
    }

    fn at_least_one(&mut self, path: String) {
        let populated = self
            .document
            .get(&path)
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty());
        if !populated {
            self.reasons
                .push(format!("{} must contain at least one value", path));
        }
    }

    fn count(&self, path: &str) -> usize {
        self.document
            .get(path)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    fn document(&mut self) {
        self.at_least_one("ads".to_string());

        for (index, ad) in self.document.ads().iter().enumerate() {
            let prefix = format!("ads[{}]", index);
            self.exists(format!("{}.type", prefix));
            self.exists(format!("{}.system.name", prefix));
            self.at_least_one(format!("{}.impressions", prefix));

            match ad_type(ad) {
                Some(AdType::Inline) => self.inline(&prefix),
                Some(AdType::Wrapper) => self.exists(format!("{}.vastAdTagURI", prefix)),
                None => {}
            }
        }
    }

    fn inline(&mut self, ad: &str) {
        self.exists(format!("{}.title", ad));
        self.at_least_one(format!("{}.creatives", ad));

        let creatives = format!("{}.creatives", ad);
        for index in 0..self.count(&creatives) {
            let prefix = format!("{}[{}]", creatives, index);
            self.exists(format!("{}.type", prefix));

            let kind = self.document.get(&prefix).and_then(creative_type);
            match kind {
                Some(CreativeType::Linear) => {
                    self.exists(format!("{}.duration", prefix));
                    self.at_least_one(format!("{}.mediaFiles", prefix));
                }
                Some(CreativeType::Companions) => self.each_has_resources(&prefix, "companions"),
                Some(CreativeType::NonLinear) => self.each_has_resources(&prefix, "ads"),
                None => {}
            }
        }
    }

    fn each_has_resources(&mut self, creative: &str, list: &str) {
        let items = format!("{}.{}", creative, list);
        for index in 0..self.count(&items) {
            self.at_least_one(format!("{}[{}].resources", items, index));
        }
    }
}
