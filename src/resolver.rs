//! Wrapper-chain resolution.
//!
//! Each pass fetches the target of every wrapper ad in the document at once,
//! decorates the ads found there with the wrapper's tracking, and puts them in
//! the wrapper's place. Passes repeat until no wrappers are left or the redirect
//! budget runs out.

use crate::document::Document;
use crate::error::{Result, VastError};
use crate::fetch::Fetch;
use crate::models::{AdType, CreativeType};
use crate::normalize::{ad_type, creative_type, defaults};
use crate::parser;
use futures::future::try_join_all;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// How many resolution passes may still be made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectBudget {
    #[default]
    Unlimited,
    Limited(u32),
}

impl RedirectBudget {
    pub fn is_exhausted(self) -> bool {
        self == RedirectBudget::Limited(0)
    }

    /// The budget left after one pass
    fn spend(self) -> Self {
        match self {
            RedirectBudget::Unlimited => RedirectBudget::Unlimited,
            RedirectBudget::Limited(remaining) => {
                RedirectBudget::Limited(remaining.saturating_sub(1))
            }
        }
    }
}

impl From<u32> for RedirectBudget {
    fn from(max_redirects: u32) -> Self {
        RedirectBudget::Limited(max_redirects)
    }
}

impl From<Option<u32>> for RedirectBudget {
    fn from(max_redirects: Option<u32>) -> Self {
        max_redirects.map_or(RedirectBudget::Unlimited, RedirectBudget::Limited)
    }
}

/// Resolve every wrapper ad of `document` into the ads it points to
///
/// The input document is left untouched. An exhausted budget fails up front,
/// even when there is nothing to resolve; the first failed fetch of a pass
/// fails the whole resolution.
pub async fn resolve<F>(
    document: &Document,
    fetcher: &F,
    budget: impl Into<RedirectBudget>,
) -> Result<Document>
where
    F: Fetch + ?Sized,
{
    let mut budget = budget.into();
    let mut current = document.copy()?;
    let mut passes = 0;

    loop {
        if budget.is_exhausted() {
            log::warn!("Giving up on wrapper resolution after {} pass(es)", passes);
            return Err(VastError::TooManyRedirects);
        }

        current = resolve_pass(&current, fetcher).await?;
        budget = budget.spend();
        passes += 1;

        if current.wrappers().is_empty() {
            log::info!(
                "Resolved wrapper chain in {} pass(es) into {} ad(s)",
                passes,
                current.ads().len()
            );
            return Ok(current);
        }
    }
}

/// Run one pass: fetch all wrapper targets and splice the decorated results in
async fn resolve_pass<F>(document: &Document, fetcher: &F) -> Result<Document>
where
    F: Fetch + ?Sized,
{
    let wrappers = document.wrappers();
    log::debug!("Resolving {} wrapper ad(s)", wrappers.len());

    let responses =
        try_join_all(wrappers.iter().map(|wrapper| fetch_wrapped_ads(wrapper, fetcher))).await?;
    let mut responses = responses.into_iter();

    let mut ads = Vec::new();
    for ad in document.ads() {
        if ad_type(ad) != Some(AdType::Wrapper) {
            ads.push(ad.clone());
            continue;
        }

        for mut response_ad in responses.next().unwrap_or_default() {
            decorate_with_wrapper(ad, &mut response_ad);
            ads.push(response_ad);
        }
    }

    let mut pojo = document.to_pojo();
    if let Some(fields) = pojo.as_object_mut() {
        fields.insert("ads".to_string(), Value::Array(ads));
    }
    Document::new(pojo)
}

/// Fetch and build the ads a wrapper points to
async fn fetch_wrapped_ads<F>(wrapper: &Value, fetcher: &F) -> Result<Vec<Value>>
where
    F: Fetch + ?Sized,
{
    let uri = wrapper
        .get("vastAdTagURI")
        .and_then(Value::as_str)
        .ok_or_else(|| VastError::MissingField("vastAdTagURI".to_string()))?;

    log::debug!("Following wrapper to {}", uri);
    let xml = fetcher.fetch(uri).await.inspect_err(|e| {
        log::warn!("Failed to fetch wrapped VAST from {}: {}", uri, e);
    })?;

    let vast = parser::parse_vast(&xml)?;
    vast.ads
        .iter()
        .map(|ad| serde_json::to_value(ad).map_err(VastError::from))
        .collect()
}

/// Merge a wrapper's tracking into one ad of the document it points to
///
/// The ad's own values come first. Wrapper creatives are paired with the ad's
/// creatives by type in declaration order; unpaired wrapper creatives are
/// dropped unless the ad is itself a wrapper, in which case they are appended
/// to its creatives for the next pass.
pub fn decorate_with_wrapper(wrapper: &Value, ad: &mut Value) {
    for key in ["impressions", "errors"] {
        if let Some(config) = wrapper.get(key) {
            let mut fields = serde_json::Map::new();
            fields.insert(key.to_string(), config.clone());
            defaults(&Value::Object(fields), ad);
        }
    }

    let mut queues: HashMap<CreativeType, VecDeque<Value>> = HashMap::new();
    if let Some(creatives) = wrapper.get("creatives").and_then(Value::as_array) {
        for creative in creatives {
            if let Some(kind) = creative_type(creative) {
                queues.entry(kind).or_default().push_back(creative.clone());
            }
        }
    }

    if let Some(creatives) = ad.get_mut("creatives").and_then(Value::as_array_mut) {
        for creative in creatives.iter_mut() {
            let paired = creative_type(creative)
                .and_then(|kind| queues.get_mut(&kind))
                .and_then(VecDeque::pop_front);
            if let Some(config) = paired {
                defaults(&config, creative);
            }
        }
    }

    if ad_type(ad) != Some(AdType::Wrapper) {
        return;
    }

    let leftovers: Vec<Value> = CreativeType::ALL
        .iter()
        .filter_map(|kind| queues.remove(kind))
        .flatten()
        .collect();
    if leftovers.is_empty() {
        return;
    }

    match ad.get_mut("creatives").and_then(Value::as_array_mut) {
        Some(creatives) => creatives.extend(leftovers),
        None => {
            if let Some(fields) = ad.as_object_mut() {
                fields.insert("creatives".to_string(), Value::Array(leftovers));
            }
        }
    }
}
