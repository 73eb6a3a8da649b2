use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use vast_resolver::{
    fetch_document_with, resolve, Document, Fetch, FetchOptions, RedirectBudget, Result, VastError,
};

/// Serves canned documents by URI and records every request
#[derive(Default)]
struct MockFetcher {
    documents: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    fn with(mut self, uri: &str, xml: &str) -> Self {
        self.documents.insert(uri.to_string(), xml.to_string());
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, uri: &str) -> Result<String> {
        self.requests.lock().unwrap().push(uri.to_string());
        self.documents
            .get(uri)
            .cloned()
            .ok_or_else(|| VastError::transport(format!("404 Not Found: {}", uri)))
    }
}

fn wrapper_ad(id: &str, target: &str, creatives: &str) -> String {
    format!(
        r#"<Ad id="{id}">
        <Wrapper>
            <AdSystem>Wrapper System</AdSystem>
            <VASTAdTagURI><![CDATA[{target}]]></VASTAdTagURI>
            <Error><![CDATA[w]]></Error>
            <Impression><![CDATA[wi]]></Impression>
            <Creatives>{creatives}</Creatives>
        </Wrapper>
    </Ad>"#
    )
}

fn wrapper_xml(id: &str, target: &str, creatives: &str) -> String {
    vast(&[wrapper_ad(id, target, creatives)])
}

fn inline_ad(id: &str, creatives: &str) -> String {
    format!(
        r#"<Ad id="{id}">
        <InLine>
            <AdSystem>Inline System</AdSystem>
            <AdTitle>Inline {id}</AdTitle>
            <Error><![CDATA[i]]></Error>
            <Impression><![CDATA[ii]]></Impression>
            <Creatives>{creatives}</Creatives>
        </InLine>
    </Ad>"#
    )
}

fn linear(tracking: &str) -> String {
    format!(
        r#"<Creative><Linear>
            <Duration>00:00:15</Duration>
            <TrackingEvents><Tracking event="start"><![CDATA[{tracking}]]></Tracking></TrackingEvents>
            <MediaFiles><MediaFile type="video/mp4"><![CDATA[http://example.com/video.mp4]]></MediaFile></MediaFiles>
        </Linear></Creative>"#
    )
}

fn vast(ads: &[String]) -> String {
    format!(r#"<VAST version="2.0">{}</VAST>"#, ads.concat())
}

#[tokio::test]
async fn merges_wrapper_tracking_after_response_values() {
    let fetcher = MockFetcher::default().with(
        "http://example.com/inline.xml",
        &vast(&[inline_ad("1", &linear("i-start"))]),
    );
    let document = Document::from_xml(&wrapper_xml(
        "w",
        "http://example.com/inline.xml",
        &linear("w-start"),
    ))
    .unwrap();

    let resolved = resolve(&document, &fetcher, RedirectBudget::Unlimited).await.unwrap();

    assert_eq!(resolved.ads().len(), 1);
    assert_eq!(resolved.get("ads[0].type"), Some(&json!("inline")));
    assert_eq!(resolved.get("ads[0].errors"), Some(&json!(["i", "w"])));
    assert_eq!(
        resolved.get("ads[0].impressions"),
        Some(&json!([{ "uri": "ii" }, { "uri": "wi" }]))
    );
    assert_eq!(
        resolved.map("ads[0].creatives[0].trackingEvents", |event, _, _| event["uri"].clone()),
        vec![json!("i-start"), json!("w-start")]
    );
    assert!(resolved.validate().valid);
    assert_eq!(fetcher.requests(), vec!["http://example.com/inline.xml"]);
}

#[tokio::test]
async fn leaves_the_input_document_untouched() {
    let fetcher = MockFetcher::default()
        .with("http://example.com/inline.xml", &vast(&[inline_ad("1", &linear("i"))]));
    let document =
        Document::from_xml(&wrapper_xml("w", "http://example.com/inline.xml", "")).unwrap();
    let before = document.to_pojo();

    resolve(&document, &fetcher, RedirectBudget::Unlimited).await.unwrap();

    assert_eq!(document.to_pojo(), before);
    assert_eq!(document.wrappers().len(), 1);
}

#[tokio::test]
async fn documents_without_wrappers_resolve_to_themselves() {
    let fetcher = MockFetcher::default();
    let document = Document::from_xml(&vast(&[inline_ad("1", &linear("i"))])).unwrap();

    let resolved = resolve(&document, &fetcher, RedirectBudget::Unlimited).await.unwrap();

    assert_eq!(resolved, document);
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn a_zero_budget_always_fails() {
    let fetcher = MockFetcher::default();
    let wrapped = Document::from_xml(&wrapper_xml("w", "http://example.com/a.xml", "")).unwrap();
    let plain = Document::from_xml(&vast(&[inline_ad("1", &linear("i"))])).unwrap();

    for document in [&wrapped, &plain] {
        let error = resolve(document, &fetcher, RedirectBudget::Limited(0))
            .await
            .unwrap_err();
        assert!(matches!(error, VastError::TooManyRedirects));
        assert_eq!(error.to_string(), "Too many redirects were made.");
    }
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn follows_chains_one_pass_at_a_time() {
    let fetcher = MockFetcher::default()
        .with(
            "http://example.com/second.xml",
            &wrapper_xml("second", "http://example.com/inline.xml", ""),
        )
        .with("http://example.com/inline.xml", &vast(&[inline_ad("1", &linear("i"))]));
    let document =
        Document::from_xml(&wrapper_xml("first", "http://example.com/second.xml", "")).unwrap();

    let resolved = resolve(&document, &fetcher, RedirectBudget::Limited(2)).await.unwrap();
    assert_eq!(resolved.inlines().len(), 1);
    // Each wrapper contributes its own error, deduplicated as a scalar
    assert_eq!(resolved.get("ads[0].errors"), Some(&json!(["i", "w"])));
    assert_eq!(
        resolved.get("ads[0].impressions"),
        Some(&json!([{ "uri": "ii" }, { "uri": "wi" }, { "uri": "wi" }]))
    );

    let error = resolve(&document, &fetcher, RedirectBudget::Limited(1))
        .await
        .unwrap_err();
    assert!(matches!(error, VastError::TooManyRedirects));
}

#[tokio::test]
async fn extra_wrapper_creatives_are_dropped_for_inline_responses() {
    let fetcher = MockFetcher::default()
        .with("http://example.com/inline.xml", &vast(&[inline_ad("1", &linear("i"))]));
    let creatives = [linear("w-1"), linear("w-2")].concat();
    let document =
        Document::from_xml(&wrapper_xml("w", "http://example.com/inline.xml", &creatives)).unwrap();

    let resolved = resolve(&document, &fetcher, RedirectBudget::Unlimited).await.unwrap();

    assert_eq!(resolved.map("ads[0].creatives", |_, _, _| ()).len(), 1);
    assert_eq!(
        resolved.map("ads[0].creatives[0].trackingEvents", |event, _, _| event["uri"].clone()),
        vec![json!("i"), json!("w-1")]
    );
}

#[tokio::test]
async fn extra_wrapper_creatives_carry_through_wrapper_responses() {
    let fetcher = MockFetcher::default()
        .with(
            "http://example.com/second.xml",
            &wrapper_xml("second", "http://example.com/inline.xml", &linear("s-1")),
        )
        .with(
            "http://example.com/inline.xml",
            &vast(&[inline_ad("1", &[linear("i-1"), linear("i-2")].concat())]),
        );
    let creatives = [linear("w-1"), linear("w-2")].concat();
    let document =
        Document::from_xml(&wrapper_xml("first", "http://example.com/second.xml", &creatives))
            .unwrap();

    let resolved = resolve(&document, &fetcher, RedirectBudget::Unlimited).await.unwrap();

    let uris = |index: usize| {
        resolved.map(
            &format!("ads[0].creatives[{}].trackingEvents", index),
            |event, _, _| event["uri"].clone(),
        )
    };
    assert_eq!(uris(0), vec![json!("i-1"), json!("s-1"), json!("w-1")]);
    assert_eq!(uris(1), vec![json!("i-2"), json!("w-2")]);
}

#[tokio::test]
async fn multiple_response_ads_replace_one_wrapper() {
    let fetcher = MockFetcher::default().with(
        "http://example.com/pod.xml",
        &vast(&[inline_ad("1", &linear("a")), inline_ad("2", &linear("b"))]),
    );
    let document = Document::from_xml(&vast(&[
        inline_ad("before", &linear("x")),
        wrapper_ad("w", "http://example.com/pod.xml", ""),
        inline_ad("after", &linear("y")),
    ]))
    .unwrap();

    let resolved = resolve(&document, &fetcher, RedirectBudget::Unlimited).await.unwrap();

    let ids = resolved.map("ads", |ad, _, _| ad["id"].clone());
    assert_eq!(ids, vec![json!("before"), json!("1"), json!("2"), json!("after")]);
    assert_eq!(resolved.get("ads[2].errors"), Some(&json!(["i", "w"])));
    assert_eq!(resolved.get("ads[0].errors"), Some(&json!(["i"])));
}

#[tokio::test]
async fn empty_responses_remove_the_wrapper() {
    let fetcher = MockFetcher::default().with("http://example.com/empty.xml", "<VAST version=\"2.0\"></VAST>");
    let document =
        Document::from_xml(&wrapper_xml("w", "http://example.com/empty.xml", "")).unwrap();

    let resolved = resolve(&document, &fetcher, RedirectBudget::Unlimited).await.unwrap();
    assert!(resolved.ads().is_empty());
}

#[tokio::test]
async fn fetch_failures_fail_the_resolution() {
    let fetcher = MockFetcher::default();
    let document =
        Document::from_xml(&wrapper_xml("w", "http://example.com/missing.xml", "")).unwrap();

    let error = resolve(&document, &fetcher, RedirectBudget::Unlimited)
        .await
        .unwrap_err();

    assert!(matches!(error, VastError::Transport(_)));
    assert_eq!(error.to_string(), "404 Not Found: http://example.com/missing.xml");
}

#[tokio::test]
async fn one_failed_fetch_fails_the_whole_pass() {
    let fetcher = MockFetcher::default()
        .with("http://example.com/inline.xml", &vast(&[inline_ad("1", &linear("i"))]));
    let document = Document::from_xml(&vast(&[
        wrapper_ad("served", "http://example.com/inline.xml", ""),
        wrapper_ad("missing", "http://example.com/missing.xml", ""),
    ]))
    .unwrap();
    let before = document.to_pojo();

    let error = resolve(&document, &fetcher, RedirectBudget::Unlimited)
        .await
        .unwrap_err();

    assert!(matches!(error, VastError::Transport(_)));
    assert_eq!(error.to_string(), "404 Not Found: http://example.com/missing.xml");
    assert_eq!(document.to_pojo(), before);
    assert_eq!(document.wrappers().len(), 2);
    assert!(document.inlines().is_empty());
}

#[tokio::test]
async fn non_vast_responses_are_format_errors() {
    let fetcher = MockFetcher::default().with("http://example.com/html", "<html></html>");
    let document = Document::from_xml(&wrapper_xml("w", "http://example.com/html", "")).unwrap();

    let error = resolve(&document, &fetcher, RedirectBudget::Unlimited)
        .await
        .unwrap_err();
    assert!(error.is_format_error());
}

#[tokio::test]
async fn fetch_document_resolves_when_asked() {
    let fetcher = MockFetcher::default()
        .with(
            "http://example.com/wrapper.xml",
            &wrapper_xml("w", "http://example.com/inline.xml", ""),
        )
        .with("http://example.com/inline.xml", &vast(&[inline_ad("1", &linear("i"))]));

    let plain = fetch_document_with(&fetcher, "http://example.com/wrapper.xml", &FetchOptions::default())
        .await
        .unwrap();
    assert_eq!(plain.wrappers().len(), 1);

    let options = FetchOptions {
        resolve_wrappers: true,
        ..FetchOptions::default()
    };
    let resolved = fetch_document_with(&fetcher, "http://example.com/wrapper.xml", &options)
        .await
        .unwrap();
    assert_eq!(resolved.inlines().len(), 1);
    assert!(resolved.wrappers().is_empty());

    let options = FetchOptions {
        resolve_wrappers: true,
        max_redirects: RedirectBudget::Limited(0),
        ..FetchOptions::default()
    };
    assert!(matches!(
        fetch_document_with(&fetcher, "http://example.com/wrapper.xml", &options).await,
        Err(VastError::TooManyRedirects)
    ));
}
