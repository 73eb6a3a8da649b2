pub mod compiler;
pub mod convert;
pub mod document;
pub mod error;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod path;
pub mod resolver;
pub mod writer;
pub mod xml;

pub use document::{Document, Validation};
pub use error::{Result, VastError};
pub use fetch::{fetch_document, fetch_document_with, Fetch, FetchOptions, HttpFetcher};
pub use path::PathAccess;
pub use resolver::{resolve, RedirectBudget};

/// Parse VAST XML into a normalized document
pub fn parse(xml: &str) -> Result<Document> {
    Document::from_xml(xml)
}

/// Serialize a document to VAST XML, failing if it does not validate
pub fn serialize(document: &Document) -> Result<String> {
    document.to_xml()
}
