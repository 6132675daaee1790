//! Retroshade HTML
//!
//! html5ever front end that builds a [`retro_dom::Document`], and the
//! matching serializer for writing a themed document back out.

mod parser;
mod serializer;

use std::path::PathBuf;

pub use parser::HtmlParser;
pub use serializer::HtmlSerializer;

use retro_dom::Document;

/// Parse an HTML string into a document at `about:blank`
pub fn parse(html: &str) -> Document {
    HtmlParser::new().parse(html)
}

/// Serialize a whole document
pub fn serialize(document: &Document) -> String {
    HtmlSerializer::new().serialize_document(document)
}

/// HTML front-end errors
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
