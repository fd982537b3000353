//! XML tree parsing errors.

/// Errors that can occur while parsing a document into an element tree.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// An error from quick-xml attribute handling.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Names or text that are not valid UTF-8.
    #[error("invalid UTF-8 in document: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Text or entity content that could not be decoded.
    #[error("failed to decode text: {0}")]
    Decode(String),

    /// An end tag that does not close the innermost open element.
    #[error("mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        /// Name of the innermost open element.
        expected: String,
        /// Name found in the end tag.
        found: String,
    },

    /// An end tag with no open element.
    #[error("unmatched end tag </{0}>")]
    UnmatchedTag(String),

    /// The document ended while elements were still open.
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),

    /// An element prefix with no namespace declaration in scope.
    #[error("unbound namespace prefix '{0}'")]
    UnboundPrefix(String),

    /// A second top-level element.
    #[error("multiple root elements: found <{0}> after the root was closed")]
    MultipleRoots(String),

    /// Non-whitespace text outside the root element.
    #[error("text content outside the root element")]
    ContentOutsideRoot,

    /// The document has no root element.
    #[error("document has no root element")]
    MissingRoot,
}
