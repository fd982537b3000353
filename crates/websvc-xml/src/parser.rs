//! Event-driven construction of element trees.
//!
//! [`TreeBuilder`] receives start-tag, text and end-tag events and assembles an
//! [`ElementTree`] from them using a stack of open elements.
//! [`parse_document`] feeds it the events quick-xml produces for a byte buffer.
//!
//! A document is rejected as a whole: on any error the partially built tree is
//! dropped and only the error is returned.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::element::{ElementId, ElementTree, local_name, name_prefix};
use crate::error::XmlError;

/// Assembles an element tree from parser events.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: ElementTree,
    stack: Vec<ElementId>,
    namespace_aware: bool,
}

impl TreeBuilder {
    /// Create a builder ready to receive a root element.
    ///
    /// With `namespace_aware` set, element prefixes must be bound by a
    /// declaration in scope and each element records its namespace URI.
    #[must_use]
    pub fn new(namespace_aware: bool) -> Self {
        Self {
            tree: ElementTree::new(),
            stack: Vec::new(),
            namespace_aware,
        }
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open a new element as a child of the innermost open element, or as the
    /// root when none is open.
    pub fn start_element(
        &mut self,
        qualified: &str,
        attributes: Vec<(String, String)>,
    ) -> Result<ElementId, XmlError> {
        if self.stack.is_empty() && self.tree.root().is_some() {
            return Err(XmlError::MultipleRoots(qualified.to_owned()));
        }

        let mut declarations = Vec::new();
        let mut plain = Vec::new();
        for (key, value) in attributes {
            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_owned(), value));
            } else {
                plain.push((key, value));
            }
        }

        let prefix = name_prefix(qualified).unwrap_or("");
        let namespace = if self.namespace_aware {
            let uri = declarations
                .iter()
                .find(|(p, _)| p == prefix)
                .map(|(_, uri)| uri.as_str())
                .or_else(|| {
                    self.stack
                        .last()
                        .and_then(|top| self.tree.resolve_prefix(*top, prefix))
                })
                .or((prefix == "xml").then_some(crate::XML_NAMESPACE));
            match uri {
                Some(uri) => Some(uri.to_owned()).filter(|u| !u.is_empty()),
                None if prefix.is_empty() => None,
                None => return Err(XmlError::UnboundPrefix(prefix.to_owned())),
            }
        } else {
            None
        };

        let attrs: Vec<(&str, &str)> = plain
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let id = self.tree.create_element(
            local_name(qualified),
            namespace.as_deref(),
            qualified,
            &attrs,
        );
        for (prefix, uri) in &declarations {
            self.tree.set_namespace(id, prefix, uri);
        }

        match self.stack.last() {
            Some(parent) => self.tree.add_child(*parent, id),
            None => self.tree.set_root(id),
        }
        self.stack.push(id);
        Ok(id)
    }

    /// Append text to the innermost open element.
    ///
    /// Whitespace outside the root is ignored; any other text there is an
    /// error.
    pub fn characters(&mut self, text: &str) -> Result<(), XmlError> {
        match self.stack.last() {
            Some(top) => {
                self.tree.add_content(*top, text);
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(XmlError::ContentOutsideRoot),
        }
    }

    /// Close the innermost open element, which stays attached to its parent.
    pub fn end_element(&mut self, qualified: &str) -> Result<(), XmlError> {
        let Some(top) = self.stack.pop() else {
            return Err(XmlError::UnmatchedTag(qualified.to_owned()));
        };
        let expected = self.tree.qualified(top);
        if expected != qualified {
            return Err(XmlError::MismatchedTag {
                expected: expected.to_owned(),
                found: qualified.to_owned(),
            });
        }
        Ok(())
    }

    /// Finish the document, returning the tree if it is complete.
    pub fn finish(self) -> Result<ElementTree, XmlError> {
        if let Some(top) = self.stack.last() {
            return Err(XmlError::UnexpectedEof(self.tree.qualified(*top).to_owned()));
        }
        if self.tree.root().is_none() {
            return Err(XmlError::MissingRoot);
        }
        Ok(self.tree)
    }
}

/// Parse a complete document into an element tree.
///
/// Text, CDATA sections and entity references are accumulated into the
/// content of the enclosing element. Declarations, comments, processing
/// instructions and doctypes are skipped.
///
/// # Errors
///
/// Returns `XmlError` if the document is not well-formed, is truncated, or
/// (when `namespace_aware`) uses an unbound element prefix.
pub fn parse_document(xml: &[u8], namespace_aware: bool) -> Result<ElementTree, XmlError> {
    let mut reader = Reader::from_reader(xml);
    let mut builder = TreeBuilder::new(namespace_aware);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let (name, attributes) = read_start(&e)?;
                builder.start_element(&name, attributes)?;
            }
            Event::Empty(e) => {
                let (name, attributes) = read_start(&e)?;
                builder.start_element(&name, attributes)?;
                builder.end_element(&name)?;
            }
            Event::End(e) => {
                let name = e.name();
                builder.end_element(std::str::from_utf8(name.as_ref())?)?;
            }
            Event::Text(e) => {
                let text = e
                    .decode()
                    .map_err(|err| XmlError::Decode(err.to_string()))?;
                builder.characters(&text)?;
            }
            Event::CData(e) => {
                builder.characters(std::str::from_utf8(&e)?)?;
            }
            Event::GeneralRef(e) => {
                let name = e
                    .decode()
                    .map_err(|err| XmlError::Decode(err.to_string()))?;
                let reference = format!("&{name};");
                let resolved = quick_xml::escape::unescape(&reference)
                    .map_err(|err| XmlError::Decode(err.to_string()))?;
                builder.characters(&resolved)?;
            }
            Event::Eof => break,
            // Skip declaration, comments, processing instructions, doctype.
            _ => {}
        }
    }

    let tree = builder.finish()?;
    tracing::trace!(elements = tree.len(), "parsed XML document");
    Ok(tree)
}

/// Extract the qualified name and unescaped attributes of a start tag.
fn read_start(e: &BytesStart<'_>) -> Result<(String, Vec<(String, String)>), XmlError> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_owned();
        let raw = std::str::from_utf8(&attr.value)?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|err| XmlError::Decode(err.to_string()))?;
        attributes.push((key, value.into_owned()));
    }
    Ok((name, attributes))
}
