//! Output buffer and element encoding.
//!
//! [`XmlOutput`] is the growable buffer a coder writes a document into. It
//! tracks the indentation level for pretty-printing; in compact mode the
//! pretty-printing calls do nothing.
//!
//! Elements are written in three steps (start tag, content, end tag) so a coder
//! can interleave its own output between them. [`ElementTree::encode_with`]
//! composes the three and serializes a whole subtree.

use std::borrow::Cow;

use crate::element::{ElementId, ElementTree};

/// Escape the five reserved XML characters.
#[must_use]
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// A document under construction.
#[derive(Debug, Clone, Default)]
pub struct XmlOutput {
    buf: String,
    level: usize,
    compact: bool,
}

impl XmlOutput {
    /// Create an empty buffer.
    #[must_use]
    pub fn new(compact: bool) -> Self {
        Self {
            buf: String::with_capacity(512),
            level: 0,
            compact,
        }
    }

    /// Whether pretty-printing is suppressed.
    #[must_use]
    pub fn compact(&self) -> bool {
        self.compact
    }

    /// Suppress or enable pretty-printing.
    pub fn set_compact(&mut self, compact: bool) {
        self.compact = compact;
    }

    /// Current indentation level.
    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Increase the indentation level.
    pub fn indent(&mut self) {
        if !self.compact {
            self.level += 1;
        }
    }

    /// Decrease the indentation level.
    pub fn unindent(&mut self) {
        if !self.compact {
            self.level = self.level.saturating_sub(1);
        }
    }

    /// Start a new line padded to the current indentation level.
    pub fn nl(&mut self) {
        if !self.compact {
            self.buf.push('\n');
            for _ in 0..self.level {
                self.buf.push_str("  ");
            }
        }
    }

    /// Append raw text.
    pub fn push_str(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Append text with the XML reserved characters escaped.
    pub fn push_escaped(&mut self, text: &str) {
        self.buf.push_str(&escape_xml(text));
    }

    /// The text written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Length of the text written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard the text and reset the indentation level.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.level = 0;
    }

    /// Take the text out, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        self.level = 0;
        std::mem::take(&mut self.buf)
    }
}

impl ElementTree {
    /// Write the start tag of `id`, with namespace declarations and attributes.
    ///
    /// Returns `true` when the element has been written completely: either it
    /// has a literal override (written verbatim), or `collapse` was requested
    /// and the element is empty (written as `<name />`). The content and end
    /// steps must then be skipped.
    pub fn encode_start_with(&self, id: ElementId, out: &mut XmlOutput, collapse: bool) -> bool {
        if let Some(literal) = self.literal(id) {
            out.push_str(literal);
            return true;
        }
        out.push_str("<");
        out.push_str(self.qualified(id));
        for (prefix, uri) in self.namespaces(id) {
            if prefix.is_empty() {
                out.push_str(" xmlns=\"");
            } else {
                out.push_str(" xmlns:");
                out.push_str(prefix);
                out.push_str("=\"");
            }
            out.push_escaped(uri);
            out.push_str("\"");
        }
        for (key, value) in self.attributes(id) {
            out.push_str(" ");
            out.push_str(key);
            out.push_str("=\"");
            out.push_escaped(value);
            out.push_str("\"");
        }
        let empty = self.count_children(id) == 0 && self.content(id).is_none_or(str::is_empty);
        if collapse && empty {
            out.push_str(" />");
            return true;
        }
        out.push_str(">");
        false
    }

    /// Write the text content of `id` and, recursively, its children.
    pub fn encode_content_with(&self, id: ElementId, out: &mut XmlOutput) {
        if self.literal(id).is_some() {
            return;
        }
        if let Some(content) = self.content(id) {
            out.push_escaped(content);
        }
        if self.count_children(id) > 0 {
            out.indent();
            for child in self.children(id) {
                out.nl();
                self.encode_with(child, out);
            }
            out.unindent();
            out.nl();
        }
    }

    /// Write the end tag of `id`.
    pub fn encode_end_with(&self, id: ElementId, out: &mut XmlOutput) {
        if self.literal(id).is_some() {
            return;
        }
        out.push_str("</");
        out.push_str(self.qualified(id));
        out.push_str(">");
    }

    /// Write the element `id` and its whole subtree.
    pub fn encode_with(&self, id: ElementId, out: &mut XmlOutput) {
        if !self.encode_start_with(id, out, true) {
            self.encode_content_with(id, out);
            self.encode_end_with(id, out);
        }
    }
}
