//! Hooks a collaborator can use to steer a coder.

use websvc_model::{Port, Value};
use websvc_xml::{ElementId, ElementTree};

use crate::coder::Coder;

/// A collaborator that can intercept or substitute elements while a coder
/// builds or decodes a document.
///
/// Every hook has a default that leaves the coder's own behaviour in place, so
/// an implementation only overrides what it needs. A delegate is attached to a
/// coder with [`Coder::set_delegate`].
///
/// The JSON coder has no element tree; it consults only
/// [`operation_name`](Self::operation_name).
pub trait CoderDelegate: Send + Sync {
    /// Decode `element` (the value named `name`) in place of the coder.
    ///
    /// Returns `None` to let the coder decode the element itself.
    fn decode_item(
        &self,
        _coder: &Coder,
        _tree: &ElementTree,
        _element: ElementId,
        _name: &str,
    ) -> Option<Value> {
        None
    }

    /// Encode `item` under `name` as a child of `parent` in place of the coder.
    ///
    /// Returns `false` to let the coder encode the item itself.
    fn encode_item(
        &self,
        _coder: &Coder,
        _tree: &mut ElementTree,
        _item: &Value,
        _name: &str,
        _parent: ElementId,
    ) -> bool {
        false
    }

    /// Name of the operation to use when a message is built without one.
    fn operation_name(&self) -> Option<String> {
        None
    }

    /// Port the current operation is performed on.
    fn operation_port(&self) -> Option<Port> {
        None
    }

    /// Inspect or replace an element before it is decoded.
    fn will_decode(&self, _coder: &Coder, _tree: &mut ElementTree, element: ElementId) -> ElementId {
        element
    }

    /// Inspect or replace an element before it is added to a document.
    ///
    /// `element` is `None` for an optional slot the coder would leave empty
    /// (the SOAP header); returning an element there adds it.
    fn will_encode(
        &self,
        _coder: &Coder,
        _tree: &mut ElementTree,
        element: Option<ElementId>,
    ) -> Option<ElementId> {
        element
    }
}
