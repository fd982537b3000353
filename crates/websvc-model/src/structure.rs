//! String-keyed structures with an optional local field order.

use std::collections::{HashMap, HashSet};

use crate::value::Value;

/// A field order that does not match the keys of the structure it describes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    /// The order names a field the structure does not have.
    #[error("order names unknown field '{0}'")]
    UnknownField(String),

    /// The order names a field more than once.
    #[error("order names field '{0}' more than once")]
    DuplicateField(String),

    /// The order leaves out a field of the structure.
    #[error("order omits field '{0}'")]
    MissingField(String),
}

/// A string-keyed map of values.
///
/// A structure may carry a local field order, which then dictates the sequence
/// its members are encoded in. The order is scoped to this structure only;
/// nested structures carry their own. Structures produced by decoding always
/// carry the order in which their members appeared in the document.
///
/// Equality compares the members only; the order is presentation metadata.
#[derive(Debug, Clone, Default)]
pub struct Struct {
    fields: HashMap<String, Value>,
    order: Option<Vec<String>>,
}

impl Struct {
    /// Create an empty structure without a field order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a structure from `(name, value)` pairs, recording their sequence as
    /// the field order. Later duplicates replace earlier ones.
    pub fn ordered<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut s = Self::new();
        let mut order = Vec::new();
        for (k, v) in pairs {
            let key = k.into();
            if s.fields.insert(key.clone(), v.into()).is_none() {
                order.push(key);
            }
        }
        s.order = Some(order);
        s
    }

    /// Insert a member, returning the previous value for the key.
    ///
    /// A new key is appended to the field order if one is set.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let previous = self.fields.insert(key.clone(), value.into());
        if previous.is_none() {
            if let Some(order) = &mut self.order {
                order.push(key);
            }
        }
        previous
    }

    /// Remove a member, also dropping it from the field order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.fields.remove(key);
        if removed.is_some() {
            if let Some(order) = &mut self.order {
                order.retain(|k| k != key);
            }
        }
        removed
    }

    /// Look up a member.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns `true` if the structure has a member with this name.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the structure has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The local field order, if any.
    #[must_use]
    pub fn order(&self) -> Option<&[String]> {
        self.order.as_deref()
    }

    /// Replace the local field order.
    ///
    /// The order is not validated here; coders validate it when they encode.
    pub fn set_order(&mut self, order: Option<Vec<String>>) {
        self.order = order;
    }

    /// Iterate over members in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Resolve the sequence members are encoded in.
    ///
    /// An explicit order wins over the local order. Without either, keys are
    /// sorted lexicographically. Whatever order is used must name every member
    /// exactly once.
    pub fn ordered_keys<'a>(
        &'a self,
        explicit: Option<&'a [String]>,
    ) -> Result<Vec<&'a str>, OrderError> {
        match explicit.or(self.order.as_deref()) {
            Some(order) => {
                self.check_order(order)?;
                Ok(order.iter().map(String::as_str).collect())
            }
            None => {
                let mut keys: Vec<&str> = self.fields.keys().map(String::as_str).collect();
                keys.sort_unstable();
                Ok(keys)
            }
        }
    }

    /// Members paired with their values in encoding sequence.
    pub fn ordered_fields<'a>(
        &'a self,
        explicit: Option<&'a [String]>,
    ) -> Result<Vec<(&'a str, &'a Value)>, OrderError> {
        let keys = self.ordered_keys(explicit)?;
        Ok(keys
            .into_iter()
            .filter_map(|k| self.fields.get(k).map(|v| (k, v)))
            .collect())
    }

    fn check_order(&self, order: &[String]) -> Result<(), OrderError> {
        let mut seen = HashSet::with_capacity(order.len());
        for name in order {
            if !self.fields.contains_key(name) {
                return Err(OrderError::UnknownField(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(OrderError::DuplicateField(name.clone()));
            }
        }
        if let Some(missing) = self.fields.keys().find(|k| !seen.contains(k.as_str())) {
            return Err(OrderError::MissingField(missing.clone()));
        }
        Ok(())
    }
}

impl PartialEq for Struct {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Struct {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut s = Self::new();
        for (k, v) in iter {
            s.insert(k, v);
        }
        s
    }
}
