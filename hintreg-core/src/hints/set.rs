//! Hint sets.

use super::{key::HintKey, value::HintValue};
use crate::error::HintError;
use std::{
    collections::{HashMap, hash_map},
    fmt,
};

/// A map from [`HintKey`] to [`HintValue`].
///
/// Every stored value was accepted by its key at insertion time. A hint set
/// built from a [`DefaultsStore`](super::DefaultsStore) is a copy: later
/// changes to the defaults do not show up in it.
#[derive(Clone, Default, PartialEq)]
pub struct HintSet {
    values: HashMap<HintKey, HintValue>,
}

impl HintSet {
    /// An empty hint set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a hint set from key/value pairs, failing on the first rejected value.
    pub fn from_pairs<'k, I, V>(pairs: I) -> Result<Self, HintError>
    where
        I: IntoIterator<Item = (&'k HintKey, V)>,
        V: Into<HintValue>,
    {
        let mut hints = Self::empty();
        for (key, value) in pairs {
            hints.insert(key, value)?;
        }
        Ok(hints)
    }

    /// Build a hint set from key/value pairs, dropping rejected values.
    ///
    /// Rejected pairs are logged at `warn` level. Meant for implementation hints
    /// assembled from a candidate's fields, where failing is not an option.
    pub fn from_valid_pairs<'k, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'k HintKey, HintValue)>,
    {
        let mut hints = Self::empty();
        for (key, value) in pairs {
            if let Err(err) = hints.insert(key, value) {
                tracing::warn!(%err, "dropping implementation hint");
            }
        }
        hints
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn insert(
        &mut self,
        key: &HintKey,
        value: impl Into<HintValue>,
    ) -> Result<Option<HintValue>, HintError> {
        let value = value.into();
        key.check(&value)?;
        Ok(self.values.insert(key.clone(), value))
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: &HintKey, value: impl Into<HintValue>) -> Result<Self, HintError> {
        self.insert(key, value)?;
        Ok(self)
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &HintKey) -> Option<&HintValue> {
        self.values.get(key)
    }

    /// Remove and return the value stored under `key`.
    pub fn remove(&mut self, key: &HintKey) -> Option<HintValue> {
        self.values.remove(key)
    }

    /// Whether a value is stored under `key`.
    pub fn contains_key(&self, key: &HintKey) -> bool {
        self.values.contains_key(key)
    }

    /// Number of hints.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set holds no hints.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the hints in arbitrary order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.values.iter(),
        }
    }

    /// Iterate over the keys in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &HintKey> {
        self.values.keys()
    }

    /// Copy every hint of `other` into this set, overriding existing values.
    pub fn extend(&mut self, other: &HintSet) {
        for (key, value) in other.iter() {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Copy the hints of `defaults` whose keys are absent from this set.
    ///
    /// Returns whether anything was added.
    pub fn add_defaults(&mut self, defaults: &HintSet) -> bool {
        let mut added = false;
        for (key, value) in defaults.iter() {
            if let hash_map::Entry::Vacant(slot) = self.values.entry(key.clone()) {
                slot.insert(value.clone());
                added = true;
            }
        }
        added
    }

    /// A copy of this set without the given keys.
    pub fn without_keys<'k, I>(&self, keys: I) -> HintSet
    where
        I: IntoIterator<Item = &'k HintKey>,
    {
        let mut copy = self.clone();
        for key in keys {
            copy.values.remove(key);
        }
        copy
    }

    /// Hints sorted by key name, for stable rendering.
    pub fn sorted(&self) -> Vec<(&HintKey, &HintValue)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.name().cmp(b.0.name()));
        entries
    }
}

/// Iterator over the hints of a [`HintSet`].
pub struct Iter<'a> {
    inner: hash_map::Iter<'a, HintKey, HintValue>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a HintKey, &'a HintValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a HintSet {
    type Item = (&'a HintKey, &'a HintValue);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for HintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.sorted()).finish()
    }
}

impl fmt::Display for HintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.sorted().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::ValueType;

    fn keys() -> (HintKey, HintKey, HintKey) {
        (
            HintKey::options("precision", ["single", "double"]),
            HintKey::new("lenient", ValueType::Bool),
            HintKey::integer("cache_size", 50),
        )
    }

    #[test]
    fn test_insert_validates() {
        let (precision, lenient, _) = keys();
        let mut hints = HintSet::empty();

        assert_eq!(hints.insert(&precision, "single").unwrap(), None);
        assert_eq!(
            hints.insert(&precision, "double").unwrap(),
            Some(HintValue::from("single"))
        );
        assert!(matches!(
            hints.insert(&lenient, "yes"),
            Err(HintError::Rejected { .. })
        ));
        assert_eq!(hints.len(), 1);
        assert!(!hints.contains_key(&lenient));
    }

    #[test]
    fn test_from_pairs() {
        let (precision, lenient, _) = keys();
        let hints =
            HintSet::from_pairs([(&precision, HintValue::from("double")), (&lenient, true.into())])
                .unwrap();
        assert_eq!(hints.get(&lenient), Some(&HintValue::Bool(true)));

        assert!(HintSet::from_pairs([(&lenient, "no")]).is_err());
    }

    #[test]
    fn test_from_valid_pairs_drops_rejected() {
        let (precision, lenient, _) = keys();
        let hints = HintSet::from_valid_pairs([
            (&precision, HintValue::from("quad")),
            (&lenient, HintValue::Bool(false)),
        ]);
        assert_eq!(hints.len(), 1);
        assert!(hints.contains_key(&lenient));
    }

    #[test]
    fn test_add_defaults_keeps_explicit_values() {
        let (precision, lenient, size) = keys();
        let mut hints = HintSet::empty().with(&precision, "single").unwrap();
        let defaults = HintSet::empty()
            .with(&precision, "double")
            .unwrap()
            .with(&lenient, true)
            .unwrap();

        assert!(hints.add_defaults(&defaults));
        assert_eq!(hints.get(&precision), Some(&HintValue::from("single")));
        assert_eq!(hints.get(&lenient), Some(&HintValue::Bool(true)));
        assert!(!hints.add_defaults(&defaults));
        assert!(!hints.contains_key(&size));
    }

    #[test]
    fn test_without_keys() {
        let (precision, lenient, _) = keys();
        let hints = HintSet::empty()
            .with(&precision, "single")
            .unwrap()
            .with(&lenient, true)
            .unwrap();
        let rest = hints.without_keys([&precision]);
        assert_eq!(rest.len(), 1);
        assert!(rest.contains_key(&lenient));
        assert_eq!(hints.len(), 2);
    }

    #[test]
    fn test_display_sorted() {
        let (precision, lenient, size) = keys();
        let hints = HintSet::empty()
            .with(&size, 8)
            .unwrap()
            .with(&precision, "double")
            .unwrap()
            .with(&lenient, false)
            .unwrap();
        assert_eq!(
            hints.to_string(),
            "{cache_size=8, lenient=false, precision=double}"
        );
    }
}
