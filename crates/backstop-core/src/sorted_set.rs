use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::ApiError;

/// Ordering key: name first, then the canonical JSON rendering of the metadata
///
/// Metadata maps are `BTreeMap`s, so the rendering is independent of insertion
/// order and stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    name: String,
    metadata: String,
}

impl SortKey {
    fn of(error: &ApiError) -> Self {
        let metadata = if error.metadata().is_empty() {
            String::new()
        } else {
            serde_json::to_string(error.metadata()).unwrap_or_default()
        };

        Self {
            name: error.name().to_owned(),
            metadata,
        }
    }
}

/// De-duplicating, deterministically ordered set of [`ApiError`]s
///
/// Errors with the same name and metadata collapse into one entry (the first
/// one added is kept). Errors sharing a name but carrying different metadata
/// stay distinct, e.g. the same validation error reported for two fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedErrorSet {
    entries: BTreeMap<SortKey, ApiError>,
}

impl SortedErrorSet {
    /// Create an empty set
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Create a set holding exactly one error
    pub fn singleton_of(error: ApiError) -> Self {
        let mut set = Self::new();
        set.add(error);
        set
    }

    /// Add an error, returning `false` if an equivalent entry was already present
    pub fn add(&mut self, error: ApiError) -> bool {
        match self.entries.entry(SortKey::of(&error)) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(slot) => {
                slot.insert(error);
                true
            }
        }
    }

    /// Add every error from `errors`
    pub fn add_all<I>(&mut self, errors: I)
    where
        I: IntoIterator<Item = ApiError>,
    {
        for error in errors {
            self.add(error);
        }
    }

    /// Whether an entry equal to `error` is present
    pub fn contains(&self, error: &ApiError) -> bool {
        self.entries
            .get(&SortKey::of(error))
            .is_some_and(|existing| existing == error)
    }

    /// Number of distinct entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in sorted order
    pub fn iter(&self) -> Iter<'_> {
        Iter(self.entries.values())
    }

    /// Names of all entries in sorted order, repeated for same-name entries
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(ApiError::name).collect()
    }
}

/// Borrowing iterator over a [`SortedErrorSet`]
#[derive(Debug, Clone)]
pub struct Iter<'a>(btree_map::Values<'a, SortKey, ApiError>);

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ApiError;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Owning iterator over a [`SortedErrorSet`]
#[derive(Debug)]
pub struct IntoIter(btree_map::IntoValues<SortKey, ApiError>);

impl Iterator for IntoIter {
    type Item = ApiError;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for IntoIter {}

impl IntoIterator for SortedErrorSet {
    type Item = ApiError;
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.entries.into_values())
    }
}

impl<'a> IntoIterator for &'a SortedErrorSet {
    type Item = &'a ApiError;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<ApiError> for SortedErrorSet {
    fn from_iter<T: IntoIterator<Item = ApiError>>(iter: T) -> Self {
        let mut set = Self::new();
        set.add_all(iter);
        set
    }
}

impl Extend<ApiError> for SortedErrorSet {
    fn extend<T: IntoIterator<Item = ApiError>>(&mut self, iter: T) {
        self.add_all(iter);
    }
}
