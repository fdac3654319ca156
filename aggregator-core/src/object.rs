//! Generic object list wrapper.
use crate::metadata::ListMeta;
use serde::{Deserialize, Serialize};

/// A generic Kubernetes object list
///
/// This is used instead of a dedicated `APIServiceList` struct, and is
/// produced from list and delete collection queries.
#[derive(Serialize, Deserialize, Debug)]
pub struct ObjectList<T>
where
    T: Clone,
{
    /// ListMeta - only really used for its `resourceVersion` and `continue` token
    #[serde(default)]
    pub metadata: ListMeta,

    /// The items we are actually interested in
    #[serde(bound(deserialize = "Vec<T>: Deserialize<'de>"))]
    pub items: Vec<T>,
}

impl<T: Clone> ObjectList<T> {
    /// `iter` returns an Iterator over the elements of this ObjectList
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// `iter_mut` returns an Iterator of mutable references to the elements of this ObjectList
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }
}

impl<T: Clone> IntoIterator for ObjectList<T> {
    type IntoIter = ::std::vec::IntoIter<Self::Item>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T: Clone> IntoIterator for &'a ObjectList<T> {
    type IntoIter = ::std::slice::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T: Clone> IntoIterator for &'a mut ObjectList<T> {
    type IntoIter = ::std::slice::IterMut<'a, T>;
    type Item = &'a mut T;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectList;

    #[test]
    fn iterates_items() {
        let mut list: ObjectList<u32> = serde_json::from_str(
            r#"{"metadata":{"resourceVersion":"12","continue":"next"},"items":[1,2,3]}"#,
        )
        .unwrap();
        assert_eq!(list.metadata.resource_version.as_deref(), Some("12"));
        assert_eq!(list.metadata.continue_.as_deref(), Some("next"));
        for item in &mut list {
            *item *= 2;
        }
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![2, 4, 6]);
        assert_eq!(list.into_iter().sum::<u32>(), 12);
    }

    #[test]
    fn missing_metadata_defaults() {
        let list: ObjectList<u32> = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(list.metadata.resource_version.is_none());
        assert!(list.items.is_empty());
    }
}
