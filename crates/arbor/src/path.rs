//! Name validation and slash-delimited path resolution.
//!
//! A path such as `a/b/key` is split into intermediate segments (`a`, `b`)
//! and a final key (`key`). Intermediate segments are resolved as child
//! stores, creating missing ones on the way down.

use crate::error::StoreError;
use crate::store::Store;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';

/// Reject names that are empty or whitespace only.
///
/// Segments are not trimmed; only the name as a whole must carry some
/// non-whitespace content.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidName);
    }
    Ok(())
}

/// Split `name` into its intermediate segments and final key.
///
/// ```
/// use arbor::path::split_path;
///
/// assert_eq!(split_path("key"), (vec![], "key"));
/// assert_eq!(split_path("a/b/key"), (vec!["a", "b"], "key"));
/// ```
pub fn split_path(name: &str) -> (Vec<&str>, &str) {
    match name.rsplit_once(PATH_SEPARATOR) {
        Some((head, key)) => (head.split(PATH_SEPARATOR).collect(), key),
        None => (Vec::new(), name),
    }
}

/// Resolve every segment of `segments` as a child store of `base`.
pub(crate) fn descend<'a, I>(base: &Store, segments: I) -> Result<Store, StoreError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut current = base.clone();
    for segment in segments {
        current = current.child_segment(segment)?;
    }
    Ok(current)
}

/// Resolve `name` to the store holding its final key, and that key.
pub(crate) fn resolve_item<'a>(
    base: &Store,
    name: &'a str,
) -> Result<(Store, &'a str), StoreError> {
    validate_name(name)?;
    let (segments, key) = split_path(name);
    let store = descend(base, segments)?;
    Ok((store, key))
}

/// Resolve all of `name`, final segment included, as child stores.
pub(crate) fn resolve_store(base: &Store, name: &str) -> Result<Store, StoreError> {
    validate_name(name)?;
    descend(base, name.split(PATH_SEPARATOR))
}
