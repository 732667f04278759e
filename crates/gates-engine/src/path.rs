use serde_json::Value;

/// Resolve a dotted path such as `profile.confidence`.
///
/// Every segment must name a key of an object. A key that is present with a
/// `null` value still resolves.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |current, key| current.as_object()?.get(key))
}
