//! Fragment pointers (`#/components/schemas/Foo`) into a root document.

use serde_json::Value;

use crate::error::ResolveError;
use crate::types::json_type_name;

/// Split a fragment pointer into unescaped segments.
///
/// One leading `#` and one `/` are stripped; `#` alone yields no segments
/// and points at the root. Segments are unescaped per RFC 6901 (`~1` is
/// `/`, `~0` is `~`), so `#//a` is the empty key followed by `a`.
pub fn segments(pointer: &str) -> Vec<String> {
    let path = pointer.strip_prefix('#').unwrap_or(pointer);
    let path = match path.strip_prefix('/') {
        Some(path) => path,
        None if path.is_empty() => return Vec::new(),
        None => path,
    };
    path.split('/')
        .map(|part| part.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// Escape a key for use as a pointer segment (`~` to `~0`, `/` to `~1`).
pub fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Whether a `$ref` string points inside the same document.
pub fn is_local(pointer: &str) -> bool {
    pointer.starts_with('#')
}

/// Walk `root` along `pointer`.
///
/// # Errors
///
/// `InvalidReferencePath` when a segment has to be looked up on a scalar or
/// null, `UnresolvableReference` when a key or index is absent.
pub fn navigate<'a>(root: &'a Value, pointer: &str) -> Result<&'a Value, ResolveError> {
    let mut current = root;
    for segment in segments(pointer) {
        current = match current {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => parse_index(&segment).and_then(|i| items.get(i)),
            other => {
                return Err(ResolveError::InvalidReferencePath {
                    pointer: pointer.to_string(),
                    segment,
                    actual: json_type_name(other).to_string(),
                })
            }
        }
        .ok_or_else(|| ResolveError::UnresolvableReference {
            pointer: pointer.to_string(),
        })?;
    }
    Ok(current)
}

/// Remove the leaf `pointer` names from its parent mapping.
///
/// Returns the removed value, or `None` when the parent or the leaf is
/// already gone. Array elements are never removed since that would shift
/// the indices other pointers rely on.
pub fn remove(root: &mut Value, pointer: &str) -> Option<Value> {
    let mut path = segments(pointer);
    let leaf = path.pop()?;

    let mut current = root;
    for segment in &path {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(parse_index(segment)?)?,
            _ => return None,
        };
    }

    match current {
        Value::Object(map) => map.shift_remove(&leaf),
        _ => None,
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn segments_strip_prefix() {
        assert_eq!(segments("#/a/b"), vec!["a", "b"]);
        assert_eq!(segments("#/components/schemas/Foo").len(), 3);
        assert!(segments("#").is_empty());
        assert_eq!(segments("#/"), vec![""]);
    }

    #[test]
    fn empty_keys_are_segments() {
        assert_eq!(segments("#//a"), vec!["", "a"]);

        let root = json!({ "": { "a": 1 }, "a": 2 });
        assert_eq!(navigate(&root, "#//a").unwrap(), &json!(1));
        assert_eq!(navigate(&root, "#/a").unwrap(), &json!(2));
    }

    #[test]
    fn segments_unescape() {
        assert_eq!(segments("#/paths/~1users~1{id}"), vec!["paths", "/users/{id}"]);
        assert_eq!(segments("#/a~0b"), vec!["a~b"]);
    }

    #[test]
    fn escape_round_trips_through_segments() {
        let key = "/users/{id}~draft";
        let pointer = format!("#/paths/{}", escape(key));
        assert_eq!(pointer, "#/paths/~1users~1{id}~0draft");
        assert_eq!(segments(&pointer), vec!["paths", key]);
    }

    #[test]
    fn navigate_objects_and_arrays() {
        let root = json!({ "a": { "b": [ { "c": 1 }, { "c": 2 } ] } });
        assert_eq!(navigate(&root, "#/a/b/1/c").unwrap(), &json!(2));
        assert_eq!(navigate(&root, "#").unwrap(), &root);
    }

    #[test]
    fn navigate_missing_key_is_unresolvable() {
        let root = json!({ "a": {} });
        let err = navigate(&root, "#/a/missing").unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvableReference { .. }));
    }

    #[test]
    fn navigate_bad_array_index_is_unresolvable() {
        let root = json!({ "a": [1] });
        for pointer in ["#/a/5", "#/a/x", "#/a/-1"] {
            let err = navigate(&root, pointer).unwrap_err();
            assert!(
                matches!(err, ResolveError::UnresolvableReference { .. }),
                "{pointer}"
            );
        }
    }

    #[test]
    fn navigate_through_scalar_is_invalid_path() {
        let root = json!({ "a": "scalar" });
        match navigate(&root, "#/a/b").unwrap_err() {
            ResolveError::InvalidReferencePath {
                segment, actual, ..
            } => {
                assert_eq!(segment, "b");
                assert_eq!(actual, "string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn navigate_through_null_is_invalid_path() {
        let root = json!({ "a": null });
        let err = navigate(&root, "#/a/b").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidReferencePath { .. }));
    }

    #[test]
    fn remove_leaf() {
        let mut root = json!({ "components": { "schemas": { "Foo": {}, "Bar": {} } } });
        assert_eq!(remove(&mut root, "#/components/schemas/Foo"), Some(json!({})));
        assert_eq!(root, json!({ "components": { "schemas": { "Bar": {} } } }));
        assert_eq!(remove(&mut root, "#/components/schemas/Foo"), None);
    }

    #[test]
    fn remove_never_touches_arrays() {
        let mut root = json!({ "a": [1, 2] });
        assert_eq!(remove(&mut root, "#/a/0"), None);
        assert_eq!(root, json!({ "a": [1, 2] }));
    }

    #[test]
    fn remove_root_is_noop() {
        let mut root = json!({ "a": 1 });
        assert_eq!(remove(&mut root, "#"), None);
        assert_eq!(root, json!({ "a": 1 }));
    }

    #[test]
    fn local_pointers() {
        assert!(is_local("#/a"));
        assert!(is_local("#"));
        assert!(!is_local("other.json#/a"));
    }
}
