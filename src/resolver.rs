//! Reference resolution - replaces `$ref` pointers with the values they name.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::ResolveError;
use crate::pointer;
use crate::types::{CyclePolicy, Node, RefOptions};

/// Outcome of resolving a value against a root document.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The value with every local Reference Node replaced.
    pub value: Value,
    /// Distinct pointers into the shared-definitions subtree that were inlined.
    pub consumed: BTreeSet<String>,
    /// Pointers left in place as Reference Nodes because they close a cycle.
    pub preserved: BTreeSet<String>,
}

impl Resolution {
    /// Pointers that can be pruned without leaving a dangling `$ref` in
    /// the resolved value.
    ///
    /// A consumed definition is kept when a preserved pointer is the
    /// definition itself or lies inside it.
    pub fn prunable(&self) -> BTreeSet<String> {
        self.consumed
            .iter()
            .filter(|consumed| {
                !self
                    .preserved
                    .iter()
                    .any(|preserved| contains_pointer(consumed, preserved))
            })
            .cloned()
            .collect()
    }

    /// Delete the prunable definitions from `root`.
    ///
    /// Returns the number of leaves actually removed.
    pub fn prune(&self, root: &mut Value) -> usize {
        prune_consumed(root, &self.prunable())
    }
}

/// Whether `inner` is `outer` or a pointer below it.
fn contains_pointer(outer: &str, inner: &str) -> bool {
    inner
        .strip_prefix(outer)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Resolve every `$ref` in `value` against `root`.
///
/// `root` is not modified; definitions the caller may want to drop are
/// reported in [`Resolution::consumed`]. Resolved targets are themselves
/// fully resolved, and each distinct pointer is resolved once per call.
///
/// # Errors
///
/// Fails on the first pointer that cannot be followed
/// (`UnresolvableReference`, `InvalidReferencePath`) or, under
/// [`CyclePolicy::Error`], on a pointer whose target is still being resolved
/// (`CircularReference`). No partial result is returned.
pub fn resolve_refs(
    value: &Value,
    root: &Value,
    options: &RefOptions,
) -> Result<Resolution, ResolveError> {
    let mut resolver = RefResolver::new(root, options);
    let value = resolver.resolve_value(value)?;

    Ok(Resolution {
        value,
        consumed: resolver.consumed,
        preserved: resolver.preserved,
    })
}

/// Resolve `value` against `root`, then prune consumed definitions from
/// `root` when `options.prune` is set.
///
/// Pruning makes a second resolution of the same pointer against the same
/// root fail, so re-parse or clone documents before resolving them again.
pub fn resolve(
    value: &Value,
    root: &mut Value,
    options: &RefOptions,
) -> Result<Value, ResolveError> {
    let resolution = resolve_refs(value, root, options)?;
    if options.prune {
        let removed = resolution.prune(root);
        debug!(removed, "pruned consumed definitions");
    }
    Ok(resolution.value)
}

/// Dereference a whole document against itself, in place.
///
/// With pruning on, inlined shared definitions are dropped from the
/// result.
pub fn dereference(document: &mut Value, options: &RefOptions) -> Result<(), ResolveError> {
    let resolution = resolve_refs(document, document, options)?;
    let prunable = resolution.prunable();
    let mut resolved = resolution.value;
    if options.prune {
        let removed = prune_consumed(&mut resolved, &prunable);
        debug!(removed, "pruned consumed definitions");
    }
    *document = resolved;
    Ok(())
}

/// Delete each pointed-at leaf from `root`.
///
/// Pointers whose leaf is already gone are skipped. Returns the number of
/// leaves removed.
pub fn prune_consumed(root: &mut Value, consumed: &BTreeSet<String>) -> usize {
    consumed
        .iter()
        .filter(|p| pointer::remove(root, p).is_some())
        .count()
}

// --- Internal implementation ---

struct RefResolver<'a> {
    root: &'a Value,
    options: &'a RefOptions,
    in_progress: HashSet<String>,
    cache: HashMap<String, Value>,
    consumed: BTreeSet<String>,
    preserved: BTreeSet<String>,
}

impl<'a> RefResolver<'a> {
    fn new(root: &'a Value, options: &'a RefOptions) -> Self {
        Self {
            root,
            options,
            in_progress: HashSet::new(),
            cache: HashMap::new(),
            consumed: BTreeSet::new(),
            preserved: BTreeSet::new(),
        }
    }

    fn resolve_value(&mut self, value: &Value) -> Result<Value, ResolveError> {
        match Node::classify(value) {
            Node::Reference(ptr) => self.resolve_reference(ptr, value),
            Node::Mapping(map) => self.resolve_mapping(map),
            Node::Sequence(items) => items
                .iter()
                .map(|item| self.resolve_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            // Primitives pass through unchanged
            Node::Scalar(other) => Ok(other.clone()),
        }
    }

    fn resolve_mapping(&mut self, map: &Map<String, Value>) -> Result<Value, ResolveError> {
        let mut result = Map::new();
        for (key, value) in map {
            result.insert(key.clone(), self.resolve_value(value)?);
        }
        Ok(Value::Object(result))
    }

    fn resolve_reference(&mut self, ptr: &str, node: &Value) -> Result<Value, ResolveError> {
        if !pointer::is_local(ptr) {
            debug!(pointer = ptr, "leaving external reference in place");
            return Ok(node.clone());
        }

        if let Some(cached) = self.cache.get(ptr) {
            trace!(pointer = ptr, "reference cache hit");
            return Ok(cached.clone());
        }

        if self.in_progress.contains(ptr) {
            return match self.options.on_cycle {
                CyclePolicy::Error => Err(ResolveError::CircularReference {
                    pointer: ptr.to_string(),
                }),
                CyclePolicy::Preserve => {
                    debug!(pointer = ptr, "preserving circular reference");
                    self.preserved.insert(ptr.to_string());
                    Ok(node.clone())
                }
            };
        }

        self.in_progress.insert(ptr.to_string());
        let target = pointer::navigate(self.root, ptr)?;
        let resolved = self.resolve_value(target)?;
        self.in_progress.remove(ptr);

        debug!(pointer = ptr, "resolved reference");
        if self.options.is_definition(ptr) {
            self.consumed.insert(ptr.to_string());
        }
        self.cache.insert(ptr.to_string(), resolved.clone());
        Ok(resolved)
    }
}
