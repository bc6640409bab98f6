//! Lookup cache - id to display-name tables filled by listing tools.
//!
//! Each [`EntityKind`] owns one partition. A listing tool run replaces its
//! partition wholesale; entries are never merged or expired individually.
//! The cache lives as long as the engine session that owns it and is never
//! persisted.

use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use super::EntityKind;

/// Per-session cache of listing-tool output.
#[derive(Debug, Clone, Default)]
pub struct LookupCache {
    partitions: HashMap<EntityKind, Map<String, JsonValue>>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the partition for `kind` with a listing tool's raw result.
    ///
    /// Accepted shapes:
    /// - an object keyed by id (`{"t1": {"name": "Fix bug"}}` or `{"p1": "Apollo"}`)
    /// - an array of objects that carry an `id` field
    ///
    /// Anything else (including `null`) clears the partition.
    pub fn replace(&mut self, kind: &EntityKind, listing: &JsonValue) {
        let entries = match listing {
            JsonValue::Object(map) => map.clone(),
            JsonValue::Array(items) => items
                .iter()
                .filter_map(|item| {
                    let id = item.get("id")?;
                    let key = match id {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    Some((key, item.clone()))
                })
                .collect(),
            _ => Map::new(),
        };

        tracing::debug!(kind = %kind, entries = entries.len(), "Lookup cache partition replaced");
        self.partitions.insert(kind.clone(), entries);
    }

    /// Returns the raw entry cached for `id`.
    pub fn get(&self, kind: &EntityKind, id: &str) -> Option<&JsonValue> {
        self.partitions.get(kind).and_then(|entries| entries.get(id))
    }

    /// Resolves `id` to a display name.
    ///
    /// A string entry is the name itself. An object entry yields its `name`
    /// field, falling back to its JSON text. Returns `None` when the id is
    /// not cached.
    pub fn display_name(&self, kind: &EntityKind, id: &str) -> Option<String> {
        let entry = self.get(kind, id)?;
        let name = match entry {
            JsonValue::String(s) => s.clone(),
            JsonValue::Object(obj) => match obj.get("name") {
                Some(JsonValue::String(name)) => name.clone(),
                Some(other) => other.to_string(),
                None => entry.to_string(),
            },
            other => other.to_string(),
        };
        Some(name)
    }

    /// Returns a copy of one partition.
    pub fn snapshot(&self, kind: &EntityKind) -> Option<Map<String, JsonValue>> {
        self.partitions.get(kind).cloned()
    }

    /// Number of entries cached for `kind`.
    pub fn len(&self, kind: &EntityKind) -> usize {
        self.partitions.get(kind).map_or(0, Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.values().all(Map::is_empty)
    }

    pub fn clear(&mut self) {
        self.partitions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task() -> EntityKind {
        EntityKind::new("task")
    }

    #[test]
    fn object_listing_is_stored_by_key() {
        let mut cache = LookupCache::new();
        cache.replace(&task(), &json!({"t1": {"name": "Fix bug"}, "t2": {"name": "Ship"}}));

        assert_eq!(cache.len(&task()), 2);
        assert_eq!(cache.display_name(&task(), "t1").as_deref(), Some("Fix bug"));
    }

    #[test]
    fn string_entries_are_names() {
        let mut cache = LookupCache::new();
        let project = EntityKind::new("project");
        cache.replace(&project, &json!({"p1": "Apollo"}));

        assert_eq!(cache.display_name(&project, "p1").as_deref(), Some("Apollo"));
    }

    #[test]
    fn array_listing_is_keyed_by_id_field() {
        let mut cache = LookupCache::new();
        cache.replace(
            &task(),
            &json!([{"id": "t1", "name": "Fix bug"}, {"id": 7, "name": "Numbered"}, {"name": "no id"}]),
        );

        assert_eq!(cache.len(&task()), 2);
        assert_eq!(cache.display_name(&task(), "7").as_deref(), Some("Numbered"));
    }

    #[test]
    fn replace_overwrites_rather_than_merges() {
        let mut cache = LookupCache::new();
        cache.replace(&task(), &json!({"t1": {"name": "Old"}}));
        cache.replace(&task(), &json!({"t2": {"name": "New"}}));

        assert!(cache.get(&task(), "t1").is_none());
        assert_eq!(cache.display_name(&task(), "t2").as_deref(), Some("New"));
    }

    #[test]
    fn unusable_listing_clears_partition() {
        let mut cache = LookupCache::new();
        cache.replace(&task(), &json!({"t1": "x"}));
        cache.replace(&task(), &json!(null));

        assert_eq!(cache.len(&task()), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn partitions_are_independent() {
        let mut cache = LookupCache::new();
        let project = EntityKind::new("project");
        cache.replace(&task(), &json!({"x": "task x"}));
        cache.replace(&project, &json!({"x": "project x"}));

        assert_eq!(cache.display_name(&task(), "x").as_deref(), Some("task x"));
        assert_eq!(cache.display_name(&project, "x").as_deref(), Some("project x"));
    }

    #[test]
    fn object_without_name_falls_back_to_json() {
        let mut cache = LookupCache::new();
        cache.replace(&task(), &json!({"t1": {"title": "Untitled"}}));

        assert_eq!(
            cache.display_name(&task(), "t1").as_deref(),
            Some(r#"{"title":"Untitled"}"#)
        );
    }

    #[test]
    fn unknown_id_has_no_name() {
        let cache = LookupCache::new();
        assert!(cache.display_name(&task(), "missing").is_none());
    }
}
