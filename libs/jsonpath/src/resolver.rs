//! Scoped navigation over a template document
//!
//! A [`PathResolver`] is a read-only view of one node of a document together with the
//! location that reached it. Resolving a relative path or a resource type yields new,
//! narrower resolvers; nothing is ever mutated, so two resolvers over the same node are
//! interchangeable.
//!
//! The evaluation engine only sees the [`PathResolver`] capability. [`JsonPathResolver`]
//! is the implementation over `serde_json::Value`.

use crate::path::{append_index, append_property, JsonPath, Segment};
use serde_json::{Map, Value};

/// Property holding a template's resource collection
pub const RESOURCES_PROPERTY: &str = "resources";

/// Property holding a resource's type discriminator
pub const TYPE_PROPERTY: &str = "type";

/// Navigation capability the evaluation engine depends on.
pub trait PathResolver {
    /// Location of the current node relative to the document root (`""` for the root).
    fn path(&self) -> &str;

    /// The current node.
    fn node(&self) -> &Value;

    /// Resolve `path` relative to the current node.
    ///
    /// Returns one resolver per node reached, in document order. An empty result means
    /// the path does not exist in this scope; it is never an error.
    fn resolve(&self, path: &JsonPath) -> Vec<Box<dyn PathResolver + '_>>;

    /// Narrow to the resources under the current node whose type equals `resource_type`
    /// (ASCII case-insensitive). Returns an empty result when none match.
    fn resolve_resource_type(&self, resource_type: &str) -> Vec<Box<dyn PathResolver + '_>>;
}

/// [`PathResolver`] over a parsed JSON document
#[derive(Debug, Clone)]
pub struct JsonPathResolver<'a> {
    node: &'a Value,
    path: String,
}

impl<'a> JsonPathResolver<'a> {
    /// Create a resolver scoped to the document root.
    pub fn new(root: &'a Value) -> Self {
        Self {
            node: root,
            path: String::new(),
        }
    }

    fn scoped(node: &'a Value, path: String) -> Self {
        Self { node, path }
    }

    /// Concrete form of [`PathResolver::resolve`].
    pub fn resolve_all(&self, path: &JsonPath) -> Vec<JsonPathResolver<'a>> {
        let mut frontier = vec![self.clone()];

        for segment in path.segments() {
            let mut next = Vec::with_capacity(frontier.len());
            for scope in &frontier {
                scope.step(segment, &mut next);
            }
            if next.is_empty() {
                tracing::trace!(scope = %self.path, path = %path, "path did not resolve");
                return next;
            }
            frontier = next;
        }

        frontier
    }

    fn step(&self, segment: &Segment, out: &mut Vec<JsonPathResolver<'a>>) {
        match (segment, self.node) {
            (Segment::Property(name), Value::Object(map)) => {
                if let Some((key, value)) = lookup_property(map, name) {
                    out.push(Self::scoped(value, append_property(&self.path, key)));
                }
            }
            (Segment::Wildcard, Value::Object(map)) => {
                out.extend(
                    map.iter()
                        .map(|(key, value)| Self::scoped(value, append_property(&self.path, key))),
                );
            }
            (Segment::Wildcard | Segment::AnyIndex, Value::Array(items)) => {
                out.extend(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| Self::scoped(item, append_index(&self.path, i))),
                );
            }
            (Segment::Index(index), Value::Array(items)) => {
                if let Some(item) = items.get(*index) {
                    out.push(Self::scoped(item, append_index(&self.path, *index)));
                }
            }
            _ => {}
        }
    }

    /// Concrete form of [`PathResolver::resolve_resource_type`].
    ///
    /// Child resources declared inside a resource's own `resources` array are included.
    /// A child whose declared type has no namespace is matched on its full type, i.e.
    /// `Microsoft.Sql/servers` + `databases` → `Microsoft.Sql/servers/databases`.
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<JsonPathResolver<'a>> {
        let mut matches = Vec::new();
        collect_resources(self.node, &self.path, None, resource_type, &mut matches);
        tracing::trace!(
            scope = %self.path,
            resource_type,
            matches = matches.len(),
            "resolved resource type"
        );
        matches
    }
}

impl PathResolver for JsonPathResolver<'_> {
    fn path(&self) -> &str {
        &self.path
    }

    fn node(&self) -> &Value {
        self.node
    }

    fn resolve(&self, path: &JsonPath) -> Vec<Box<dyn PathResolver + '_>> {
        self.resolve_all(path)
            .into_iter()
            .map(|r| Box::new(r) as Box<dyn PathResolver + '_>)
            .collect()
    }

    fn resolve_resource_type(&self, resource_type: &str) -> Vec<Box<dyn PathResolver + '_>> {
        self.resources_of_type(resource_type)
            .into_iter()
            .map(|r| Box::new(r) as Box<dyn PathResolver + '_>)
            .collect()
    }
}

/// Find a property by exact name, falling back to an ASCII case-insensitive match.
pub(crate) fn lookup_property<'m>(
    map: &'m Map<String, Value>,
    name: &str,
) -> Option<(&'m String, &'m Value)> {
    map.get_key_value(name)
        .or_else(|| map.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)))
}

fn collect_resources<'a>(
    node: &'a Value,
    path: &str,
    parent_type: Option<&str>,
    target: &str,
    out: &mut Vec<JsonPathResolver<'a>>,
) {
    let Some(map) = node.as_object() else {
        return;
    };
    let Some((key, Value::Array(resources))) = lookup_property(map, RESOURCES_PROPERTY) else {
        return;
    };
    let collection_path = append_property(path, key);

    for (i, resource) in resources.iter().enumerate() {
        let declared = resource
            .as_object()
            .and_then(|r| lookup_property(r, TYPE_PROPERTY))
            .and_then(|(_, t)| t.as_str());
        let Some(declared) = declared else {
            continue;
        };

        let full_type = qualify_type(parent_type, declared);
        let resource_path = append_index(&collection_path, i);

        if full_type.eq_ignore_ascii_case(target) {
            out.push(JsonPathResolver::scoped(resource, resource_path.clone()));
        }

        collect_resources(resource, &resource_path, Some(&full_type), target, out);
    }
}

fn qualify_type(parent_type: Option<&str>, declared: &str) -> String {
    let namespaced = declared
        .split('/')
        .next()
        .is_some_and(|first| first.contains('.'));

    match parent_type {
        Some(parent) if !namespaced => format!("{}/{}", parent, declared),
        _ => declared.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve<'a>(root: &'a Value, path: &str) -> Vec<(String, &'a Value)> {
        JsonPathResolver::new(root)
            .resolve_all(&JsonPath::parse(path).unwrap())
            .into_iter()
            .map(|r| (r.path.clone(), r.node))
            .collect()
    }

    fn template() -> Value {
        json!({
            "resources": [
                {
                    "type": "Microsoft.Web/sites",
                    "name": "site-a",
                    "properties": { "httpsOnly": true }
                },
                {
                    "type": "Microsoft.Sql/servers",
                    "name": "sql",
                    "resources": [
                        { "type": "databases", "name": "db1" },
                        { "type": "Microsoft.Sql/servers/firewallRules", "name": "fw" }
                    ]
                },
                {
                    "type": "microsoft.web/SITES",
                    "name": "site-b",
                    "properties": {}
                },
                { "name": "untyped" }
            ]
        })
    }

    #[test]
    fn test_resolve_property_chain() {
        let doc = json!({ "a": { "b": { "c": 1 } } });
        let resolved = resolve(&doc, "a.b.c");
        assert_eq!(resolved, vec![("a.b.c".to_string(), &json!(1))]);
    }

    #[test]
    fn test_resolve_is_case_insensitive_and_reports_actual_names() {
        let doc = json!({ "Properties": { "HttpsOnly": false } });
        let resolved = resolve(&doc, "properties.httpsOnly");
        assert_eq!(resolved, vec![("Properties.HttpsOnly".to_string(), &json!(false))]);
    }

    #[test]
    fn test_resolve_prefers_exact_match() {
        let doc = json!({ "name": 1, "Name": 2 });
        assert_eq!(resolve(&doc, "Name")[0].1, &json!(2));
        assert_eq!(resolve(&doc, "name")[0].1, &json!(1));
    }

    #[test]
    fn test_resolve_missing_yields_empty() {
        let doc = json!({ "a": { "b": 1 } });
        assert!(resolve(&doc, "a.x").is_empty());
        assert!(resolve(&doc, "a.b.c").is_empty());
        assert!(resolve(&doc, "a[0]").is_empty());
    }

    #[test]
    fn test_resolve_wildcard_fans_out_in_order() {
        let doc = json!({ "rules": [ { "access": "Allow" }, { "access": "Deny" }, {} ] });
        let resolved = resolve(&doc, "rules[*].access");
        assert_eq!(
            resolved,
            vec![
                ("rules[0].access".to_string(), &json!("Allow")),
                ("rules[1].access".to_string(), &json!("Deny")),
            ]
        );
    }

    #[test]
    fn test_resolve_index_and_out_of_range() {
        let doc = json!({ "items": [10, 20, 30] });
        assert_eq!(resolve(&doc, "items[2]"), vec![("items[2]".to_string(), &json!(30))]);
        assert!(resolve(&doc, "items[3]").is_empty());
    }

    #[test]
    fn test_resolve_object_wildcard() {
        let doc = json!({ "tags": { "env": "prod", "owner": "ops" } });
        let paths: Vec<String> = resolve(&doc, "tags.*").into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["tags.env", "tags.owner"]);
    }

    #[test]
    fn test_resolve_quoted_names() {
        let doc = json!({ "tags": { "a.b": 1 } });
        assert_eq!(resolve(&doc, "tags['a.b']"), vec![("tags['a.b']".to_string(), &json!(1))]);
    }

    #[test]
    fn test_resolve_empty_path_is_current_scope() {
        let doc = json!({ "a": 1 });
        assert_eq!(resolve(&doc, ""), vec![(String::new(), &doc)]);
    }

    #[test]
    fn test_resources_of_type_matches_case_insensitively() {
        let doc = template();
        let root = JsonPathResolver::new(&doc);
        let sites: Vec<String> = root
            .resources_of_type("Microsoft.Web/sites")
            .into_iter()
            .map(|r| r.path)
            .collect();
        assert_eq!(sites, vec!["resources[0]", "resources[2]"]);
    }

    #[test]
    fn test_resources_of_type_includes_child_resources() {
        let doc = template();
        let root = JsonPathResolver::new(&doc);

        let dbs = root.resources_of_type("Microsoft.Sql/servers/databases");
        assert_eq!(dbs.len(), 1);
        assert_eq!(dbs[0].path, "resources[1].resources[0]");
        assert_eq!(dbs[0].node["name"], "db1");

        let rules = root.resources_of_type("Microsoft.Sql/servers/firewallRules");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].path, "resources[1].resources[1]");
    }

    #[test]
    fn test_resources_of_type_without_matches() {
        let doc = template();
        let root = JsonPathResolver::new(&doc);
        assert!(root.resources_of_type("Microsoft.Storage/storageAccounts").is_empty());

        let scalar = json!(42);
        assert!(JsonPathResolver::new(&scalar).resources_of_type("x").is_empty());
    }

    #[test]
    fn test_scoped_resolution_keeps_absolute_paths() {
        let doc = template();
        let root = JsonPathResolver::new(&doc);
        let site = &root.resources_of_type("Microsoft.Web/sites")[0];
        let https = site.resolve(&JsonPath::parse("properties.httpsOnly").unwrap());
        assert_eq!(https.len(), 1);
        assert_eq!(https[0].path(), "resources[0].properties.httpsOnly");
        assert_eq!(https[0].node(), &json!(true));
    }
}
