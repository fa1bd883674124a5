use super::meta_tags::MetaTags;
use super::schema::map_recipe;
use super::{Extractor, ParsingContext};
use crate::config::ExtractorSettings;
use crate::model::ExtractedRecipe;
use log::{debug, warn};
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static JSON_LD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("Invalid JSON-LD selector")
});

/// Fields searched before the generic pass, in priority order.
const GRAPH: &str = "@graph";
const MAIN_ENTITY: &str = "mainEntity";
const MAIN_ENTITY_OF_PAGE: &str = "mainEntityOfPage";
const ITEM_LIST: &str = "itemListElement";

/// Extracts recipes from embedded JSON-LD blocks.
pub struct JsonLdExtractor {
    settings: ExtractorSettings,
}

impl JsonLdExtractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }
}

impl Default for JsonLdExtractor {
    fn default() -> Self {
        Self::new(ExtractorSettings::default())
    }
}

impl Extractor for JsonLdExtractor {
    fn name(&self) -> &'static str {
        "json_ld"
    }

    fn parse(&self, context: &ParsingContext) -> Option<ExtractedRecipe> {
        let trees = json_ld_trees(context.document);
        debug!("JsonLdExtractor: parsed {} JSON-LD trees", trees.len());

        for (index, tree) in trees.iter().enumerate() {
            let Some(node) = find_recipe_node(tree) else {
                debug!("JsonLdExtractor: no Recipe in tree {}", index);
                continue;
            };

            debug!("JsonLdExtractor: found Recipe in tree {}", index);
            // The first located Recipe decides the outcome for this source.
            let mut recipe = map_recipe(node, context.url, &self.settings)?;
            let meta = MetaTags::new(context.document);
            recipe.site_name = meta.site_name();
            if recipe.language.is_none() {
                recipe.language = meta.language();
            }
            return Some(recipe);
        }

        None
    }
}

/// Parse every JSON-LD script block in source order, skipping the ones that
/// are not valid JSON even after repair.
pub(crate) fn json_ld_trees(document: &Html) -> Vec<Value> {
    document
        .select(&JSON_LD_SELECTOR)
        .enumerate()
        .filter_map(|(index, script)| {
            let raw = script.text().collect::<String>();
            parse_block(&raw).or_else(|| {
                warn!("Skipping malformed JSON-LD block {}", index);
                None
            })
        })
        .collect()
}

fn parse_block(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("JSON-LD parse failed ({}), retrying after repair", e);
            serde_json::from_str::<Value>(&escape_control_chars(trimmed)).ok()
        }
    }
}

/// Some sites emit literal newlines and tabs inside JSON strings.
fn escape_control_chars(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
                result.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    result.push(c);
                }
                '"' => {
                    in_string = false;
                    result.push(c);
                }
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                c if c.is_control() => {}
                _ => result.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            result.push(c);
        }
    }

    result
}

/// Depth-first search of one JSON-LD tree for a Recipe object.
pub(crate) fn find_recipe_node(tree: &Value) -> Option<&Value> {
    RecipeLocator::new(tree).search(tree)
}

/// One traversal's state: the tree's `@id` definitions and the objects
/// already entered.
struct RecipeLocator<'a> {
    definitions: HashMap<&'a str, &'a Value>,
    visited: HashSet<*const Value>,
}

impl<'a> RecipeLocator<'a> {
    fn new(tree: &'a Value) -> Self {
        let mut definitions = HashMap::new();
        collect_definitions(tree, &mut definitions);
        Self {
            definitions,
            visited: HashSet::new(),
        }
    }

    fn search(&mut self, value: &'a Value) -> Option<&'a Value> {
        match value {
            Value::Array(items) => items.iter().find_map(|item| self.search(item)),
            Value::Object(_) => self.search_object(value),
            _ => None,
        }
    }

    fn search_object(&mut self, value: &'a Value) -> Option<&'a Value> {
        let node = self.resolve(value);
        let Value::Object(map) = node else {
            return None;
        };

        if !self.visited.insert(node as *const Value) {
            return None;
        }

        if is_recipe_type(node) {
            return Some(node);
        }

        if let Some(found) = map.get(GRAPH).and_then(|graph| self.search(graph)) {
            return Some(found);
        }

        let main_entity_key = [MAIN_ENTITY, MAIN_ENTITY_OF_PAGE]
            .into_iter()
            .find(|key| map.get(*key).is_some_and(|v| !v.is_null()));
        if let Some(key) = main_entity_key {
            if let Some(found) = self.search(&map[key]) {
                return Some(found);
            }
        }

        if let Some(found) = map.get(ITEM_LIST).and_then(|list| self.search(list)) {
            return Some(found);
        }

        map.iter()
            .filter(|(key, _)| {
                let key = key.as_str();
                key != GRAPH && key != ITEM_LIST && Some(key) != main_entity_key
            })
            .find_map(|(_, child)| self.search(child))
    }

    /// A lone `{"@id": ...}` object is a reference to a node defined
    /// elsewhere in the same tree.
    fn resolve(&self, value: &'a Value) -> &'a Value {
        match reference_id(value) {
            Some(id) => self.definitions.get(id).copied().unwrap_or(value),
            None => value,
        }
    }
}

fn reference_id(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get("@id")?.as_str()
}

fn collect_definitions<'a>(value: &'a Value, definitions: &mut HashMap<&'a str, &'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_definitions(item, definitions);
            }
        }
        Value::Object(map) => {
            if map.len() > 1 {
                if let Some(id) = map.get("@id").and_then(Value::as_str) {
                    definitions.entry(id).or_insert(value);
                }
            }
            for child in map.values() {
                collect_definitions(child, definitions);
            }
        }
        _ => {}
    }
}

fn is_recipe_type(value: &Value) -> bool {
    let is_recipe = |v: &Value| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case("recipe"));
    match value.get("@type") {
        Some(Value::Array(types)) => types.iter().any(is_recipe),
        Some(other) => is_recipe(other),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_html_document(json_ld: &str) -> Html {
        let html = format!(
            r#"
            <!DOCTYPE html>
            <html>
            <head>
                <script type="application/ld+json">
                    {json_ld}
                </script>
            </head>
            <body></body>
            </html>
            "#
        );
        Html::parse_document(&html)
    }

    #[test]
    fn test_finds_root_recipe() {
        let tree = json!({"@type": "Recipe", "name": "Tacos"});
        assert_eq!(find_recipe_node(&tree).unwrap()["name"], "Tacos");
    }

    #[test]
    fn test_type_array_and_lowercase() {
        let tree = json!({"@type": ["Thing", "recipe"], "name": "Soup"});
        assert_eq!(find_recipe_node(&tree).unwrap()["name"], "Soup");
    }

    #[test]
    fn test_graph_searched_before_other_fields() {
        let tree = json!({
            "@type": "WebPage",
            "about": {"@type": "Recipe", "name": "From about"},
            "@graph": [
                {"@type": "Organization", "name": "Site"},
                {"@type": "Recipe", "name": "From graph"}
            ]
        });
        assert_eq!(find_recipe_node(&tree).unwrap()["name"], "From graph");
    }

    #[test]
    fn test_main_entity_before_item_list() {
        let tree = json!({
            "@type": "WebPage",
            "itemListElement": [{"@type": "Recipe", "name": "Listed"}],
            "mainEntity": {"@type": "Recipe", "name": "Main"}
        });
        assert_eq!(find_recipe_node(&tree).unwrap()["name"], "Main");
    }

    #[test]
    fn test_main_entity_of_page_used_when_main_entity_absent() {
        let tree = json!({
            "@type": "WebPage",
            "mainEntityOfPage": {"@type": "Recipe", "name": "Page entity"}
        });
        assert_eq!(find_recipe_node(&tree).unwrap()["name"], "Page entity");
    }

    #[test]
    fn test_generic_fallback_in_insertion_order() {
        let tree = json!({
            "@type": "Article",
            "zeta": {"nested": {"@type": "Recipe", "name": "First"}},
            "alpha": {"@type": "Recipe", "name": "Second"}
        });
        assert_eq!(find_recipe_node(&tree).unwrap()["name"], "First");
    }

    #[test]
    fn test_reference_resolved_to_definition() {
        let tree = json!({
            "@graph": [
                {"@type": "WebPage", "@id": "#page", "mainEntity": {"@id": "#recipe"}},
                {"@type": "Recipe", "@id": "#recipe", "name": "Referenced"}
            ]
        });
        assert_eq!(find_recipe_node(&tree).unwrap()["name"], "Referenced");
    }

    #[test]
    fn test_cycle_without_recipe_terminates() {
        let tree = json!({
            "@graph": [
                {"@type": "WebPage", "@id": "#page", "mainEntity": {"@id": "#article"}},
                {"@type": "Article", "@id": "#article", "isPartOf": {"@id": "#page"}}
            ]
        });
        assert!(find_recipe_node(&tree).is_none());
    }

    #[test]
    fn test_cycle_with_recipe_found() {
        let tree = json!({
            "@graph": [
                {"@type": "WebPage", "@id": "#page", "hasPart": {"@id": "#article"}},
                {"@type": "Article", "@id": "#article", "isPartOf": {"@id": "#page"},
                 "about": {"@type": "Recipe", "name": "Cyclic"}}
            ]
        });
        assert_eq!(find_recipe_node(&tree).unwrap()["name"], "Cyclic");
    }

    #[test]
    fn test_scalar_tree_has_no_recipe() {
        assert!(find_recipe_node(&json!("Recipe")).is_none());
        assert!(find_recipe_node(&json!(null)).is_none());
    }

    #[test]
    fn test_json_ld_trees_skips_malformed_blocks() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">{ not json at all </script>
            <script type="application/ld+json">{"@type": "Recipe", "name": "Good"}</script>
            </head><body></body></html>
        "#;
        let trees = json_ld_trees(&Html::parse_document(html));
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0]["name"], "Good");
    }

    #[test]
    fn test_literal_newlines_in_strings_are_repaired() {
        let document = create_html_document(
            "{\"@type\": \"Recipe\", \"name\": \"Tacos\", \"recipeInstructions\": \"Cook.\nServe.\"}",
        );
        let trees = json_ld_trees(&document);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0]["recipeInstructions"], "Cook.\nServe.");
    }

    #[test]
    fn test_parse_fails_for_nameless_recipe() {
        let document = create_html_document(
            r#"{"@type": "Recipe", "recipeIngredient": ["1 egg"], "recipeInstructions": "Boil."}"#,
        );
        let context = ParsingContext {
            url: "https://example.com",
            document: &document,
        };
        assert!(JsonLdExtractor::default().parse(&context).is_none());
    }

    #[test]
    fn test_parse_without_json_ld_returns_none() {
        let document = Html::parse_document("<html><body>Test</body></html>");
        let context = ParsingContext {
            url: "http://example.com",
            document: &document,
        };
        assert!(JsonLdExtractor::default().parse(&context).is_none());
    }

    #[test]
    fn test_site_name_and_language_from_page() {
        let html = r#"
            <html lang="en-GB">
            <head>
                <meta property="og:site_name" content="Good Food">
                <script type="application/ld+json">
                {"@type": "Recipe", "name": "Scones", "recipeIngredient": ["flour"]}
                </script>
                <script type="application/ld+json">
                {"@type": "Recipe", "name": "Gazpacho", "inLanguage": "es", "recipeIngredient": ["tomato"]}
                </script>
            </head>
            <body></body>
            </html>
        "#;
        let document = Html::parse_document(html);
        let context = ParsingContext {
            url: "https://example.com",
            document: &document,
        };

        let recipe = JsonLdExtractor::default().parse(&context).unwrap();
        assert_eq!(recipe.name, "Scones");
        assert_eq!(recipe.site_name, Some("Good Food".to_string()));
        assert_eq!(recipe.language, Some("en-GB".to_string()));
    }

    #[test]
    fn test_declared_language_wins_over_page() {
        let document = create_html_document(
            r#"{"@type": "Recipe", "name": "Gazpacho", "inLanguage": "es", "recipeIngredient": ["tomato"]}"#,
        );
        let context = ParsingContext {
            url: "https://example.com",
            document: &document,
        };

        let recipe = JsonLdExtractor::default().parse(&context).unwrap();
        assert_eq!(recipe.language, Some("es".to_string()));
        assert_eq!(recipe.site_name, None);
    }
}
