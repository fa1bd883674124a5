use super::element_text;
use log::debug;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Class substrings tried for each list field, in order.
pub(crate) const INGREDIENT_PATTERNS: &[&str] = &["ingredient"];
pub(crate) const INSTRUCTION_PATTERNS: &[&str] = &["instruction", "direction"];

/// Section headers that recipe plugins render as list entries.
const SECTION_HEADERS: &[&str] = &["ingredients", "instructions", "directions", "steps"];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

static LIST_ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("Invalid selector"));

static PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("Invalid selector"));

/// Items of the first pattern whose `[class*=pattern]` containers under
/// `scope` yield any entries.
pub(crate) fn class_list_items(scope: ElementRef, patterns: &[&str]) -> Vec<String> {
    for pattern in patterns {
        let items = items_for_pattern(scope, pattern);
        if !items.is_empty() {
            debug!("Found {} items using class pattern: {}", items.len(), pattern);
            return items;
        }
    }
    Vec::new()
}

fn items_for_pattern(scope: ElementRef, pattern: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(&format!(r#"[class*="{pattern}"]"#)) else {
        return Vec::new();
    };

    let matched: Vec<ElementRef> = scope
        .select(&selector)
        .filter(|element| !is_heading(*element) && !inside_heading(*element, scope))
        .collect();
    let matched_ids: HashSet<_> = matched.iter().map(|element| element.id()).collect();

    // Only the outermost matches: a container and its matching children
    // would otherwise contribute the same text twice.
    let outermost = matched.into_iter().filter(|element| {
        !element
            .ancestors()
            .take_while(|ancestor| ancestor.id() != scope.id())
            .any(|ancestor| matched_ids.contains(&ancestor.id()))
    });

    let mut items = Vec::new();
    for container in outermost {
        items.extend(container_items(container));
    }

    items
        .into_iter()
        .filter(|item| !item.is_empty() && !is_section_header(item))
        .collect()
}

/// List items, else paragraphs, else the container's own text.
fn container_items(container: ElementRef) -> Vec<String> {
    let list_items: Vec<String> = container
        .select(&LIST_ITEM_SELECTOR)
        .filter(|li| li.select(&LIST_ITEM_SELECTOR).next().is_none())
        .filter(|li| !inside_heading(*li, container))
        .map(element_text)
        .collect();
    if !list_items.is_empty() {
        return list_items;
    }

    let paragraphs: Vec<String> = container
        .select(&PARAGRAPH_SELECTOR)
        .filter(|p| !inside_heading(*p, container))
        .map(element_text)
        .collect();
    if !paragraphs.is_empty() {
        return paragraphs;
    }

    let text = element_text(container);
    if text.len() < 500 {
        vec![text]
    } else {
        Vec::new()
    }
}

fn is_heading(element: ElementRef) -> bool {
    HEADINGS.contains(&element.value().name())
}

fn inside_heading(element: ElementRef, scope: ElementRef) -> bool {
    element
        .ancestors()
        .take_while(|ancestor| ancestor.id() != scope.id())
        .filter_map(ElementRef::wrap)
        .any(is_heading)
}

fn is_section_header(text: &str) -> bool {
    let text = text.trim().trim_end_matches(':').trim();
    SECTION_HEADERS
        .iter()
        .any(|header| text.eq_ignore_ascii_case(header))
}
