use super::element_text;
use crate::text::{clean_text, parse_iso_duration_to_minutes};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static RECIPE_CONTAINER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"[itemtype="http://schema.org/Recipe"], [itemtype="https://schema.org/Recipe"]"#,
    )
    .expect("Invalid selector")
});

static LIST_ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("Invalid selector"));

/// Where itemprop lookups run: a Recipe container, or the whole page.
#[derive(Clone, Copy)]
pub(crate) struct MicrodataScope<'a> {
    root: ElementRef<'a>,
    scoped: bool,
}

impl<'a> MicrodataScope<'a> {
    pub(crate) fn for_document(document: &'a Html) -> Self {
        match document.select(&RECIPE_CONTAINER_SELECTOR).next() {
            Some(container) => Self {
                root: container,
                scoped: true,
            },
            None => Self {
                root: document.root_element(),
                scoped: false,
            },
        }
    }

    pub(crate) fn root(&self) -> ElementRef<'a> {
        self.root
    }

    pub(crate) fn has_container(&self) -> bool {
        self.scoped
    }

    /// Elements carrying `prop` that belong to the recipe itself rather than
    /// to an item nested inside it (such as the author's Person).
    fn props(&self, prop: &str) -> Vec<ElementRef<'a>> {
        let Ok(selector) = Selector::parse(&format!(r#"[itemprop~="{prop}"]"#)) else {
            return Vec::new();
        };
        self.root
            .select(&selector)
            .filter(|element| !self.scoped || self.owns(*element))
            .collect()
    }

    fn owns(&self, element: ElementRef) -> bool {
        for ancestor in element.ancestors() {
            if ancestor.id() == self.root.id() {
                return true;
            }
            if ancestor
                .value()
                .as_element()
                .is_some_and(|el| el.attr("itemscope").is_some())
            {
                return false;
            }
        }
        true
    }

    /// First non-empty value of `prop`, reading `content` before text.
    pub(crate) fn text(&self, prop: &str) -> Option<String> {
        self.props(prop)
            .into_iter()
            .map(attr_or_text(&["content"]))
            .find(|text| !text.is_empty())
    }

    /// Every non-empty value of `prop`, in document order.
    pub(crate) fn texts(&self, prop: &str) -> Vec<String> {
        self.props(prop)
            .into_iter()
            .map(attr_or_text(&["content"]))
            .filter(|text| !text.is_empty())
            .collect()
    }

    pub(crate) fn image(&self) -> Option<String> {
        self.props("image").into_iter().find_map(|element| {
            ["src", "content", "href"]
                .iter()
                .find_map(|attr| element.value().attr(attr))
                .map(clean_text)
                .filter(|url| !url.is_empty())
        })
    }

    /// The author's nested `name` when present, else the author element's text.
    pub(crate) fn author(&self) -> Option<String> {
        let name_selector = Selector::parse(r#"[itemprop~="name"]"#).ok()?;
        self.props("author").into_iter().find_map(|author| {
            let target = author.select(&name_selector).next().unwrap_or(author);
            let text = attr_or_text(&["content"])(target);
            (!text.is_empty()).then_some(text)
        })
    }

    pub(crate) fn duration(&self, prop: &str) -> Option<u32> {
        self.props(prop)
            .into_iter()
            .map(attr_or_text(&["datetime", "content"]))
            .find_map(|value| parse_iso_duration_to_minutes(&value))
    }

    pub(crate) fn ingredients(&self) -> Vec<String> {
        let ingredients = self.texts("recipeIngredient");
        if ingredients.is_empty() {
            self.texts("ingredients")
        } else {
            ingredients
        }
    }

    /// Steps from `recipeInstructions` (or the legacy `instructions`). Nested
    /// `text` properties win, one step each; otherwise an element holding a
    /// list contributes one step per list item.
    pub(crate) fn instructions(&self) -> Vec<String> {
        let mut elements = self.props("recipeInstructions");
        if elements.is_empty() {
            elements = self.props("instructions");
        }

        let Ok(text_selector) = Selector::parse(r#"[itemprop~="text"]"#) else {
            return Vec::new();
        };

        let mut steps = Vec::new();
        for element in elements {
            let texts: Vec<String> = element
                .select(&text_selector)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect();
            if !texts.is_empty() {
                steps.extend(texts);
                continue;
            }

            let items: Vec<String> = element
                .select(&LIST_ITEM_SELECTOR)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect();
            if items.is_empty() {
                steps.push(element_text(element));
            } else {
                steps.extend(items);
            }
        }

        steps.retain(|step| !step.is_empty());
        steps
    }
}

/// Read the first present attribute of `attrs`, falling back to the text.
fn attr_or_text<'s>(attrs: &'s [&'s str]) -> impl Fn(ElementRef) -> String + 's {
    move |element| {
        attrs
            .iter()
            .find_map(|attr| element.value().attr(attr))
            .map(clean_text)
            .unwrap_or_else(|| element_text(element))
    }
}
