//! Maps a located schema.org Recipe object onto [`ExtractedRecipe`].
//!
//! Each field that sites encode in more than one shape gets its own untagged
//! enum. Every enum ends in a catch-all variant so that an unexpected shape
//! decodes to "absent" instead of failing the whole record.

use crate::config::ExtractorSettings;
use crate::model::{ExtractedRecipe, ExtractionMethod};
use crate::text::{
    clean_text, clean_title_with, filter_editorial_notes, normalize_ingredient_text,
    parse_iso_duration_to_minutes,
};
use log::debug;
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// JSON-LD field names that sometimes leak into instruction lists as text.
const FIELD_NAME_STEPS: &[&str] = &[
    "@type",
    "type",
    "text",
    "url",
    "name",
    "image",
    "video",
    "howtostep",
    "howto",
    "howtosection",
    "itemlistelement",
    "@context",
    "position",
];

#[derive(Debug, Deserialize)]
struct SchemaRecipe {
    name: Option<TextField>,
    author: Option<NamedField>,
    publisher: Option<NamedField>,
    image: Option<ImageField>,
    #[serde(rename = "recipeIngredient")]
    recipe_ingredient: Option<TextField>,
    #[serde(rename = "recipeInstructions")]
    recipe_instructions: Option<InstructionsField>,
    #[serde(rename = "totalTime")]
    total_time: Option<TextField>,
    #[serde(rename = "prepTime")]
    prep_time: Option<TextField>,
    #[serde(rename = "cookTime")]
    cook_time: Option<TextField>,
    #[serde(rename = "recipeYield")]
    recipe_yield: Option<YieldField>,
    description: Option<TextField>,
    #[serde(rename = "recipeCuisine")]
    recipe_cuisine: Option<TextField>,
    #[serde(rename = "recipeCategory")]
    recipe_category: Option<TextField>,
    keywords: Option<TextField>,
    url: Option<TextField>,
    #[serde(rename = "aggregateRating")]
    aggregate_rating: Option<RatingField>,
    tool: Option<NamedField>,
    nutrition: Option<NutritionField>,
    #[serde(rename = "suitableForDiet")]
    suitable_for_diet: Option<TextField>,
    #[serde(rename = "cookingMethod")]
    cooking_method: Option<TextField>,
    #[serde(rename = "inLanguage")]
    in_language: Option<TextField>,
}

// Sequence variants come before struct variants throughout: serde lets a
// struct deserialize from a sequence positionally.

/// A bare string or a list of (mostly) strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextField {
    Text(String),
    Multiple(Vec<TextEntry>),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextEntry {
    Text(String),
    Other(IgnoredAny),
}

impl TextField {
    fn as_text(&self) -> Option<&str> {
        match self {
            TextField::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The string itself, or the first element of a list when it is a string.
    fn first(&self) -> Option<&str> {
        match self {
            TextField::Text(text) => Some(text),
            TextField::Multiple(entries) => match entries.first() {
                Some(TextEntry::Text(text)) => Some(text),
                _ => None,
            },
            TextField::Other(_) => None,
        }
    }

    /// Every string, a bare string counting as a single-element list.
    fn all(&self) -> Vec<&str> {
        match self {
            TextField::Text(text) => vec![text],
            TextField::Multiple(entries) => entries
                .iter()
                .filter_map(|entry| match entry {
                    TextEntry::Text(text) => Some(text.as_str()),
                    TextEntry::Other(_) => None,
                })
                .collect(),
            TextField::Other(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NamedField {
    Name(String),
    Multiple(Vec<NamedField>),
    Object(NamedObject),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct NamedObject {
    name: Option<String>,
}

impl NamedField {
    fn name(&self) -> Option<&str> {
        match self {
            NamedField::Multiple(authors) => authors.first().and_then(NamedField::direct_name),
            other => other.direct_name(),
        }
    }

    fn direct_name(&self) -> Option<&str> {
        match self {
            NamedField::Name(name) => Some(name),
            NamedField::Object(object) => object.name.as_deref(),
            _ => None,
        }
    }

    /// Every name, a single value counting as a one-element list.
    fn names(&self) -> Vec<&str> {
        match self {
            NamedField::Multiple(entries) => {
                entries.iter().filter_map(NamedField::direct_name).collect()
            }
            other => other.direct_name().into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RatingField {
    Multiple(Vec<RatingObject>),
    Object(RatingObject),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct RatingObject {
    #[serde(rename = "ratingValue")]
    rating_value: Option<Numeric>,
    #[serde(rename = "ratingCount")]
    rating_count: Option<Numeric>,
    #[serde(rename = "reviewCount")]
    review_count: Option<Numeric>,
}

impl RatingField {
    fn rating(&self) -> Option<&RatingObject> {
        match self {
            RatingField::Multiple(ratings) => ratings.first(),
            RatingField::Object(rating) => Some(rating),
            RatingField::Other(_) => None,
        }
    }
}

impl RatingObject {
    fn value(&self) -> Option<f64> {
        let value = self.rating_value.as_ref()?.value()?;
        value
            .is_finite()
            .then(|| (value * 100.0).round() / 100.0)
    }

    /// `ratingCount`, else `reviewCount`.
    fn count(&self) -> Option<u32> {
        let count = self
            .rating_count
            .as_ref()
            .and_then(Numeric::value)
            .or_else(|| self.review_count.as_ref().and_then(Numeric::value))?;
        (0.0..=f64::from(u32::MAX))
            .contains(&count)
            .then(|| count as u32)
    }
}

/// A NutritionInformation object; `@`-prefixed keys are metadata.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NutritionField {
    Facts(serde_json::Map<String, Value>),
    Other(IgnoredAny),
}

impl NutritionField {
    fn facts(&self) -> BTreeMap<String, String> {
        let NutritionField::Facts(map) = self else {
            return BTreeMap::new();
        };
        map.iter()
            .filter(|(key, _)| !key.starts_with('@'))
            .filter_map(|(key, value)| {
                let value = match ScalarEntry::deserialize(value).ok()? {
                    ScalarEntry::Text(text) => clean_text(&text),
                    ScalarEntry::Number(n) => n.to_string(),
                    ScalarEntry::Other(_) => return None,
                };
                (!value.is_empty()).then(|| (key.clone(), value))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageField {
    Url(String),
    Multiple(Vec<ImageEntry>),
    Object(ImageObject),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageEntry {
    Url(String),
    Object(ImageObject),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: Option<String>,
    width: Option<Numeric>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Numeric {
    fn value(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(text) => text.trim().trim_end_matches("px").parse().ok(),
            Numeric::Other(_) => None,
        }
    }
}

impl ImageEntry {
    fn url(&self) -> Option<&str> {
        match self {
            ImageEntry::Url(url) => Some(url),
            ImageEntry::Object(object) => object.url.as_deref(),
            ImageEntry::Other(_) => None,
        }
    }

    fn width(&self) -> Option<f64> {
        match self {
            ImageEntry::Object(object) => object.width.as_ref().and_then(Numeric::value),
            _ => None,
        }
    }
}

impl ImageField {
    fn url(&self) -> Option<&str> {
        match self {
            ImageField::Url(url) => Some(url),
            ImageField::Object(object) => object.url.as_deref(),
            ImageField::Multiple(entries) => widest_image(entries)
                .or_else(|| entries.iter().rev().find_map(ImageEntry::url)),
            ImageField::Other(_) => None,
        }
    }
}

/// The entry with the largest width; ties keep the first one seen.
fn widest_image(entries: &[ImageEntry]) -> Option<&str> {
    let mut best: Option<(f64, &str)> = None;
    for entry in entries {
        if let (Some(url), Some(width)) = (entry.url(), entry.width()) {
            if best.map_or(true, |(best_width, _)| width > best_width) {
                best = Some((width, url));
            }
        }
    }
    best.map(|(_, url)| url)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstructionsField {
    Text(String),
    Multiple(Vec<InstructionEntry>),
    Other(IgnoredAny),
}

/// Sections are tried before steps: a section object may also carry `text`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstructionEntry {
    Text(String),
    Nested(Vec<InstructionEntry>),
    Section(HowToSection),
    Step(HowToStep),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct HowToSection {
    #[serde(rename = "itemListElement")]
    item_list_element: StepList,
}

/// Some sites give a section's single step as a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StepList {
    Multiple(Vec<InstructionEntry>),
    Single(Box<InstructionEntry>),
}

impl StepList {
    fn entries(&self) -> &[InstructionEntry] {
        match self {
            StepList::Multiple(entries) => entries,
            StepList::Single(entry) => std::slice::from_ref(entry.as_ref()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HowToStep {
    #[serde(rename = "@type")]
    kind: Option<TextField>,
    text: Option<String>,
    name: Option<String>,
}

impl HowToStep {
    /// A step's `text`, else its `name`. A section's name is a heading, not a step.
    fn text(&self) -> Option<&str> {
        let is_section = self.kind.as_ref().is_some_and(|kind| {
            kind.all()
                .iter()
                .any(|kind| kind.eq_ignore_ascii_case("HowToSection"))
        });
        match (&self.text, is_section) {
            (Some(text), _) => Some(text.as_str()),
            (None, false) => self.name.as_deref(),
            (None, true) => None,
        }
    }
}

impl InstructionsField {
    fn steps(&self) -> Vec<String> {
        let mut steps = Vec::new();
        match self {
            InstructionsField::Text(text) => steps.extend(text.lines().map(str::to_string)),
            InstructionsField::Multiple(entries) => {
                for entry in entries {
                    entry.flatten_into(&mut steps);
                }
            }
            InstructionsField::Other(_) => {}
        }
        steps
    }
}

impl InstructionEntry {
    fn flatten_into(&self, steps: &mut Vec<String>) {
        match self {
            InstructionEntry::Text(text) => steps.push(text.clone()),
            InstructionEntry::Nested(entries) => {
                for entry in entries {
                    entry.flatten_into(steps);
                }
            }
            InstructionEntry::Section(section) => {
                for entry in section.item_list_element.entries() {
                    entry.flatten_into(steps);
                }
            }
            InstructionEntry::Step(step) => {
                if let Some(text) = step.text() {
                    steps.push(text.to_string());
                }
            }
            InstructionEntry::Other(_) => {}
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YieldField {
    Text(String),
    Number(f64),
    Multiple(Vec<ScalarEntry>),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScalarEntry {
    Text(String),
    Number(f64),
    Other(IgnoredAny),
}

impl YieldField {
    fn servings(&self) -> Option<String> {
        match self {
            YieldField::Text(text) => Some(text.clone()),
            YieldField::Number(n) => Some(format!("{n} servings")),
            YieldField::Multiple(entries) => match entries.first()? {
                ScalarEntry::Text(text) => Some(text.clone()),
                ScalarEntry::Number(n) => Some(n.to_string()),
                ScalarEntry::Other(_) => None,
            },
            YieldField::Other(_) => None,
        }
    }
}

/// Map a Recipe node to a record. Returns `None` when the node has no usable
/// name or carries neither ingredients nor instructions.
pub(crate) fn map_recipe(
    node: &Value,
    source_url: &str,
    settings: &ExtractorSettings,
) -> Option<ExtractedRecipe> {
    let schema = match SchemaRecipe::deserialize(node) {
        Ok(schema) => schema,
        Err(e) => {
            debug!("Recipe node is not an object: {}", e);
            return None;
        }
    };

    let Some(raw_name) = schema.name.as_ref().and_then(TextField::as_text) else {
        debug!("Recipe node has no string name");
        return None;
    };
    let name = clean_title_with(&clean_text(raw_name), settings.author_suffix_max_len);
    if name.is_empty() {
        debug!("Recipe name is empty after cleanup");
        return None;
    }

    let mut recipe = ExtractedRecipe::new(name, source_url, ExtractionMethod::StructuredData);

    recipe.author = schema
        .author
        .as_ref()
        .and_then(NamedField::name)
        .or_else(|| schema.publisher.as_ref().and_then(NamedField::name))
        .and_then(non_empty);
    recipe.image_url = schema
        .image
        .as_ref()
        .and_then(ImageField::url)
        .and_then(non_empty);
    recipe.ingredients = schema
        .recipe_ingredient
        .as_ref()
        .map(|field| clean_ingredients(field.all()))
        .unwrap_or_default();
    recipe.instructions = schema
        .recipe_instructions
        .as_ref()
        .map(|field| clean_instructions(field.steps()))
        .unwrap_or_default();

    let duration = |field: &Option<TextField>| {
        field
            .as_ref()
            .and_then(TextField::first)
            .and_then(parse_iso_duration_to_minutes)
    };
    recipe.prep_time_minutes = duration(&schema.prep_time);
    recipe.cook_time_minutes = duration(&schema.cook_time);
    recipe.total_time_minutes =
        total_minutes(duration(&schema.total_time), recipe.prep_time_minutes, recipe.cook_time_minutes);

    recipe.servings = schema
        .recipe_yield
        .as_ref()
        .and_then(YieldField::servings)
        .and_then(|s| non_empty(&s));
    recipe.description = first_text(&schema.description);
    recipe.cuisine = first_text(&schema.recipe_cuisine);
    recipe.category = first_text(&schema.recipe_category);
    recipe.keywords = schema
        .keywords
        .as_ref()
        .map(|field| split_keywords(field.all()))
        .unwrap_or_default();
    recipe.canonical_url = schema
        .url
        .as_ref()
        .and_then(TextField::as_text)
        .and_then(non_empty);

    if let Some(rating) = schema.aggregate_rating.as_ref().and_then(RatingField::rating) {
        recipe.ratings = rating.value();
        recipe.ratings_count = rating.count();
    }
    recipe.equipment = schema
        .tool
        .as_ref()
        .map(|field| field.names().into_iter().filter_map(non_empty).collect())
        .unwrap_or_default();
    recipe.nutrients = schema
        .nutrition
        .as_ref()
        .map(NutritionField::facts)
        .unwrap_or_default();
    recipe.dietary_restrictions = schema
        .suitable_for_diet
        .as_ref()
        .map(|field| field.all().into_iter().filter_map(diet_label).collect())
        .unwrap_or_default();
    recipe.cooking_method = first_text(&schema.cooking_method);
    recipe.language = first_text(&schema.in_language);

    if !recipe.is_usable() {
        debug!("Recipe '{}' has neither ingredients nor instructions", recipe.name);
        return None;
    }

    Some(recipe)
}

/// An explicit total wins; otherwise prep plus cook, absent only when both are.
pub(crate) fn total_minutes(total: Option<u32>, prep: Option<u32>, cook: Option<u32>) -> Option<u32> {
    total.or_else(|| match (prep, cook) {
        (None, None) => None,
        (prep, cook) => Some(prep.unwrap_or(0).saturating_add(cook.unwrap_or(0))),
    })
}

pub(crate) fn clean_ingredients<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| normalize_ingredient_text(&clean_text(item.as_ref())))
        .filter(|item| !item.is_empty())
        .collect()
}

pub(crate) fn clean_instructions<I, S>(steps: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let cleaned = steps
        .into_iter()
        .map(|step| clean_text(step.as_ref()))
        .filter(|step| !is_field_name(step));
    filter_editorial_notes(cleaned).collect()
}

pub(crate) fn split_keywords<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flat_map(|value| {
            value
                .as_ref()
                .split(',')
                .map(clean_text)
                .collect::<Vec<_>>()
        })
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

/// `https://schema.org/GlutenFreeDiet` becomes "Gluten Free Diet".
pub(crate) fn diet_label(value: &str) -> Option<String> {
    let name = value.trim().rsplit('/').next().unwrap_or_default();
    let mut label = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for c in name.chars() {
        if c.is_uppercase() && previous_lower {
            label.push(' ');
        }
        previous_lower = c.is_lowercase();
        label.push(c);
    }
    non_empty(&label)
}

fn is_field_name(step: &str) -> bool {
    let lowered = step.trim().to_lowercase();
    FIELD_NAME_STEPS.contains(&lowered.as_str())
}

fn first_text(field: &Option<TextField>) -> Option<String> {
    field.as_ref().and_then(TextField::first).and_then(non_empty)
}

fn non_empty(text: &str) -> Option<String> {
    let cleaned = clean_text(text);
    (!cleaned.is_empty()).then_some(cleaned)
}
