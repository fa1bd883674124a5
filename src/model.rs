use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which extractor produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    StructuredData,
    HtmlFallback,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::StructuredData => "structured_data",
            ExtractionMethod::HtmlFallback => "html_fallback",
        }
    }
}

/// A normalized recipe record.
///
/// Every text field is entity-decoded and fraction-normalized, so consumers
/// can display values as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecipe {
    pub name: String,
    pub source_url: String,
    pub extraction_method: ExtractionMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_time_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    /// Average rating, rounded to two decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<String>,
    /// Nutrition facts keyed by schema.org property, e.g. `calories`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nutrients: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dietary_restrictions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ExtractedRecipe {
    pub fn new(
        name: impl Into<String>,
        source_url: impl Into<String>,
        extraction_method: ExtractionMethod,
    ) -> Self {
        ExtractedRecipe {
            name: name.into(),
            source_url: source_url.into(),
            extraction_method,
            author: None,
            total_time_minutes: None,
            prep_time_minutes: None,
            cook_time_minutes: None,
            servings: None,
            image_url: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            description: None,
            cuisine: None,
            category: None,
            keywords: Vec::new(),
            canonical_url: None,
            ratings: None,
            ratings_count: None,
            equipment: Vec::new(),
            nutrients: BTreeMap::new(),
            dietary_restrictions: Vec::new(),
            cooking_method: None,
            site_name: None,
            language: None,
        }
    }

    /// A record is usable when it has a name and at least one ingredient or step.
    pub fn is_usable(&self) -> bool {
        !self.name.trim().is_empty()
            && (!self.ingredients.is_empty() || !self.instructions.is_empty())
    }

    /// Plain-text rendering handed to the tagging collaborator as prompt material.
    pub fn prompt_material(&self) -> String {
        let mut output = format!("Recipe: {}\n", self.name);

        if let Some(description) = &self.description {
            output.push_str(&format!("Description: {description}\n"));
        }
        if let Some(cuisine) = &self.cuisine {
            output.push_str(&format!("Cuisine: {cuisine}\n"));
        }
        if let Some(category) = &self.category {
            output.push_str(&format!("Category: {category}\n"));
        }
        if let Some(minutes) = self.total_time_minutes {
            output.push_str(&format!("Total time: {minutes} minutes\n"));
        }

        output.push_str("\nIngredients:\n");
        for ingredient in &self.ingredients {
            output.push_str(&format!("- {ingredient}\n"));
        }

        output.push_str("\nInstructions:\n");
        for (i, step) in self.instructions.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, step));
        }

        output
    }
}
