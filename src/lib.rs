pub mod collaborators;
pub mod config;
pub mod error;
pub mod extractors;
pub mod fetch;
pub mod model;
pub mod pipeline;
pub mod text;

pub use collaborators::{RecipePublisher, RecipeTagger, RecipeTags};
pub use config::{AppConfig, ExtractorSettings};
pub use error::ImportError;
pub use extractors::{
    extract_from_html_heuristics, extract_from_structured_data, ExtractionCoordinator, Extractor,
    ParsingContext,
};
pub use fetch::RequestFetcher;
pub use model::{ExtractedRecipe, ExtractionMethod};
pub use pipeline::{fetch_recipe, fetch_recipe_with, PublishedRecipe, RecipePipeline};

use log::debug;
use scraper::Html;

/// Extract a recipe from a page's HTML with the default extractor chain.
///
/// Structured data is tried first, then HTML heuristics. Fails with
/// [`ImportError::NoExtractorMatched`] when neither yields a usable record.
pub fn extract_recipe(html: &str, source_url: &str) -> Result<ExtractedRecipe, ImportError> {
    let document = Html::parse_document(html);
    let recipe = ExtractionCoordinator::default()
        .extract(&document, source_url)
        .ok_or(ImportError::NoExtractorMatched)?;
    debug!("{:#?}", recipe);
    Ok(recipe)
}
