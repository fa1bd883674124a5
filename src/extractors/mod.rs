use crate::config::ExtractorSettings;
use crate::model::ExtractedRecipe;
use crate::text::clean_text;
use log::{debug, warn};
use scraper::{ElementRef, Html};

mod heuristic;
mod html_class;
mod json_ld;
mod meta_tags;
mod microdata;
mod schema;

pub use heuristic::HtmlHeuristicExtractor;
pub use json_ld::JsonLdExtractor;

/// The page being extracted. Borrowed for the duration of one call.
#[derive(Clone, Copy)]
pub struct ParsingContext<'a> {
    pub url: &'a str,
    pub document: &'a Html,
}

pub trait Extractor: Send + Sync {
    /// Name used in configuration and logs
    fn name(&self) -> &'static str;

    /// Extract a recipe, or `None` when this strategy finds nothing usable.
    fn parse(&self, context: &ParsingContext) -> Option<ExtractedRecipe>;
}

/// Runs extractors in order; the first usable record wins.
pub struct ExtractionCoordinator {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractionCoordinator {
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self { extractors }
    }

    /// Build the chain named in `settings.order`, skipping unknown names.
    pub fn from_settings(settings: &ExtractorSettings) -> Self {
        let mut extractors: Vec<Box<dyn Extractor>> = Vec::new();
        for name in &settings.order {
            match name.as_str() {
                "json_ld" => extractors.push(Box::new(JsonLdExtractor::new(settings.clone()))),
                "heuristic" => {
                    extractors.push(Box::new(HtmlHeuristicExtractor::new(settings.clone())))
                }
                other => warn!("Unknown extractor '{}' in configuration, skipping", other),
            }
        }
        Self::new(extractors)
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    pub fn extract(&self, document: &Html, url: &str) -> Option<ExtractedRecipe> {
        let context = ParsingContext { url, document };

        for extractor in &self.extractors {
            match extractor.parse(&context) {
                Some(recipe) if recipe.is_usable() => {
                    debug!("Recipe extracted by {}", extractor.name());
                    return Some(recipe);
                }
                Some(_) => debug!("{} produced an insufficient recipe", extractor.name()),
                None => debug!("{} found no recipe", extractor.name()),
            }
        }

        debug!("No extractor produced a usable recipe for {}", url);
        None
    }
}

impl Default for ExtractionCoordinator {
    fn default() -> Self {
        Self::from_settings(&ExtractorSettings::default())
    }
}

/// Extract a recipe from the page's JSON-LD blocks only.
pub fn extract_from_structured_data(document: &Html, source_url: &str) -> Option<ExtractedRecipe> {
    JsonLdExtractor::default().parse(&ParsingContext {
        url: source_url,
        document,
    })
}

/// Extract a recipe from microdata, CSS class conventions and meta tags.
pub fn extract_from_html_heuristics(document: &Html, source_url: &str) -> Option<ExtractedRecipe> {
    HtmlHeuristicExtractor::default().parse(&ParsingContext {
        url: source_url,
        document,
    })
}

/// Display-ready text content of an element.
pub(crate) fn element_text(element: ElementRef) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}
