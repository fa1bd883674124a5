use super::html_class::{class_list_items, INGREDIENT_PATTERNS, INSTRUCTION_PATTERNS};
use super::meta_tags::MetaTags;
use super::microdata::MicrodataScope;
use super::schema::{clean_ingredients, clean_instructions, split_keywords, total_minutes};
use super::{Extractor, ParsingContext};
use crate::config::ExtractorSettings;
use crate::model::{ExtractedRecipe, ExtractionMethod};
use crate::text::clean_title_with;
use log::debug;

/// Falls back from microdata, to CSS class conventions, to page meta tags,
/// field by field.
pub struct HtmlHeuristicExtractor {
    settings: ExtractorSettings,
}

impl HtmlHeuristicExtractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }
}

impl Default for HtmlHeuristicExtractor {
    fn default() -> Self {
        Self::new(ExtractorSettings::default())
    }
}

impl Extractor for HtmlHeuristicExtractor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn parse(&self, context: &ParsingContext) -> Option<ExtractedRecipe> {
        debug!("Attempting to extract recipe using HTML heuristics");

        let scope = MicrodataScope::for_document(context.document);
        let meta = MetaTags::new(context.document);
        debug!("Microdata Recipe container found: {}", scope.has_container());

        let mut ingredients = scope.ingredients();
        if ingredients.is_empty() {
            ingredients = class_list_items(scope.root(), INGREDIENT_PATTERNS);
        }
        let ingredients = clean_ingredients(ingredients);

        let mut instructions = scope.instructions();
        if instructions.is_empty() {
            instructions = class_list_items(scope.root(), INSTRUCTION_PATTERNS);
        }
        let instructions = clean_instructions(instructions);

        if ingredients.is_empty() && instructions.is_empty() {
            debug!("Could not extract recipe content from HTML");
            return None;
        }

        let raw_name = scope.text("name").or_else(|| meta.title())?;
        let name = clean_title_with(&raw_name, self.settings.author_suffix_max_len);
        if name.is_empty() {
            debug!("Could not extract recipe title from HTML");
            return None;
        }

        let mut recipe = ExtractedRecipe::new(name, context.url, ExtractionMethod::HtmlFallback);
        recipe.ingredients = ingredients;
        recipe.instructions = instructions;
        recipe.description = scope.text("description").or_else(|| meta.description());
        recipe.image_url = scope.image().or_else(|| meta.image());
        recipe.author = scope
            .author()
            .or_else(|| meta.author(self.settings.site_name_max_len));
        recipe.prep_time_minutes = scope.duration("prepTime");
        recipe.cook_time_minutes = scope.duration("cookTime");
        recipe.total_time_minutes = total_minutes(
            scope.duration("totalTime"),
            recipe.prep_time_minutes,
            recipe.cook_time_minutes,
        );
        recipe.servings = scope.text("recipeYield");
        recipe.cuisine = scope.text("recipeCuisine");
        recipe.category = scope.text("recipeCategory");
        recipe.keywords = split_keywords(scope.text("keywords").or_else(|| meta.keywords()));
        recipe.canonical_url = meta.canonical_url();
        recipe.cooking_method = scope.text("cookingMethod");
        recipe.equipment = scope.texts("tool");
        recipe.site_name = meta.site_name();
        recipe.language = scope.text("inLanguage").or_else(|| meta.language());

        debug!(
            "Extracted '{}' with {} ingredients and {} instructions",
            recipe.name,
            recipe.ingredients.len(),
            recipe.instructions.len()
        );
        Some(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn parse(html: &str) -> Option<ExtractedRecipe> {
        let document = Html::parse_document(html);
        HtmlHeuristicExtractor::default().parse(&ParsingContext {
            url: "https://example.com/recipe",
            document: &document,
        })
    }

    #[test]
    fn test_microdata_recipe() {
        let recipe = parse(
            r#"
            <html><body>
            <div itemscope itemtype="http://schema.org/Recipe">
                <h1 itemprop="name">Soup</h1>
                <span itemprop="recipeIngredient">1 onion</span>
                <span itemprop="recipeIngredient">2 cups stock</span>
                <meta itemprop="totalTime" content="PT45M">
                <span itemprop="recipeCuisine">French</span>
                <span itemprop="cookingMethod">Simmering</span>
                <span itemprop="tool">Stock pot</span>
                <span itemprop="tool">Ladle</span>
                <meta itemprop="keywords" content="soup, onion">
            </div>
            </body></html>
            "#,
        )
        .unwrap();

        assert_eq!(recipe.name, "Soup");
        assert_eq!(recipe.extraction_method, ExtractionMethod::HtmlFallback);
        assert_eq!(recipe.ingredients, vec!["1 onion", "2 cups stock"]);
        assert!(recipe.instructions.is_empty());
        assert_eq!(recipe.total_time_minutes, Some(45));
        assert_eq!(recipe.cuisine, Some("French".to_string()));
        assert_eq!(recipe.cooking_method, Some("Simmering".to_string()));
        assert_eq!(recipe.equipment, vec!["Stock pot", "Ladle"]);
        assert_eq!(recipe.keywords, vec!["soup", "onion"]);
    }

    #[test]
    fn test_class_and_meta_fallbacks() {
        let recipe = parse(
            r#"
            <html lang="en">
            <head>
                <meta property="og:title" content="Banana Bread Recipe">
                <meta property="og:description" content="Moist and easy.">
                <meta property="og:image" content="https://example.com/bread.jpg">
                <meta property="og:site_name" content="Bake Club">
            </head>
            <body>
                <h1>Something else</h1>
                <div class="recipe-ingredients">
                    <ul><li>3 bananas*</li><li>½ cup sugar</li></ul>
                </div>
                <div class="recipe-instructions">
                    <ol>
                        <li>Mash the bananas.</li>
                        <li>Editor's note: we used very ripe ones.</li>
                        <li>Bake. Editor's note: 350F works too.</li>
                    </ol>
                </div>
            </body>
            </html>
            "#,
        )
        .unwrap();

        assert_eq!(recipe.name, "Banana Bread");
        assert_eq!(recipe.ingredients, vec!["3 bananas", "1/2 cup sugar"]);
        assert_eq!(recipe.instructions, vec!["Mash the bananas.", "Bake."]);
        assert_eq!(recipe.description, Some("Moist and easy.".to_string()));
        assert_eq!(recipe.image_url, Some("https://example.com/bread.jpg".to_string()));
        assert_eq!(recipe.author, Some("Bake Club".to_string()));
        assert_eq!(recipe.site_name, Some("Bake Club".to_string()));
        assert_eq!(recipe.language, Some("en".to_string()));
        assert_eq!(recipe.total_time_minutes, None);
    }

    #[test]
    fn test_no_content_yields_nothing() {
        assert!(parse("<html><head><title>Blog</title></head><body><h1>About me</h1></body></html>").is_none());
    }

    #[test]
    fn test_no_name_yields_nothing() {
        assert!(parse(r#"<div class="ingredients"><ul><li>1 egg</li></ul></div>"#).is_none());
    }
}
