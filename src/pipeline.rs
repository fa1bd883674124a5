//! URL in, published page out: fetch, extract, tag, publish.

use crate::collaborators::{RecipePublisher, RecipeTagger, RecipeTags};
use crate::config::AppConfig;
use crate::error::ImportError;
use crate::extractors::ExtractionCoordinator;
use crate::fetch::RequestFetcher;
use crate::model::ExtractedRecipe;
use log::{debug, info, warn};
use scraper::Html;
use std::time::Duration;

/// Outcome of a successful import.
#[derive(Debug, Clone)]
pub struct PublishedRecipe {
    pub page_id: String,
    pub recipe: ExtractedRecipe,
    pub tags: RecipeTags,
}

pub struct RecipePipeline {
    fetcher: RequestFetcher,
    coordinator: ExtractionCoordinator,
    tagger: Box<dyn RecipeTagger>,
    publisher: Box<dyn RecipePublisher>,
}

impl RecipePipeline {
    pub fn new(
        fetcher: RequestFetcher,
        coordinator: ExtractionCoordinator,
        tagger: Box<dyn RecipeTagger>,
        publisher: Box<dyn RecipePublisher>,
    ) -> Self {
        Self {
            fetcher,
            coordinator,
            tagger,
            publisher,
        }
    }

    /// Build the fetcher and extractor chain from `config`.
    pub fn from_config(
        config: &AppConfig,
        tagger: Box<dyn RecipeTagger>,
        publisher: Box<dyn RecipePublisher>,
    ) -> Result<Self, ImportError> {
        let coordinator = ExtractionCoordinator::from_settings(&config.extractors);
        Ok(Self::new(fetcher_for(config)?, coordinator, tagger, publisher))
    }

    pub async fn extract(&self, url: &str) -> Result<ExtractedRecipe, ImportError> {
        fetch_and_extract(&self.fetcher, &self.coordinator, url).await
    }

    /// Import `url` into the knowledge base. Tagging failures are logged and
    /// the recipe is published untagged; every other failure aborts.
    pub async fn import(&self, url: &str) -> Result<PublishedRecipe, ImportError> {
        let recipe = self.extract(url).await?;
        info!(
            "Extracted '{}' from {} via {}",
            recipe.name,
            url,
            recipe.extraction_method.as_str()
        );

        let tags = match self.tagger.tag(&recipe).await {
            Ok(tags) => tags,
            Err(e) => {
                warn!("Tagging failed for '{}', publishing without tags: {}", recipe.name, e);
                RecipeTags::default()
            }
        };
        debug!("Tags: {:?}", tags);

        let page_id = self.publisher.publish(&recipe, &tags).await?;
        info!("Published '{}' as page {}", recipe.name, page_id);

        Ok(PublishedRecipe {
            page_id,
            recipe,
            tags,
        })
    }
}

/// Fetch `url` with default configuration and extract its recipe.
pub async fn fetch_recipe(url: &str) -> Result<ExtractedRecipe, ImportError> {
    fetch_recipe_with(&AppConfig::default(), url).await
}

/// Fetch `url` and extract its recipe using the fetch and extractor
/// settings in `config`.
pub async fn fetch_recipe_with(
    config: &AppConfig,
    url: &str,
) -> Result<ExtractedRecipe, ImportError> {
    let coordinator = ExtractionCoordinator::from_settings(&config.extractors);
    fetch_and_extract(&fetcher_for(config)?, &coordinator, url).await
}

fn fetcher_for(config: &AppConfig) -> Result<RequestFetcher, ImportError> {
    RequestFetcher::new(Duration::from_secs(config.timeout), &config.user_agent)
}

async fn fetch_and_extract(
    fetcher: &RequestFetcher,
    coordinator: &ExtractionCoordinator,
    url: &str,
) -> Result<ExtractedRecipe, ImportError> {
    let html = fetcher.fetch(url).await?;
    // Html is not Send; it must be dropped before the next await.
    let document = Html::parse_document(&html);
    coordinator
        .extract(&document, url)
        .ok_or(ImportError::NoExtractorMatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtractionMethod;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    const PAGE: &str = r#"
        <html><head>
        <script type="application/ld+json">
        {"@type": "Recipe", "name": "Toast", "recipeIngredient": ["1 slice bread"],
         "recipeInstructions": "Toast the bread."}
        </script>
        </head><body></body></html>
    "#;

    struct FakeTagger {
        fail: bool,
    }

    #[async_trait]
    impl RecipeTagger for FakeTagger {
        async fn tag(&self, _recipe: &ExtractedRecipe) -> Result<RecipeTags, ImportError> {
            if self.fail {
                return Err(ImportError::TaggingError("model unavailable".to_string()));
            }
            Ok(RecipeTags {
                meal_types: vec!["Breakfast".to_string()],
                difficulty: Some("Easy".to_string()),
                health_score: Some(5),
                ..RecipeTags::default()
            })
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        published: Arc<Mutex<Vec<(String, RecipeTags)>>>,
    }

    #[async_trait]
    impl RecipePublisher for RecordingPublisher {
        async fn publish(
            &self,
            recipe: &ExtractedRecipe,
            tags: &RecipeTags,
        ) -> Result<String, ImportError> {
            let mut published = self.published.lock().unwrap();
            published.push((recipe.name.clone(), tags.clone()));
            Ok(format!("page-{}", published.len()))
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl RecipePublisher for FailingPublisher {
        async fn publish(&self, _: &ExtractedRecipe, _: &RecipeTags) -> Result<String, ImportError> {
            Err(ImportError::PublishError("database locked".to_string()))
        }
    }

    fn pipeline(tagger: FakeTagger, publisher: Box<dyn RecipePublisher>) -> RecipePipeline {
        RecipePipeline::from_config(&AppConfig::default(), Box::new(tagger), publisher).unwrap()
    }

    async fn serve(body: &str) -> (mockito::ServerGuard, mockito::Mock) {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/toast")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(body)
            .create_async()
            .await;
        (server, mock)
    }

    #[tokio::test]
    async fn test_import_publishes_tagged_recipe() {
        let (server, _m) = serve(PAGE).await;
        let publisher = RecordingPublisher::default();
        let published = publisher.published.clone();

        let result = pipeline(FakeTagger { fail: false }, Box::new(publisher))
            .import(&format!("{}/toast", server.url()))
            .await
            .unwrap();

        assert_eq!(result.page_id, "page-1");
        assert_eq!(result.recipe.name, "Toast");
        assert_eq!(result.recipe.extraction_method, ExtractionMethod::StructuredData);
        assert_eq!(result.tags.meal_types, vec!["Breakfast"]);
        assert_eq!(published.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tagging_failure_still_publishes() {
        let (server, _m) = serve(PAGE).await;
        let publisher = RecordingPublisher::default();
        let published = publisher.published.clone();

        let result = pipeline(FakeTagger { fail: true }, Box::new(publisher))
            .import(&format!("{}/toast", server.url()))
            .await
            .unwrap();

        assert_eq!(result.tags, RecipeTags::default());
        assert_eq!(published.lock().unwrap()[0].0, "Toast");
    }

    #[tokio::test]
    async fn test_publish_failure_is_returned() {
        let (server, _m) = serve(PAGE).await;

        let result = pipeline(FakeTagger { fail: false }, Box::new(FailingPublisher))
            .import(&format!("{}/toast", server.url()))
            .await;

        assert!(matches!(result, Err(ImportError::PublishError(_))));
    }

    #[tokio::test]
    async fn test_page_without_recipe() {
        let (server, _m) = serve("<html><body><p>Just a blog post.</p></body></html>").await;

        let result = pipeline(FakeTagger { fail: false }, Box::new(RecordingPublisher::default()))
            .import(&format!("{}/toast", server.url()))
            .await;

        assert!(matches!(result, Err(ImportError::NoExtractorMatched)));
    }

    #[tokio::test]
    async fn test_fetch_recipe_with_configured_order() {
        let page = r#"
            <html><head>
            <script type="application/ld+json">
            {"@type": "Recipe", "name": "Toast", "recipeIngredient": ["1 slice bread"]}
            </script>
            </head><body>
            <h1>Heuristic Toast</h1>
            <ul class="ingredients"><li>2 slices bread</li></ul>
            </body></html>
        "#;
        let (server, _m) = serve(page).await;
        let mut config = AppConfig::default();
        config.extractors.order = vec!["heuristic".to_string()];

        let recipe = fetch_recipe_with(&config, &format!("{}/toast", server.url()))
            .await
            .unwrap();

        assert_eq!(recipe.name, "Heuristic Toast");
        assert_eq!(recipe.extraction_method, ExtractionMethod::HtmlFallback);
    }

    #[tokio::test]
    async fn test_fetch_recipe() {
        let (server, mock) = serve(PAGE).await;

        let recipe = fetch_recipe(&format!("{}/toast", server.url())).await.unwrap();

        assert_eq!(recipe.ingredients, vec!["1 slice bread"]);
        assert_eq!(recipe.instructions, vec!["Toast the bread."]);
        mock.assert_async().await;
    }
}
