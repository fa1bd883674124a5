//! Interfaces of the services a recipe is handed to after extraction.

use crate::error::ImportError;
use crate::model::ExtractedRecipe;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tags produced by the AI tagging service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeTags {
    #[serde(default)]
    pub meal_types: Vec<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub dietary: Vec<String>,
    pub difficulty: Option<String>,
    /// 1 (indulgent) to 10 (very healthy)
    pub health_score: Option<u8>,
}

/// Sends an extracted recipe to a language model for tagging.
#[async_trait]
pub trait RecipeTagger: Send + Sync {
    async fn tag(&self, recipe: &ExtractedRecipe) -> Result<RecipeTags, ImportError>;
}

/// Publishes a tagged recipe as a page in the knowledge base.
#[async_trait]
pub trait RecipePublisher: Send + Sync {
    /// Returns the identifier of the created page.
    async fn publish(
        &self,
        recipe: &ExtractedRecipe,
        tags: &RecipeTags,
    ) -> Result<String, ImportError>;
}
