use sea_orm::prelude::*;
use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine, categories};

use super::Engine;

impl Engine {
    /// Category lookup. The kind decides whether allocation applies.
    pub async fn category(&self, category_id: Uuid) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("category".to_string()))?;
        Category::try_from(model)
    }

    /// All categories, for pickers.
    pub async fn list_categories(&self) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find().all(&self.database).await?;
        models.into_iter().map(Category::try_from).collect()
    }
}
