use sea_orm::{DatabaseTransaction, QueryFilter, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{
    Category, EngineError, Goal, ResultEngine, Transaction, categories, goals, transactions,
};

use super::Engine;

impl Engine {
    pub(super) async fn require_category(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("category".to_string()))?;
        Category::try_from(model)
    }

    pub(super) async fn require_goal(
        &self,
        db: &DatabaseTransaction,
        goal_id: Uuid,
    ) -> ResultEngine<Goal> {
        let model = goals::Entity::find_by_id(goal_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("goal".to_string()))?;
        Goal::try_from(model)
    }

    /// Fetch a goal with an exclusive row lock, serializing concurrent
    /// mutations of the same goal for the rest of the unit of work.
    ///
    /// Backends without row locks (SQLite) serialize through the database
    /// transaction itself; contention surfaces as [`EngineError::LockTimeout`]
    /// and the caller may retry the whole operation.
    pub(super) async fn require_goal_for_update(
        &self,
        db: &DatabaseTransaction,
        goal_id: Uuid,
    ) -> ResultEngine<Goal> {
        let model = goals::Entity::find_by_id(goal_id.to_string())
            .lock_exclusive()
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("goal".to_string()))?;
        Goal::try_from(model)
    }

    pub(super) async fn require_transaction_owned(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
        owner_id: &str,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::OwnerId.eq(owner_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("transaction".to_string()))?;
        Transaction::try_from(model)
    }
}
