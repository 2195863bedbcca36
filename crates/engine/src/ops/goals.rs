//! Goal management operations.
//!
//! These own the user-facing fields of a goal (name, target); the allocated
//! progress is only ever touched by the allocation rules. Target changes and
//! deletion run under the goal row lock so they serialize with in-flight
//! allocations.

use sea_orm::{PaginatorTrait, QueryFilter, TransactionTrait, entity::ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    CategoryKind, CreateGoalCmd, EngineError, Goal, ResultEngine, UpdateGoalCmd, goals,
    transactions, util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a goal with zero progress under a saving category.
    pub async fn create_goal(&self, cmd: CreateGoalCmd) -> ResultEngine<Uuid> {
        let name = normalize_required_name(&cmd.name, "goal")?;
        with_tx!(self, |db_tx| {
            let category = self.require_category(&db_tx, cmd.category_id).await?;
            if category.kind != CategoryKind::Saving {
                return Err(EngineError::Validation(
                    "goals belong to saving categories".to_string(),
                ));
            }

            let goal = Goal::new(name, cmd.target_cents, cmd.category_id)?;
            goals::ActiveModel::from(&goal).insert(&db_tx).await?;

            Ok(goal.id)
        })
    }

    /// Updates a goal's name and/or target.
    ///
    /// The target cannot drop below the currently allocated amount, which
    /// would leave the goal overfilled without the allocator ever seeing it.
    pub async fn update_goal(&self, cmd: UpdateGoalCmd) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let goal = self.require_goal_for_update(&db_tx, cmd.goal_id).await?;

            let name = match cmd.name.as_deref() {
                Some(raw) => normalize_required_name(raw, "goal")?,
                None => goal.name.clone(),
            };
            let target = cmd.target_cents.unwrap_or(goal.target_cents);
            if !target.is_positive() {
                return Err(EngineError::Validation(
                    "target_cents must be > 0".to_string(),
                ));
            }
            if target < goal.current_cents {
                return Err(EngineError::Validation(format!(
                    "target {target} is below the allocated {}",
                    goal.current_cents
                )));
            }

            let goal_model = goals::ActiveModel {
                id: ActiveValue::Set(cmd.goal_id.to_string()),
                name: ActiveValue::Set(name),
                target_cents: ActiveValue::Set(target.cents()),
                ..Default::default()
            };
            goal_model.update(&db_tx).await?;

            Ok(())
        })
    }

    /// Deletes a goal.
    ///
    /// Rejected while transactions still reference the goal - the caller
    /// must delete or retarget them first, otherwise the audit trail would
    /// be orphaned.
    pub async fn delete_goal(&self, goal_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_goal_for_update(&db_tx, goal_id).await?;

            let referenced = transactions::Entity::find()
                .filter(transactions::Column::GoalId.eq(goal_id.to_string()))
                .count(&db_tx)
                .await?;
            if referenced > 0 {
                return Err(EngineError::Validation(format!(
                    "goal still has {referenced} allocated transaction(s)"
                )));
            }

            goals::Entity::delete_by_id(goal_id.to_string())
                .exec(&db_tx)
                .await?;

            Ok(())
        })
    }

    /// Return a [`Goal`] (snapshot from DB).
    pub async fn goal(&self, goal_id: Uuid) -> ResultEngine<Goal> {
        let model = goals::Entity::find_by_id(goal_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("goal".to_string()))?;
        Goal::try_from(model)
    }

    /// All goals, for progress displays.
    pub async fn list_goals(&self) -> ResultEngine<Vec<Goal>> {
        let models = goals::Entity::find().all(&self.database).await?;
        models.into_iter().map(Goal::try_from).collect()
    }
}
