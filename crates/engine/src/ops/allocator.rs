//! Allocation rules.
//!
//! Everything that moves a goal's progress lives here: allocating a saving
//! transaction into a goal, reversing that allocation, and reconciling the
//! stored progress against the savings logs. All mutations run against a
//! caller-provided [`DatabaseTransaction`] so the ledger can fold them into
//! the same unit of work as the transaction write.

use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, Statement,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ResultEngine, SavingsLog, Transaction, goals, savings_logs,
};

use super::{Engine, with_tx};

/// Result of replaying a goal's savings logs against its stored progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalReconciliation {
    pub goal_id: Uuid,
    /// Progress recorded on the goal row before reconciliation.
    pub recorded_cents: MoneyCents,
    /// Progress recomputed from the savings logs (now the stored value).
    pub replayed_cents: MoneyCents,
}

impl GoalReconciliation {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.recorded_cents == self.replayed_cents
    }
}

impl Engine {
    /// Moves the full transaction amount into `goal_id` and writes the
    /// matching savings log row.
    ///
    /// Fails with [`EngineError::CapacityExceeded`] when the amount does not
    /// fit the goal's remaining capacity; the caller's unit of work is
    /// expected to roll back in that case.
    pub(super) async fn allocate(
        &self,
        db: &DatabaseTransaction,
        tx: &Transaction,
        goal_id: Uuid,
    ) -> ResultEngine<()> {
        let mut goal = self.require_goal_for_update(db, goal_id).await?;
        goal.allocate(tx.amount_cents)?;

        let goal_model = goals::ActiveModel {
            id: ActiveValue::Set(goal_id.to_string()),
            current_cents: ActiveValue::Set(goal.current_cents.cents()),
            ..Default::default()
        };
        goal_model.update(db).await?;

        let log = SavingsLog::new(tx.id, goal_id, tx.owner_id.clone(), tx.amount_cents);
        savings_logs::ActiveModel::from(&log).insert(db).await?;

        Ok(())
    }

    /// Reverses a prior allocation: gives the amount back to the goal's
    /// capacity and deletes the savings log rows keyed by the transaction.
    pub(super) async fn deallocate(
        &self,
        db: &DatabaseTransaction,
        tx: &Transaction,
        goal_id: Uuid,
    ) -> ResultEngine<()> {
        let mut goal = self.require_goal_for_update(db, goal_id).await?;
        if goal.release(tx.amount_cents) {
            tracing::warn!(
                goal = %goal.name,
                transaction = %tx.id,
                "goal progress clamped at zero on release, allocation records have drifted"
            );
        }

        let goal_model = goals::ActiveModel {
            id: ActiveValue::Set(goal_id.to_string()),
            current_cents: ActiveValue::Set(goal.current_cents.cents()),
            ..Default::default()
        };
        goal_model.update(db).await?;

        savings_logs::Entity::delete_many()
            .filter(savings_logs::Column::TransactionId.eq(tx.id.to_string()))
            .exec(db)
            .await?;

        Ok(())
    }

    /// Sum of all savings log amounts pointing at a goal.
    pub(super) async fn allocated_total(
        &self,
        db: &DatabaseTransaction,
        goal_id: Uuid,
    ) -> ResultEngine<MoneyCents> {
        let backend = db.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount_cents), 0) AS total \
             FROM savings_logs \
             WHERE goal_id = ?",
            vec![goal_id.to_string().into()],
        );
        let row = db.query_one(stmt).await?;
        let total: i64 = row.and_then(|r| r.try_get("", "total").ok()).unwrap_or(0);
        Ok(MoneyCents::new(total))
    }

    /// Recomputes a goal's progress from its savings logs and repairs the
    /// stored value when the two disagree.
    ///
    /// Under correct operation the two always match; a mismatch means some
    /// historical write bypassed the allocation rules. A replayed sum outside
    /// `0 ..= target` cannot be repaired here and is reported as
    /// [`EngineError::Inconsistent`].
    pub async fn reconcile_goal(&self, goal_id: Uuid) -> ResultEngine<GoalReconciliation> {
        with_tx!(self, |db_tx| {
            let goal = self.require_goal_for_update(&db_tx, goal_id).await?;
            let replayed = self.allocated_total(&db_tx, goal_id).await?;
            let recorded = goal.current_cents;

            if replayed.is_negative() || replayed > goal.target_cents {
                return Err(EngineError::Inconsistent(format!(
                    "savings logs for goal \"{}\" sum to {replayed}, target is {}",
                    goal.name, goal.target_cents
                )));
            }

            if recorded != replayed {
                tracing::warn!(
                    goal = %goal.name,
                    recorded = recorded.cents(),
                    replayed = replayed.cents(),
                    "goal progress drifted from savings logs, repairing"
                );
                let goal_model = goals::ActiveModel {
                    id: ActiveValue::Set(goal_id.to_string()),
                    current_cents: ActiveValue::Set(replayed.cents()),
                    ..Default::default()
                };
                goal_model.update(&db_tx).await?;
            }

            Ok(GoalReconciliation {
                goal_id,
                recorded_cents: recorded,
                replayed_cents: replayed,
            })
        })
    }

    /// The audit trail for a goal, oldest first.
    pub async fn savings_history(&self, goal_id: Uuid) -> ResultEngine<Vec<SavingsLog>> {
        let models = savings_logs::Entity::find()
            .filter(savings_logs::Column::GoalId.eq(goal_id.to_string()))
            .order_by_asc(savings_logs::Column::CreatedAt)
            .order_by_asc(savings_logs::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(SavingsLog::try_from).collect()
    }
}
