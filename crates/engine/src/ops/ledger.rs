//! Transaction write and read operations.
//!
//! Writes orchestrate the allocation rules: any mutation that changes
//! saving-relevant state (a transaction pointing at a goal being created,
//! edited, or deleted) reverses and/or applies the goal allocation inside
//! the same database transaction as the row write. Either everything
//! commits or nothing does.

use chrono::{NaiveDate, Utc};
use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, entity::ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    CategoryKind, CreateTransactionCmd, EngineError, ResultEngine, Transaction,
    UpdateTransactionCmd, transactions,
    util::{apply_optional_date_patch, apply_optional_text_patch, normalize_optional_text},
};

use super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`).
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub goal_id: Option<Uuid>,
    /// Maximum number of rows to return (unbounded when unset).
    pub limit: Option<u64>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from >= to {
            return Err(EngineError::Validation(
                "invalid range: from must be < to".to_string(),
            ));
        }
    }
    Ok(())
}

impl Engine {
    /// Records a transaction for `cmd.owner_id`.
    ///
    /// When the category is saving-kind and a goal is set, the amount is
    /// allocated to that goal in the same unit of work; a failed allocation
    /// aborts the create and no transaction row persists.
    pub async fn create_transaction(&self, cmd: CreateTransactionCmd) -> ResultEngine<Uuid> {
        let note = normalize_optional_text(cmd.note.as_deref());
        with_tx!(self, |db_tx| {
            let category = self.require_category(&db_tx, cmd.category_id).await?;
            if let Some(goal_id) = cmd.goal_id {
                if category.kind != CategoryKind::Saving {
                    return Err(EngineError::Validation(
                        "goal_id is only valid on saving transactions".to_string(),
                    ));
                }
                self.require_goal(&db_tx, goal_id).await?;
            }

            let tx = Transaction::new(
                cmd.owner_id,
                cmd.category_id,
                cmd.goal_id,
                cmd.amount_cents,
                cmd.date,
                note,
            )?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

            // Only saving transactions carry a goal_id past the check above.
            if let Some(goal_id) = tx.goal_id {
                self.allocate(&db_tx, &tx, goal_id).await?;
            }

            Ok(tx.id)
        })
    }

    /// Updates an existing transaction (amount, category, date, note, and/or
    /// goal reference).
    ///
    /// Any prior allocation is reversed with the *old* amount before the
    /// patches apply, then the *new* category/goal combination is allocated
    /// against the freed capacity. A failure anywhere rolls back the whole
    /// sequence, reversal included.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let old = self
                .require_transaction_owned(&db_tx, cmd.transaction_id, &cmd.owner_id)
                .await?;
            let old_category = self.require_category(&db_tx, old.category_id).await?;

            if let Some(old_goal_id) = old.goal_id {
                if old_category.kind == CategoryKind::Saving {
                    self.deallocate(&db_tx, &old, old_goal_id).await?;
                }
            }

            let new_amount = cmd.amount_cents.unwrap_or(old.amount_cents);
            if !new_amount.is_positive() {
                return Err(EngineError::Validation(
                    "amount_cents must be > 0".to_string(),
                ));
            }

            let new_category_id = cmd.category_id.unwrap_or(old.category_id);
            let new_category = if new_category_id == old.category_id {
                old_category
            } else {
                self.require_category(&db_tx, new_category_id).await?
            };
            let new_goal_id = match cmd.goal {
                None => old.goal_id,
                Some(goal) => goal,
            };
            let new_date = apply_optional_date_patch(old.date, cmd.date);
            let new_note = apply_optional_text_patch(old.note.clone(), cmd.note.as_deref());

            if let Some(goal_id) = new_goal_id {
                if new_category.kind != CategoryKind::Saving {
                    return Err(EngineError::Validation(
                        "goal_id is only valid on saving transactions".to_string(),
                    ));
                }
                self.require_goal(&db_tx, goal_id).await?;
            }

            let now = Utc::now();
            let tx_model = transactions::ActiveModel {
                id: ActiveValue::Set(old.id.to_string()),
                category_id: ActiveValue::Set(new_category_id.to_string()),
                goal_id: ActiveValue::Set(new_goal_id.map(|id| id.to_string())),
                amount_cents: ActiveValue::Set(new_amount.cents()),
                date: ActiveValue::Set(new_date),
                note: ActiveValue::Set(new_note.clone()),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            };
            tx_model.update(&db_tx).await?;

            if let Some(goal_id) = new_goal_id {
                let updated = Transaction {
                    id: old.id,
                    owner_id: old.owner_id.clone(),
                    category_id: new_category_id,
                    goal_id: new_goal_id,
                    amount_cents: new_amount,
                    date: new_date,
                    note: new_note,
                    created_at: old.created_at,
                    updated_at: now,
                };
                self.allocate(&db_tx, &updated, goal_id).await?;
            }

            Ok(())
        })
    }

    /// Deletes a transaction, reversing its allocation first.
    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        owner_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let tx = self
                .require_transaction_owned(&db_tx, transaction_id, owner_id)
                .await?;
            let category = self.require_category(&db_tx, tx.category_id).await?;

            if let Some(goal_id) = tx.goal_id {
                if category.kind == CategoryKind::Saving {
                    self.deallocate(&db_tx, &tx, goal_id).await?;
                }
            }

            transactions::Entity::delete_by_id(tx.id.to_string())
                .exec(&db_tx)
                .await?;

            Ok(())
        })
    }

    /// Return a single transaction owned by `owner_id`.
    pub async fn transaction(
        &self,
        transaction_id: Uuid,
        owner_id: &str,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::OwnerId.eq(owner_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("transaction".to_string()))?;
        Transaction::try_from(model)
    }

    /// Lists `owner_id`'s transactions, newest first.
    pub async fn list_transactions(
        &self,
        owner_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(owner_id))
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::CreatedAt);

        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::Date.lt(to));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id.to_string()));
        }
        if let Some(goal_id) = filter.goal_id {
            query = query.filter(transactions::Column::GoalId.eq(goal_id.to_string()));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let models = query.all(&self.database).await?;
        models.into_iter().map(Transaction::try_from).collect()
    }
}
