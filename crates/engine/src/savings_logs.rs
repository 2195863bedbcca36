//! Savings logs.
//!
//! A [`SavingsLog`] records which transaction funded which goal and by how
//! much. Rows are only ever inserted (on allocation) and deleted (when the
//! originating transaction's allocation is reversed) - never updated in
//! place. The sum of a goal's rows must always equal its stored progress.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsLog {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub goal_id: Uuid,
    pub owner_id: String,
    pub amount_cents: MoneyCents,
    pub created_at: DateTime<Utc>,
}

impl SavingsLog {
    pub fn new(
        transaction_id: Uuid,
        goal_id: Uuid,
        owner_id: String,
        amount_cents: MoneyCents,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            goal_id,
            owner_id,
            amount_cents,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "savings_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub goal_id: String,
    pub owner_id: String,
    pub amount_cents: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::goals::Entity",
        from = "Column::GoalId",
        to = "super::goals::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Goals,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SavingsLog> for ActiveModel {
    fn from(log: &SavingsLog) -> Self {
        Self {
            id: ActiveValue::Set(log.id.to_string()),
            transaction_id: ActiveValue::Set(log.transaction_id.to_string()),
            goal_id: ActiveValue::Set(log.goal_id.to_string()),
            owner_id: ActiveValue::Set(log.owner_id.clone()),
            amount_cents: ActiveValue::Set(log.amount_cents.cents()),
            created_at: ActiveValue::Set(log.created_at),
        }
    }
}

impl TryFrom<Model> for SavingsLog {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "savings log")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            goal_id: parse_uuid(&model.goal_id, "goal")?,
            owner_id: model.owner_id,
            amount_cents: MoneyCents::new(model.amount_cents),
            created_at: model.created_at,
        })
    }
}
