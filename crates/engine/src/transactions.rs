//! Transaction primitives.
//!
//! A `Transaction` is a single user-recorded financial event. Whether it
//! counts toward a savings goal is decided by its category kind and its
//! optional goal reference; the allocation itself is tracked separately in
//! the savings logs.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: String,
    pub category_id: Uuid,
    pub goal_id: Option<Uuid>,
    pub amount_cents: MoneyCents,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        owner_id: String,
        category_id: Uuid,
        goal_id: Option<Uuid>,
        amount_cents: MoneyCents,
        date: NaiveDate,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        if !amount_cents.is_positive() {
            return Err(EngineError::Validation(
                "amount_cents must be > 0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            category_id,
            goal_id,
            amount_cents,
            date,
            note,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub category_id: String,
    pub goal_id: Option<String>,
    pub amount_cents: i64,
    pub date: Date,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Categories,
    #[sea_orm(
        belongs_to = "super::goals::Entity",
        from = "Column::GoalId",
        to = "super::goals::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Goals,
    #[sea_orm(has_many = "super::savings_logs::Entity")]
    SavingsLogs,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl Related<super::savings_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavingsLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            owner_id: ActiveValue::Set(tx.owner_id.clone()),
            category_id: ActiveValue::Set(tx.category_id.to_string()),
            goal_id: ActiveValue::Set(tx.goal_id.map(|id| id.to_string())),
            amount_cents: ActiveValue::Set(tx.amount_cents.cents()),
            date: ActiveValue::Set(tx.date),
            note: ActiveValue::Set(tx.note.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let goal_id = match model.goal_id {
            Some(raw) => Some(parse_uuid(&raw, "goal")?),
            None => None,
        };
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            owner_id: model.owner_id,
            category_id: parse_uuid(&model.category_id, "category")?,
            goal_id,
            amount_cents: MoneyCents::new(model.amount_cents),
            date: model.date,
            note: model.note,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
