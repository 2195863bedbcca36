//! Savings goals.
//!
//! A `Goal` has a user-chosen target and a derived progress amount. The
//! progress is only ever moved by the allocation rules, which keep it inside
//! `0 ..= target_cents` and backed one-to-one by savings log rows.
//!
//! # Examples
//!
//! Amounts are stored as integer cents (`MoneyCents`).
//!
//! Suppose a goal with a target of 10.00 (1000 cents) and a progress of 4.00
//! (400 cents). An allocation of 7.00 fails because only 6.00 is available;
//! an allocation of 6.00 fills the goal exactly and is accepted.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub name: String,
    pub target_cents: MoneyCents,
    pub current_cents: MoneyCents,
    pub category_id: Uuid,
}

impl Goal {
    pub fn new(name: String, target_cents: MoneyCents, category_id: Uuid) -> ResultEngine<Self> {
        if !target_cents.is_positive() {
            return Err(EngineError::Validation(
                "target_cents must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            target_cents,
            current_cents: MoneyCents::ZERO,
            category_id,
        })
    }

    /// Remaining capacity before the goal is full.
    #[must_use]
    pub fn available_cents(&self) -> MoneyCents {
        self.target_cents - self.current_cents
    }

    /// Moves `amount` into the goal, rejecting anything past the target.
    /// Filling the goal exactly is allowed.
    pub fn allocate(&mut self, amount: MoneyCents) -> ResultEngine<()> {
        let available = self.available_cents();
        if amount > available {
            return Err(EngineError::CapacityExceeded { available });
        }
        self.current_cents += amount;
        Ok(())
    }

    /// Moves `amount` back out of the goal.
    ///
    /// Progress is floor-clamped at zero; the return value reports whether
    /// the clamp fired, which means the allocation records have drifted.
    pub fn release(&mut self, amount: MoneyCents) -> bool {
        let next = self.current_cents - amount;
        if next.is_negative() {
            self.current_cents = MoneyCents::ZERO;
            true
        } else {
            self.current_cents = next;
            false
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub target_cents: i64,
    pub current_cents: i64,
    pub category_id: String,
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
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::savings_logs::Entity")]
    SavingsLogs,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::savings_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavingsLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Goal> for ActiveModel {
    fn from(goal: &Goal) -> Self {
        Self {
            id: ActiveValue::Set(goal.id.to_string()),
            name: ActiveValue::Set(goal.name.clone()),
            target_cents: ActiveValue::Set(goal.target_cents.cents()),
            current_cents: ActiveValue::Set(goal.current_cents.cents()),
            category_id: ActiveValue::Set(goal.category_id.to_string()),
        }
    }
}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "goal")?,
            name: model.name,
            target_cents: MoneyCents::new(model.target_cents),
            current_cents: MoneyCents::new(model.current_cents),
            category_id: parse_uuid(&model.category_id, "category")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(target: i64) -> Goal {
        Goal::new(
            String::from("Emergency Fund"),
            MoneyCents::new(target),
            Uuid::new_v4(),
        )
        .unwrap()
    }

    #[test]
    fn allocate_within_capacity() {
        let mut goal = goal(1000);
        goal.allocate(MoneyCents::new(400)).unwrap();

        assert_eq!(goal.current_cents, MoneyCents::new(400));
        assert_eq!(goal.available_cents(), MoneyCents::new(600));
    }

    #[test]
    fn allocate_exact_fill() {
        let mut goal = goal(1000);
        goal.allocate(MoneyCents::new(1000)).unwrap();

        assert_eq!(goal.current_cents, goal.target_cents);
        assert_eq!(goal.available_cents(), MoneyCents::ZERO);
    }

    #[test]
    fn allocate_past_target_reports_available() {
        let mut goal = goal(1000);
        goal.allocate(MoneyCents::new(400)).unwrap();

        let err = goal.allocate(MoneyCents::new(700)).unwrap_err();
        assert_eq!(
            err,
            EngineError::CapacityExceeded {
                available: MoneyCents::new(600)
            }
        );
        assert_eq!(goal.current_cents, MoneyCents::new(400));
    }

    #[test]
    fn release_restores_capacity() {
        let mut goal = goal(1000);
        goal.allocate(MoneyCents::new(400)).unwrap();

        assert!(!goal.release(MoneyCents::new(400)));
        assert_eq!(goal.current_cents, MoneyCents::ZERO);
    }

    #[test]
    fn release_clamps_at_zero() {
        let mut goal = goal(1000);
        goal.allocate(MoneyCents::new(100)).unwrap();

        assert!(goal.release(MoneyCents::new(250)));
        assert_eq!(goal.current_cents, MoneyCents::ZERO);
    }

    #[test]
    fn rejects_non_positive_target() {
        let err = Goal::new(String::from("Bad"), MoneyCents::ZERO, Uuid::new_v4()).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("target_cents must be > 0".to_string())
        );
    }
}
