//! Command structs for engine operations.
//!
//! These types group parameters for write operations (transaction and goal
//! create/update), keeping call sites readable and avoiding long argument
//! lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::MoneyCents;

/// Create a transaction.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub owner_id: String,
    pub category_id: Uuid,
    pub amount_cents: MoneyCents,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub goal_id: Option<Uuid>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        category_id: Uuid,
        amount_cents: impl Into<MoneyCents>,
        date: NaiveDate,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            category_id,
            amount_cents: amount_cents.into(),
            date,
            note: None,
            goal_id: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn goal_id(mut self, goal_id: Uuid) -> Self {
        self.goal_id = Some(goal_id);
        self
    }
}

/// Update an existing transaction.
///
/// Unset fields keep their stored values. The goal reference is tri-state:
/// untouched by default, retargeted with [`goal_id`], detached with
/// [`clear_goal`].
///
/// [`goal_id`]: UpdateTransactionCmd::goal_id
/// [`clear_goal`]: UpdateTransactionCmd::clear_goal
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub owner_id: String,
    pub transaction_id: Uuid,

    pub amount_cents: Option<MoneyCents>,
    pub category_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
    pub goal: Option<Option<Uuid>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(owner_id: impl Into<String>, transaction_id: Uuid) -> Self {
        Self {
            owner_id: owner_id.into(),
            transaction_id,
            amount_cents: None,
            category_id: None,
            date: None,
            note: None,
            goal: None,
        }
    }

    #[must_use]
    pub fn amount_cents(mut self, amount_cents: impl Into<MoneyCents>) -> Self {
        self.amount_cents = Some(amount_cents.into());
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn goal_id(mut self, goal_id: Uuid) -> Self {
        self.goal = Some(Some(goal_id));
        self
    }

    #[must_use]
    pub fn clear_goal(mut self) -> Self {
        self.goal = Some(None);
        self
    }
}

/// Create a savings goal.
#[derive(Clone, Debug)]
pub struct CreateGoalCmd {
    pub name: String,
    pub target_cents: MoneyCents,
    pub category_id: Uuid,
}

impl CreateGoalCmd {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target_cents: impl Into<MoneyCents>,
        category_id: Uuid,
    ) -> Self {
        Self {
            name: name.into(),
            target_cents: target_cents.into(),
            category_id,
        }
    }
}

/// Update a savings goal's user-owned fields (name and target).
///
/// The allocated progress is derived and cannot be set through this command.
#[derive(Clone, Debug)]
pub struct UpdateGoalCmd {
    pub goal_id: Uuid,
    pub name: Option<String>,
    pub target_cents: Option<MoneyCents>,
}

impl UpdateGoalCmd {
    #[must_use]
    pub fn new(goal_id: Uuid) -> Self {
        Self {
            goal_id,
            name: None,
            target_cents: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn target_cents(mut self, target_cents: impl Into<MoneyCents>) -> Self {
        self.target_cents = Some(target_cents.into());
        self
    }
}
