//! Spending limits over a calendar period.
//!
//! Budgets are plain records: the ledger never reads or writes them.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

/// What a budget limits: exactly one category or one account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum BudgetTarget {
    Category(Uuid),
    Account(Uuid),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub owner: String,
    pub target: BudgetTarget,
    pub amount: MoneyCents,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner: String,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub amount: i64,
    pub period_start: Date,
    pub period_end: Date,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Categories,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let target = match (model.category_id, model.account_id) {
            (Some(category_id), None) => BudgetTarget::Category(category_id),
            (None, Some(account_id)) => BudgetTarget::Account(account_id),
            _ => {
                return Err(EngineError::InvalidBudget(format!(
                    "budget {} must target exactly one category or account",
                    model.id
                )));
            }
        };
        Ok(Self {
            id: model.id,
            owner: model.owner,
            target,
            amount: MoneyCents::new(model.amount),
            period_start: model.period_start,
            period_end: model.period_end,
            created_at: model.created_at,
        })
    }
}
