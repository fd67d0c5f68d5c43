//! Category registry per owner.
//!
//! A category's [`Direction`] is what gives a transaction its sign: amounts
//! are always stored positive.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for Direction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidName(format!(
                "invalid category direction: {other}"
            ))),
        }
    }
}

/// Categories the engine materializes on first use, once per owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SystemCategory {
    /// Income side of every transfer.
    TransferIn,
    /// Positive opening balance of a new account.
    OpeningIncome,
    /// Negative opening balance of a new account.
    OpeningExpense,
}

impl SystemCategory {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::TransferIn => "Transfer In",
            Self::OpeningIncome | Self::OpeningExpense => "Opening Balance",
        }
    }

    pub(crate) fn direction(self) -> Direction {
        match self {
            Self::TransferIn | Self::OpeningIncome => Direction::Income,
            Self::OpeningExpense => Direction::Expense,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub direction: Direction,
    pub parent_id: Option<Uuid>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub name_norm: String,
    pub direction: String,
    pub parent_id: Option<Uuid>,
    pub is_system: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Parent,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn direction(&self) -> Result<Direction, EngineError> {
        Direction::try_from(self.direction.as_str())
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            direction: model.direction()?,
            id: model.id,
            owner: model.owner,
            name: model.name,
            parent_id: model.parent_id,
            is_system: model.is_system,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parses_storage_string() {
        assert_eq!(Direction::try_from("expense").unwrap(), Direction::Expense);
        assert!(Direction::try_from("transfer").is_err());
    }

    #[test]
    fn opening_balance_categories_differ_only_by_direction() {
        assert_eq!(
            SystemCategory::OpeningIncome.name(),
            SystemCategory::OpeningExpense.name()
        );
        assert_ne!(
            SystemCategory::OpeningIncome.direction(),
            SystemCategory::OpeningExpense.direction()
        );
        assert_eq!(SystemCategory::TransferIn.direction(), Direction::Income);
    }
}
