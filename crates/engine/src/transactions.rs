//! Transaction primitives.
//!
//! A `Transaction` books a positive `amount` on one account under one
//! category. Two transactions sharing a `transfer_id` form a transfer: one
//! outgoing (expense) leg and one incoming (income) leg.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferRole {
    Outgoing,
    Incoming,
}

impl TransferRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
        }
    }
}

impl TryFrom<&str> for TransferRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "outgoing" => Ok(Self::Outgoing),
            "incoming" => Ok(Self::Incoming),
            other => Err(EngineError::CorruptedTransferState(format!(
                "invalid transfer role: {other}"
            ))),
        }
    }
}

/// Membership of a transaction in a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLink {
    pub transfer_id: Uuid,
    pub role: TransferRole,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner: String,
    pub account_id: Uuid,
    pub category_id: Uuid,
    /// Always positive; the sign comes from the category direction.
    pub amount: MoneyCents,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    /// Where the money was spent or received. Not used by the ledger.
    pub location: Option<String>,
    pub receipt_image_url: Option<String>,
    pub transfer: Option<TransferLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[must_use]
    pub fn transfer_id(&self) -> Option<Uuid> {
        self.transfer.map(|link| link.transfer_id)
    }
}

/// Ids of the two legs written by a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCreated {
    pub transfer_id: Uuid,
    pub outgoing_id: Uuid,
    pub incoming_id: Uuid,
}

/// Result of an update: the edited row, plus the mirrored partner leg when
/// the row belongs to a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedUpdate {
    pub transaction: Transaction,
    pub partner: Option<Transaction>,
}

/// Ids of every row removed by a delete (one, or both transfer legs).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedTransactions {
    pub ids: Vec<Uuid>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner: String,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub amount: i64,
    pub occurred_at: DateTimeUtc,
    pub description: Option<String>,
    pub location: Option<String>,
    pub receipt_image_url: Option<String>,
    pub transfer_id: Option<Uuid>,
    pub transfer_role: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Categories,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Reads the stored transfer columns. They are both null or both set.
    pub(crate) fn transfer_link(&self) -> Result<Option<TransferLink>, EngineError> {
        match (self.transfer_id, self.transfer_role.as_deref()) {
            (None, None) => Ok(None),
            (Some(transfer_id), Some(role)) => Ok(Some(TransferLink {
                transfer_id,
                role: TransferRole::try_from(role)?,
            })),
            _ => Err(EngineError::CorruptedTransferState(format!(
                "transaction {} has a partial transfer link",
                self.id
            ))),
        }
    }
}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            owner: ActiveValue::Set(tx.owner.clone()),
            account_id: ActiveValue::Set(tx.account_id),
            category_id: ActiveValue::Set(tx.category_id),
            amount: ActiveValue::Set(tx.amount.cents()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            description: ActiveValue::Set(tx.description.clone()),
            location: ActiveValue::Set(tx.location.clone()),
            receipt_image_url: ActiveValue::Set(tx.receipt_image_url.clone()),
            transfer_id: ActiveValue::Set(tx.transfer_id()),
            transfer_role: ActiveValue::Set(tx.transfer.map(|l| l.role.as_str().to_string())),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let transfer = model.transfer_link()?;
        Ok(Self {
            id: model.id,
            owner: model.owner,
            account_id: model.account_id,
            category_id: model.category_id,
            amount: MoneyCents::new(model.amount),
            occurred_at: model.occurred_at,
            description: model.description,
            location: model.location,
            receipt_image_url: model.receipt_image_url,
            transfer,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(transfer_id: Option<Uuid>, role: Option<&str>) -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            owner: "alice".to_string(),
            account_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            amount: 300_00,
            occurred_at: now,
            description: None,
            location: None,
            receipt_image_url: None,
            transfer_id,
            transfer_role: role.map(ToString::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn plain_row_has_no_transfer_link() {
        let tx = Transaction::try_from(model(None, None)).unwrap();
        assert_eq!(tx.transfer, None);
        assert_eq!(tx.amount, MoneyCents::new(300_00));
    }

    #[test]
    fn transfer_columns_are_read_together() {
        let transfer_id = Uuid::new_v4();
        let tx = Transaction::try_from(model(Some(transfer_id), Some("incoming"))).unwrap();
        assert_eq!(
            tx.transfer,
            Some(TransferLink {
                transfer_id,
                role: TransferRole::Incoming
            })
        );
    }

    #[test]
    fn partial_or_unknown_link_is_corrupted() {
        assert!(matches!(
            Transaction::try_from(model(Some(Uuid::new_v4()), None)),
            Err(EngineError::CorruptedTransferState(_))
        ));
        assert!(matches!(
            Transaction::try_from(model(None, Some("outgoing"))),
            Err(EngineError::CorruptedTransferState(_))
        ));
        assert!(matches!(
            Transaction::try_from(model(Some(Uuid::new_v4()), Some("sideways"))),
            Err(EngineError::CorruptedTransferState(_))
        ));
    }
}
