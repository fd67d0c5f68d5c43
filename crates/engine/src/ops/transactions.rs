use sea_orm::{DatabaseTransaction, QueryFilter, QuerySelect, TransactionTrait, prelude::*};
use tracing::warn;
use uuid::Uuid;

use crate::{
    Direction, EngineError, LedgerState, MoneyCents, ResultEngine, Transaction, categories,
    transactions,
    transfer::{LegRow, TransferPair},
};

use super::{Engine, with_tx};

mod list;
mod write;

pub use list::TransactionListFilter;

pub(super) fn ledger_state(model: &transactions::Model, direction: Direction) -> LedgerState {
    LedgerState {
        account_id: model.account_id,
        direction,
        amount: MoneyCents::new(model.amount),
    }
}

/// Ledger state of a row that is about to be written.
pub(super) fn planned_state(tx: &Transaction, direction: Direction) -> LedgerState {
    LedgerState {
        account_id: tx.account_id,
        direction,
        amount: tx.amount,
    }
}

impl Engine {
    /// Returns a transaction of `owner`.
    pub async fn transaction(&self, owner: &str, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_owned::<transactions::Entity>(&db_tx, transaction_id, owner)
                .await?;
            Transaction::try_from(model)
        })
    }

    /// Returns both legs of a transfer, outgoing first.
    pub async fn transfer_legs(
        &self,
        owner: &str,
        transfer_id: Uuid,
    ) -> ResultEngine<(Transaction, Transaction)> {
        with_tx!(self, |db_tx| {
            let pair = self.load_transfer_pair(&db_tx, transfer_id, owner).await?;
            Ok((
                Transaction::try_from(pair.outgoing.model)?,
                Transaction::try_from(pair.incoming.model)?,
            ))
        })
    }

    /// Direction of the category a stored row is booked under.
    pub(super) async fn category_direction(
        &self,
        db_tx: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<Direction> {
        categories::Entity::find_by_id(category_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("category {category_id}")))?
            .direction()
    }

    /// Loads and locks every row of a transfer, then checks the pairing.
    ///
    /// A transfer id with no rows is `KeyNotFound`; rows of another owner are
    /// `OwnershipViolation`; any other shape than one outgoing and one
    /// incoming leg is `CorruptedTransferState`.
    pub(super) async fn load_transfer_pair(
        &self,
        db_tx: &DatabaseTransaction,
        transfer_id: Uuid,
        owner: &str,
    ) -> ResultEngine<TransferPair> {
        let rows: Vec<(transactions::Model, Option<categories::Model>)> =
            transactions::Entity::find()
                .filter(transactions::Column::TransferId.eq(transfer_id))
                .find_also_related(categories::Entity)
                .lock_exclusive()
                .all(db_tx)
                .await?;
        if rows.is_empty() {
            return Err(EngineError::KeyNotFound(format!("transfer {transfer_id}")));
        }

        let mut legs = Vec::with_capacity(rows.len());
        for (model, category) in rows {
            if model.owner != owner {
                return Err(EngineError::OwnershipViolation(format!(
                    "transfer {transfer_id} belongs to another owner"
                )));
            }
            let category = category.ok_or_else(|| {
                EngineError::KeyNotFound(format!("category {}", model.category_id))
            })?;
            let direction = category.direction()?;
            legs.push(LegRow { model, direction });
        }

        TransferPair::resolve(transfer_id, legs).inspect_err(|err| {
            warn!(%transfer_id, error = %err, "refusing corrupted transfer");
        })
    }
}
