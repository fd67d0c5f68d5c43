use sea_orm::{DatabaseTransaction, prelude::*};

use crate::{DeltaPlan, Direction, ResultEngine, Transaction, transactions};

use super::{super::Engine, planned_state};

mod create;
mod delete;
mod transfer;
mod update;

impl Engine {
    /// Inserts a row that is not part of a transfer and applies its effect.
    pub(in crate::ops) async fn book_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
        direction: Direction,
    ) -> ResultEngine<()> {
        let plan = DeltaPlan::compute(None, Some(&planned_state(tx, direction)))?;
        transactions::ActiveModel::from(tx).insert(db_tx).await?;
        self.apply_deltas(db_tx, plan).await
    }
}
