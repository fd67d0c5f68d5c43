use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use tracing::debug;
use uuid::Uuid;

use crate::{DeletedTransactions, DeltaPlan, ResultEngine, transactions};

use super::super::{
    super::{Engine, with_tx},
    ledger_state,
};

impl Engine {
    /// Deletes a transaction and reverses its effect.
    ///
    /// Deleting either leg of a transfer deletes both. The reversal of both
    /// accounts is computed once from the outgoing leg's side, whichever leg
    /// was targeted.
    pub async fn delete_transaction(
        &self,
        owner: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<DeletedTransactions> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_owned_locked::<transactions::Entity>(&db_tx, transaction_id, owner)
                .await?;

            let mut plan = DeltaPlan::new();
            let ids = match model.transfer_link()? {
                None => {
                    let direction = self.category_direction(&db_tx, model.category_id).await?;
                    plan.add_change(Some(&ledger_state(&model, direction)), None)?;
                    vec![model.id]
                }
                Some(link) => {
                    let pair = self
                        .load_transfer_pair(&db_tx, link.transfer_id, owner)
                        .await?;
                    let driving = &pair.outgoing;
                    let partner = &pair.incoming;
                    plan.add_change(Some(&ledger_state(&driving.model, driving.direction)), None)?;
                    plan.add_change(Some(&ledger_state(&partner.model, partner.direction)), None)?;

                    if model.id == driving.model.id {
                        vec![driving.model.id, partner.model.id]
                    } else {
                        vec![partner.model.id, driving.model.id]
                    }
                }
            };

            transactions::Entity::delete_many()
                .filter(transactions::Column::Id.is_in(ids.clone()))
                .exec(&db_tx)
                .await?;
            self.apply_deltas(&db_tx, plan).await?;

            debug!(?ids, "transactions deleted");
            Ok(DeletedTransactions { ids })
        })
    }
}
