use chrono::Utc;
use sea_orm::{TransactionTrait, prelude::*};
use tracing::debug;
use uuid::Uuid;

use crate::{
    DeltaPlan, Direction, EngineError, ResultEngine, Transaction, TransferCmd, TransferCreated,
    TransferLink, TransferRole, accounts, categories,
    categories::SystemCategory,
    transactions,
    transfer::incoming_description,
    util::{ensure_positive_amount, normalize_optional_text},
};

use super::super::{
    super::{Engine, with_tx},
    planned_state,
};

impl Engine {
    /// Moves money between two accounts of the same owner.
    ///
    /// Writes two rows sharing a fresh transfer id:
    /// - outgoing leg on `from_account_id` under the given expense category
    /// - incoming leg on `to_account_id` under the owner's "Transfer In"
    ///   income category, described as `Transfer from {from}: {description}`
    ///
    /// Both balances move in the same unit of work, or neither does.
    pub async fn submit_transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferCreated> {
        ensure_positive_amount(cmd.amount)?;
        if cmd.from_account_id == cmd.to_account_id {
            return Err(EngineError::InvalidTransfer(
                "from_account_id and to_account_id must differ".to_string(),
            ));
        }
        let description = normalize_optional_text(cmd.description.as_deref());
        let location = normalize_optional_text(cmd.location.as_deref());

        with_tx!(self, |db_tx| {
            let from_account = self
                .require_owned::<accounts::Entity>(&db_tx, cmd.from_account_id, &cmd.owner)
                .await?;
            self.require_owned::<accounts::Entity>(&db_tx, cmd.to_account_id, &cmd.owner)
                .await?;
            let category = self
                .require_owned::<categories::Entity>(&db_tx, cmd.category_id, &cmd.owner)
                .await?;
            if category.direction()? != Direction::Expense {
                return Err(EngineError::InvalidTransferCategory(format!(
                    "category {} is not an expense category",
                    category.name
                )));
            }
            let transfer_in = self
                .system_category(&db_tx, &cmd.owner, SystemCategory::TransferIn)
                .await?;

            let transfer_id = Uuid::new_v4();
            let now = Utc::now();
            let leg = |role: TransferRole,
                       account_id: Uuid,
                       category_id: Uuid,
                       description: Option<String>| {
                Transaction {
                    id: Uuid::new_v4(),
                    owner: cmd.owner.clone(),
                    account_id,
                    category_id,
                    amount: cmd.amount,
                    occurred_at: cmd.occurred_at,
                    description,
                    location: location.clone(),
                    receipt_image_url: None,
                    transfer: Some(TransferLink { transfer_id, role }),
                    created_at: now,
                    updated_at: now,
                }
            };
            let outgoing = leg(
                TransferRole::Outgoing,
                cmd.from_account_id,
                category.id,
                description.clone(),
            );
            let incoming = leg(
                TransferRole::Incoming,
                cmd.to_account_id,
                transfer_in.id,
                Some(incoming_description(
                    &from_account.name,
                    description.as_deref(),
                )),
            );

            let mut plan = DeltaPlan::new();
            plan.add_change(None, Some(&planned_state(&outgoing, Direction::Expense)))?;
            plan.add_change(None, Some(&planned_state(&incoming, Direction::Income)))?;

            transactions::ActiveModel::from(&outgoing)
                .insert(&db_tx)
                .await?;
            transactions::ActiveModel::from(&incoming)
                .insert(&db_tx)
                .await?;
            self.apply_deltas(&db_tx, plan).await?;

            debug!(
                %transfer_id,
                from_account_id = %cmd.from_account_id,
                to_account_id = %cmd.to_account_id,
                amount = cmd.amount.cents(),
                "transfer booked"
            );
            Ok(TransferCreated {
                transfer_id,
                outgoing_id: outgoing.id,
                incoming_id: incoming.id,
            })
        })
    }
}
