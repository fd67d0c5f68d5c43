use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};
use tracing::debug;
use uuid::Uuid;

use crate::{
    AppliedUpdate, DeltaPlan, Direction, EngineError, LedgerState, MoneyCents, ResultEngine,
    Transaction, TransferRole, UpdateTransactionCmd, accounts, categories, transactions,
    transfer::{
        LegRow, TransferPair, incoming_description, required_direction, strip_incoming_prefix,
    },
    util::{apply_optional_datetime_patch, apply_optional_text_patch, ensure_positive_amount},
};

use super::super::{
    super::{Engine, with_tx},
    ledger_state,
};

/// New values of the ledger columns of one row.
struct RowChange {
    account_id: Uuid,
    category_id: Uuid,
    direction: Direction,
    amount: i64,
    occurred_at: DateTime<Utc>,
    description: Option<String>,
    location: Option<String>,
    receipt_image_url: Option<String>,
}

impl RowChange {
    fn ledger_state(&self) -> LedgerState {
        LedgerState {
            account_id: self.account_id,
            direction: self.direction,
            amount: MoneyCents::new(self.amount),
        }
    }
}

async fn write_row(
    db_tx: &DatabaseTransaction,
    model: transactions::Model,
    change: &RowChange,
) -> ResultEngine<transactions::Model> {
    let mut active = transactions::ActiveModel::from(model);
    active.account_id = ActiveValue::Set(change.account_id);
    active.category_id = ActiveValue::Set(change.category_id);
    active.amount = ActiveValue::Set(change.amount);
    active.occurred_at = ActiveValue::Set(change.occurred_at);
    active.description = ActiveValue::Set(change.description.clone());
    active.location = ActiveValue::Set(change.location.clone());
    active.receipt_image_url = ActiveValue::Set(change.receipt_image_url.clone());
    active.updated_at = ActiveValue::Set(Utc::now());
    active.update(db_tx).await.map_err(Into::into)
}

impl Engine {
    /// Edits a transaction and moves the affected balances accordingly.
    ///
    /// On a transfer leg:
    /// - the account cannot change (`ImmutableTransferAccount`)
    /// - a new category must keep the leg's direction
    ///   (`InvalidTransferCategory`)
    /// - amount and date are mirrored onto the partner leg
    /// - a description edit through either leg sets the transfer description;
    ///   the incoming leg's description is re-derived from it, so the
    ///   incoming text read back and written unchanged is a no-op
    /// - `location` and `receipt_image_url` only change the targeted leg
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<AppliedUpdate> {
        if let Some(amount) = cmd.amount {
            ensure_positive_amount(amount)?;
        }

        with_tx!(self, |db_tx| {
            let model = self
                .require_owned_locked::<transactions::Entity>(&db_tx, cmd.transaction_id, &cmd.owner)
                .await?;
            let applied = match model.transfer_link()? {
                None => self.update_single(&db_tx, &cmd, model).await?,
                Some(link) => {
                    let pair = self
                        .load_transfer_pair(&db_tx, link.transfer_id, &cmd.owner)
                        .await?;
                    if pair.role_of(model.id) != Some(link.role) {
                        return Err(EngineError::CorruptedTransferState(format!(
                            "transaction {} is not the {} leg of transfer {}",
                            model.id,
                            link.role.as_str(),
                            link.transfer_id
                        )));
                    }
                    self.update_transfer_leg(&db_tx, &cmd, pair, link.role)
                        .await?
                }
            };
            Ok(applied)
        })
    }

    async fn update_single(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &UpdateTransactionCmd,
        model: transactions::Model,
    ) -> ResultEngine<AppliedUpdate> {
        let old_direction = self.category_direction(db_tx, model.category_id).await?;

        let account_id = match cmd.account_id {
            Some(account_id) => {
                self.require_owned::<accounts::Entity>(db_tx, account_id, &cmd.owner)
                    .await?
                    .id
            }
            None => model.account_id,
        };
        let (category_id, direction) = match cmd.category_id {
            Some(category_id) => {
                let category = self
                    .require_owned::<categories::Entity>(db_tx, category_id, &cmd.owner)
                    .await?;
                (category.id, category.direction()?)
            }
            None => (model.category_id, old_direction),
        };
        let change = RowChange {
            account_id,
            category_id,
            direction,
            amount: cmd.amount.map_or(model.amount, |amount| amount.cents()),
            occurred_at: apply_optional_datetime_patch(model.occurred_at, cmd.occurred_at),
            description: apply_optional_text_patch(
                model.description.clone(),
                cmd.description.as_deref(),
            ),
            location: apply_optional_text_patch(model.location.clone(), cmd.location.as_deref()),
            receipt_image_url: apply_optional_text_patch(
                model.receipt_image_url.clone(),
                cmd.receipt_image_url.as_deref(),
            ),
        };

        let plan = DeltaPlan::compute(
            Some(&ledger_state(&model, old_direction)),
            Some(&change.ledger_state()),
        )?;
        let updated = write_row(db_tx, model, &change).await?;
        self.apply_deltas(db_tx, plan).await?;

        debug!(transaction_id = %updated.id, "transaction updated");
        Ok(AppliedUpdate {
            transaction: Transaction::try_from(updated)?,
            partner: None,
        })
    }

    async fn update_transfer_leg(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &UpdateTransactionCmd,
        pair: TransferPair,
        role: TransferRole,
    ) -> ResultEngine<AppliedUpdate> {
        let transfer_id = pair.transfer_id;
        let target = pair.leg(role);

        if let Some(account_id) = cmd.account_id
            && account_id != target.model.account_id
        {
            return Err(EngineError::ImmutableTransferAccount(format!(
                "the {} leg of transfer {transfer_id} cannot move to another account",
                role.as_str()
            )));
        }
        let target_category_id = match cmd.category_id {
            Some(category_id) => {
                let category = self
                    .require_owned::<categories::Entity>(db_tx, category_id, &cmd.owner)
                    .await?;
                if category.direction()? != required_direction(role) {
                    return Err(EngineError::InvalidTransferCategory(format!(
                        "the {} leg of transfer {transfer_id} requires an {} category",
                        role.as_str(),
                        required_direction(role).as_str()
                    )));
                }
                category.id
            }
            None => target.model.category_id,
        };

        let amount = cmd.amount.map_or(target.model.amount, |amount| amount.cents());
        let occurred_at = apply_optional_datetime_patch(target.model.occurred_at, cmd.occurred_at);
        let from_account = self
            .require_owned::<accounts::Entity>(db_tx, pair.outgoing.model.account_id, &cmd.owner)
            .await?;
        let description_patch = match (role, cmd.description.as_deref()) {
            (TransferRole::Incoming, Some(text)) => {
                Some(strip_incoming_prefix(&from_account.name, text))
            }
            (_, patch) => patch,
        };
        let base_description = apply_optional_text_patch(
            pair.outgoing.model.description.clone(),
            description_patch,
        );

        let change_for = |leg: &LegRow, leg_role: TransferRole| {
            let targeted = leg_role == role;
            RowChange {
                account_id: leg.model.account_id,
                category_id: if targeted {
                    target_category_id
                } else {
                    leg.model.category_id
                },
                direction: leg.direction,
                amount,
                occurred_at,
                description: match leg_role {
                    TransferRole::Outgoing => base_description.clone(),
                    TransferRole::Incoming => Some(incoming_description(
                        &from_account.name,
                        base_description.as_deref(),
                    )),
                },
                location: if targeted {
                    apply_optional_text_patch(leg.model.location.clone(), cmd.location.as_deref())
                } else {
                    leg.model.location.clone()
                },
                receipt_image_url: if targeted {
                    apply_optional_text_patch(
                        leg.model.receipt_image_url.clone(),
                        cmd.receipt_image_url.as_deref(),
                    )
                } else {
                    leg.model.receipt_image_url.clone()
                },
            }
        };
        let outgoing_change = change_for(&pair.outgoing, TransferRole::Outgoing);
        let incoming_change = change_for(&pair.incoming, TransferRole::Incoming);

        let mut plan = DeltaPlan::new();
        plan.add_change(
            Some(&ledger_state(&pair.outgoing.model, pair.outgoing.direction)),
            Some(&outgoing_change.ledger_state()),
        )?;
        plan.add_change(
            Some(&ledger_state(&pair.incoming.model, pair.incoming.direction)),
            Some(&incoming_change.ledger_state()),
        )?;

        let TransferPair {
            outgoing, incoming, ..
        } = pair;
        let outgoing = write_row(db_tx, outgoing.model, &outgoing_change).await?;
        let incoming = write_row(db_tx, incoming.model, &incoming_change).await?;
        self.apply_deltas(db_tx, plan).await?;

        debug!(%transfer_id, amount, "transfer updated");
        let (target, partner) = match role {
            TransferRole::Outgoing => (outgoing, incoming),
            TransferRole::Incoming => (incoming, outgoing),
        };
        Ok(AppliedUpdate {
            transaction: Transaction::try_from(target)?,
            partner: Some(Transaction::try_from(partner)?),
        })
    }
}
