use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    BalanceDelta, DeltaPlan, EngineError, MoneyCents, ResultEngine, accounts, categories, effect,
    transactions,
    transfer::{LegRow, TransferPair},
};

use super::{Engine, with_tx};

/// An account whose cached balance disagreed with its transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    pub account_id: Uuid,
    pub cached: MoneyCents,
    pub computed: MoneyCents,
}

fn balance_overflow(account_id: Uuid) -> EngineError {
    EngineError::InvalidAmount(format!("balance overflow on account {account_id}"))
}

impl Engine {
    /// Applies a delta plan to the account balances.
    ///
    /// Accounts are locked in ascending id order so two units of work touching
    /// the same accounts can never wait on each other in a cycle.
    pub(super) async fn apply_deltas(
        &self,
        db_tx: &DatabaseTransaction,
        plan: DeltaPlan,
    ) -> ResultEngine<()> {
        let now = Utc::now();
        for BalanceDelta { account_id, delta } in plan.into_lock_order() {
            let account = accounts::Entity::find_by_id(account_id)
                .lock_exclusive()
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id}")))?;
            let balance = MoneyCents::new(account.balance)
                .checked_add(delta)
                .ok_or_else(|| balance_overflow(account_id))?;

            accounts::ActiveModel {
                id: ActiveValue::Set(account_id),
                balance: ActiveValue::Set(balance.cents()),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            }
            .update(db_tx)
            .await?;

            debug!(%account_id, delta = delta.cents(), balance = balance.cents(), "balance applied");
        }
        Ok(())
    }

    /// Rebuilds every account balance of `owner` from its transactions.
    ///
    /// - Validates every transfer pairing on the way; a corrupted transfer
    ///   aborts the whole recompute.
    /// - Returns the accounts whose cached balance was wrong, after fixing
    ///   them.
    pub async fn recompute_balances(&self, owner: &str) -> ResultEngine<Vec<BalanceDrift>> {
        with_tx!(self, |db_tx| {
            let account_models: Vec<accounts::Model> = accounts::Entity::find()
                .filter(accounts::Column::Owner.eq(owner))
                .order_by_asc(accounts::Column::Id)
                .lock_exclusive()
                .all(&db_tx)
                .await?;

            let rows: Vec<(transactions::Model, Option<categories::Model>)> =
                transactions::Entity::find()
                    .filter(transactions::Column::Owner.eq(owner))
                    .find_also_related(categories::Entity)
                    .all(&db_tx)
                    .await?;

            let mut computed: BTreeMap<Uuid, MoneyCents> = account_models
                .iter()
                .map(|account| (account.id, MoneyCents::ZERO))
                .collect();
            let mut transfers: HashMap<Uuid, Vec<LegRow>> = HashMap::new();

            for (model, category) in rows {
                let category = category.ok_or_else(|| {
                    EngineError::KeyNotFound(format!("category {}", model.category_id))
                })?;
                let direction = category.direction()?;
                let sum = computed.get_mut(&model.account_id).ok_or_else(|| {
                    EngineError::KeyNotFound(format!("account {}", model.account_id))
                })?;
                *sum = sum
                    .checked_add(effect(direction, MoneyCents::new(model.amount)))
                    .ok_or_else(|| balance_overflow(model.account_id))?;

                if let Some(link) = model.transfer_link()? {
                    transfers
                        .entry(link.transfer_id)
                        .or_default()
                        .push(LegRow { model, direction });
                }
            }

            for (transfer_id, legs) in transfers {
                if let Err(err) = TransferPair::resolve(transfer_id, legs) {
                    warn!(%transfer_id, error = %err, "corrupted transfer found during recompute");
                    return Err(err);
                }
            }

            let now = Utc::now();
            let mut drifted = Vec::new();
            for account in account_models {
                let cached = MoneyCents::new(account.balance);
                let computed = computed.get(&account.id).copied().unwrap_or_default();
                if cached == computed {
                    continue;
                }
                warn!(
                    account_id = %account.id,
                    cached = cached.cents(),
                    computed = computed.cents(),
                    "account balance drifted"
                );
                accounts::ActiveModel {
                    id: ActiveValue::Set(account.id),
                    balance: ActiveValue::Set(computed.cents()),
                    updated_at: ActiveValue::Set(now),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
                drifted.push(BalanceDrift {
                    account_id: account.id,
                    cached,
                    computed,
                });
            }

            Ok(drifted)
        })
    }
}
