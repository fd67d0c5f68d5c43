use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    Account, AccountKind, EngineError, MoneyCents, ResultEngine, Transaction, UpdateAccountCmd,
    accounts, budgets,
    categories::SystemCategory,
    transactions,
    util::{normalize_name_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates an account for `owner`.
    ///
    /// A non-zero `opening_balance` is booked as a regular transaction under
    /// the owner's "Opening Balance" category (income when positive, expense
    /// when negative), so the cached balance always matches the history.
    pub async fn new_account(
        &self,
        owner: &str,
        name: &str,
        kind: AccountKind,
        opening_balance: MoneyCents,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "account")?;
        let name_norm = normalize_name_key(&name);
        let opening_amount = opening_balance.checked_abs().ok_or_else(|| {
            EngineError::InvalidAmount("opening balance out of range".to_string())
        })?;

        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, owner).await?;
            self.ensure_account_name_free(&db_tx, owner, &name_norm, None)
                .await?;

            let id = Uuid::new_v4();
            let now = Utc::now();
            accounts::ActiveModel {
                id: ActiveValue::Set(id),
                owner: ActiveValue::Set(owner.to_string()),
                name: ActiveValue::Set(name),
                name_norm: ActiveValue::Set(name_norm),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                balance: ActiveValue::Set(0),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            if !opening_balance.is_zero() {
                self.book_opening_balance(&db_tx, owner, id, opening_balance, opening_amount, now)
                    .await?;
            }

            debug!(account_id = %id, opening_balance = opening_balance.cents(), "account created");
            Ok(id)
        })
    }

    async fn book_opening_balance(
        &self,
        db_tx: &DatabaseTransaction,
        owner: &str,
        account_id: Uuid,
        opening_balance: MoneyCents,
        amount: MoneyCents,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let kind = if opening_balance.is_negative() {
            SystemCategory::OpeningExpense
        } else {
            SystemCategory::OpeningIncome
        };
        let category = self.system_category(db_tx, owner, kind).await?;
        let tx = Transaction {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            account_id,
            category_id: category.id,
            amount,
            occurred_at: now,
            description: Some(kind.name().to_string()),
            location: None,
            receipt_image_url: None,
            transfer: None,
            created_at: now,
            updated_at: now,
        };
        self.book_transaction(db_tx, &tx, kind.direction()).await
    }

    pub async fn account(&self, owner: &str, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_owned::<accounts::Entity>(&db_tx, account_id, owner)
                .await?;
            Account::try_from(model)
        })
    }

    /// All accounts of `owner`, ordered by name.
    pub async fn accounts(&self, owner: &str) -> ResultEngine<Vec<Account>> {
        with_tx!(self, |db_tx| {
            let models = accounts::Entity::find()
                .filter(accounts::Column::Owner.eq(owner))
                .order_by_asc(accounts::Column::NameNorm)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Account::try_from).collect()
        })
    }

    /// Renames an account. The balance is untouched.
    pub async fn rename_account(
        &self,
        owner: &str,
        account_id: Uuid,
        name: &str,
    ) -> ResultEngine<Account> {
        self.update_account(UpdateAccountCmd::new(owner, account_id).name(name))
            .await
    }

    /// Changes the name and/or kind of an account.
    pub async fn update_account(&self, cmd: UpdateAccountCmd) -> ResultEngine<Account> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "account"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_owned_locked::<accounts::Entity>(&db_tx, cmd.account_id, &cmd.owner)
                .await?;

            let mut active = accounts::ActiveModel::from(model);
            if let Some(name) = name {
                let name_norm = normalize_name_key(&name);
                self.ensure_account_name_free(&db_tx, &cmd.owner, &name_norm, Some(cmd.account_id))
                    .await?;
                active.name = ActiveValue::Set(name);
                active.name_norm = ActiveValue::Set(name_norm);
            }
            if let Some(kind) = cmd.kind {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;
            Account::try_from(model)
        })
    }

    /// Deletes an account that has no transactions, with its budgets.
    ///
    /// Transactions are never removed implicitly: delete them first (the
    /// opening balance included) so every balance they touched is reversed.
    pub async fn delete_account(&self, owner: &str, account_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_owned_locked::<accounts::Entity>(&db_tx, account_id, owner)
                .await?;
            let booked = transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(account_id))
                .count(&db_tx)
                .await?;
            if booked > 0 {
                return Err(EngineError::ResourceInUse(format!(
                    "account {} has {booked} transactions",
                    model.name
                )));
            }

            budgets::Entity::delete_many()
                .filter(budgets::Column::AccountId.eq(account_id))
                .exec(&db_tx)
                .await?;
            accounts::Entity::delete_by_id(account_id)
                .exec(&db_tx)
                .await?;

            debug!(%account_id, "account deleted");
            Ok(())
        })
    }

    async fn ensure_account_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        owner: &str,
        name_norm: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::Owner.eq(owner))
            .filter(accounts::Column::NameNorm.eq(name_norm));
        if let Some(except) = except {
            query = query.filter(accounts::Column::Id.ne(except));
        }
        if let Some(existing) = query.one(db_tx).await? {
            return Err(EngineError::ExistingKey(existing.name));
        }
        Ok(())
    }
}
