use chrono::Utc;
use sea_orm::TransactionTrait;
use tracing::debug;
use uuid::Uuid;

use crate::{
    ResultEngine, Transaction, TransactionCmd, accounts, categories,
    util::{ensure_positive_amount, normalize_optional_text},
};

use super::super::super::{Engine, with_tx};

impl Engine {
    /// Books a transaction on one account.
    ///
    /// The account balance moves by `+amount` under an income category and by
    /// `-amount` under an expense category, in the same unit of work as the
    /// row insert.
    pub async fn submit_transaction(&self, cmd: TransactionCmd) -> ResultEngine<Uuid> {
        ensure_positive_amount(cmd.amount)?;
        let description = normalize_optional_text(cmd.description.as_deref());
        let location = normalize_optional_text(cmd.location.as_deref());
        let receipt_image_url = normalize_optional_text(cmd.receipt_image_url.as_deref());

        with_tx!(self, |db_tx| {
            self.require_owned::<accounts::Entity>(&db_tx, cmd.account_id, &cmd.owner)
                .await?;
            let category = self
                .require_owned::<categories::Entity>(&db_tx, cmd.category_id, &cmd.owner)
                .await?;
            let direction = category.direction()?;

            let now = Utc::now();
            let tx = Transaction {
                id: Uuid::new_v4(),
                owner: cmd.owner.clone(),
                account_id: cmd.account_id,
                category_id: cmd.category_id,
                amount: cmd.amount,
                occurred_at: cmd.occurred_at,
                description,
                location,
                receipt_image_url,
                transfer: None,
                created_at: now,
                updated_at: now,
            };
            self.book_transaction(&db_tx, &tx, direction).await?;

            debug!(
                transaction_id = %tx.id,
                account_id = %tx.account_id,
                amount = tx.amount.cents(),
                direction = direction.as_str(),
                "transaction booked"
            );
            Ok(tx.id)
        })
    }
}
