//! Request and response bodies of the HTTP API.
//!
//! Amounts travel as decimal strings (`"200.00"`), timestamps as RFC 3339 and
//! budget periods as `YYYY-MM-DD`.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        /// `cash`, `bank`, `wallet`, `credit`, `investment` or `other`
        /// (default).
        pub kind: Option<String>,
        /// Signed opening balance, booked as a transaction when non-zero.
        pub opening_balance: Option<String>,
    }

    /// Partial edit; absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub name: Option<String>,
        pub kind: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub kind: String,
        pub balance: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountListResponse {
        pub accounts: Vec<AccountView>,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Direction {
        Income,
        Expense,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub direction: Direction,
        pub parent_id: Option<Uuid>,
    }

    /// Partial edit. `"parent_id": null` detaches the category, an absent
    /// `parent_id` keeps the current parent.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        #[serde(
            default,
            deserialize_with = "present_or_null",
            skip_serializing_if = "Option::is_none"
        )]
        pub parent_id: Option<Option<Uuid>>,
    }

    fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Option::<Uuid>::deserialize(deserializer).map(Some)
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub direction: Direction,
        pub parent_id: Option<Uuid>,
        pub is_system: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub account_id: Uuid,
        pub category_id: Uuid,
        pub amount: String,
        pub occurred_at: DateTime<FixedOffset>,
        pub description: Option<String>,
        pub location: Option<String>,
        pub receipt_image_url: Option<String>,
    }

    /// Partial edit. Absent fields are left untouched; an empty text field
    /// clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub amount: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
        pub description: Option<String>,
        pub location: Option<String>,
        pub receipt_image_url: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub id: Uuid,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransferRole {
        Outgoing,
        Incoming,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub category_id: Uuid,
        pub amount: String,
        pub occurred_at: DateTime<FixedOffset>,
        pub description: Option<String>,
        pub location: Option<String>,
        pub receipt_image_url: Option<String>,
        pub transfer_id: Option<Uuid>,
        pub transfer_role: Option<TransferRole>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionUpdated {
        pub transaction: TransactionView,
        /// The mirrored leg, when the edited row belongs to a transfer.
        pub partner: Option<TransactionView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionDeleted {
        pub ids: Vec<Uuid>,
    }

    /// Query string of `GET /transactions`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        /// Inclusive lower bound.
        pub from: Option<DateTime<FixedOffset>>,
        /// Exclusive upper bound.
        pub to: Option<DateTime<FixedOffset>>,
        pub transfer_id: Option<Uuid>,
        /// Matches the description or the location.
        pub search: Option<String>,
        pub limit: Option<u64>,
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub next_cursor: Option<String>,
    }
}

pub mod transfer {
    use super::*;
    use crate::transaction::TransactionView;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_account_id: Uuid,
        pub to_account_id: Uuid,
        /// Expense category of the outgoing leg.
        pub category_id: Uuid,
        pub amount: String,
        pub occurred_at: DateTime<FixedOffset>,
        pub description: Option<String>,
        /// Copied onto both legs.
        pub location: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferCreated {
        pub transfer_id: Uuid,
        pub outgoing_id: Uuid,
        pub incoming_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub transfer_id: Uuid,
        pub outgoing: TransactionView,
        pub incoming: TransactionView,
    }
}

pub mod budget {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "kind", content = "id", rename_all = "snake_case")]
    pub enum BudgetTarget {
        Category(Uuid),
        Account(Uuid),
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        pub target: BudgetTarget,
        pub amount: String,
        pub period_start: NaiveDate,
        pub period_end: NaiveDate,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub target: Option<BudgetTarget>,
        pub amount: Option<String>,
        pub period_start: Option<NaiveDate>,
        pub period_end: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: Uuid,
        pub target: BudgetTarget,
        pub amount: String,
        pub period_start: NaiveDate,
        pub period_end: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetListResponse {
        pub budgets: Vec<BudgetView>,
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceDriftView {
        pub account_id: Uuid,
        pub cached: String,
        pub computed: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecomputeResponse {
        /// Accounts whose cached balance was repaired.
        pub drifted: Vec<BalanceDriftView>,
    }
}

#[cfg(test)]
mod tests {
    use super::category::CategoryUpdate;

    #[test]
    fn category_parent_patch_tells_null_from_absent() {
        let absent: CategoryUpdate = serde_json::from_str(r#"{"name":"Rent"}"#).unwrap();
        assert_eq!(absent.parent_id, None);

        let null: CategoryUpdate = serde_json::from_str(r#"{"parent_id":null}"#).unwrap();
        assert_eq!(null.parent_id, Some(None));

        let id = uuid::Uuid::from_u128(7);
        let set: CategoryUpdate =
            serde_json::from_str(&format!(r#"{{"parent_id":"{id}"}}"#)).unwrap();
        assert_eq!(set.parent_id, Some(Some(id)));
    }
}
