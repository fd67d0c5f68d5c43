//! Command structs for engine operations.
//!
//! These types group parameters for ledger writes and reference data edits,
//! keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{AccountKind, BudgetTarget, MoneyCents};

/// Book a single transaction on one account.
#[derive(Clone, Debug)]
pub struct TransactionCmd {
    pub owner: String,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub amount: MoneyCents,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub receipt_image_url: Option<String>,
}

impl TransactionCmd {
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        account_id: Uuid,
        category_id: Uuid,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner: owner.into(),
            account_id,
            category_id,
            amount,
            occurred_at,
            description: None,
            location: None,
            receipt_image_url: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn receipt_image_url(mut self, url: impl Into<String>) -> Self {
        self.receipt_image_url = Some(url.into());
        self
    }
}

/// Move money between two accounts of the same owner.
///
/// `category_id` is the expense category of the outgoing leg; the incoming
/// leg always uses the owner's "Transfer In" category. `location` is copied
/// onto both legs.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub owner: String,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub category_id: Uuid,
    pub amount: MoneyCents,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        from_account_id: Uuid,
        to_account_id: Uuid,
        category_id: Uuid,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner: owner.into(),
            from_account_id,
            to_account_id,
            category_id,
            amount,
            occurred_at,
            description: None,
            location: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Patch an existing transaction. `None` fields are left untouched.
///
/// Text fields set to an empty string are cleared.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub owner: String,
    pub transaction_id: Uuid,

    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub amount: Option<MoneyCents>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub receipt_image_url: Option<String>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(owner: impl Into<String>, transaction_id: Uuid) -> Self {
        Self {
            owner: owner.into(),
            transaction_id,
            account_id: None,
            category_id: None,
            amount: None,
            occurred_at: None,
            description: None,
            location: None,
            receipt_image_url: None,
        }
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn receipt_image_url(mut self, url: impl Into<String>) -> Self {
        self.receipt_image_url = Some(url.into());
        self
    }
}

/// Create a budget.
#[derive(Clone, Debug)]
pub struct BudgetCmd {
    pub owner: String,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub amount: MoneyCents,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

impl BudgetCmd {
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        target: BudgetTarget,
        amount: MoneyCents,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Self {
        let (category_id, account_id) = match target {
            BudgetTarget::Category(id) => (Some(id), None),
            BudgetTarget::Account(id) => (None, Some(id)),
        };
        Self {
            owner: owner.into(),
            category_id,
            account_id,
            amount,
            period_start,
            period_end,
        }
    }
}

/// Edit the budget's target, limit or period. `None` fields are left
/// untouched; the result is validated like a new budget.
#[derive(Clone, Debug)]
pub struct UpdateBudgetCmd {
    pub owner: String,
    pub budget_id: Uuid,
    pub target: Option<BudgetTarget>,
    pub amount: Option<MoneyCents>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

impl UpdateBudgetCmd {
    #[must_use]
    pub fn new(owner: impl Into<String>, budget_id: Uuid) -> Self {
        Self {
            owner: owner.into(),
            budget_id,
            target: None,
            amount: None,
            period_start: None,
            period_end: None,
        }
    }

    #[must_use]
    pub fn target(mut self, target: BudgetTarget) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.period_start = Some(start);
        self.period_end = Some(end);
        self
    }
}

/// Edit an account's name or kind. The balance is never patched.
#[derive(Clone, Debug)]
pub struct UpdateAccountCmd {
    pub owner: String,
    pub account_id: Uuid,
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
}

impl UpdateAccountCmd {
    #[must_use]
    pub fn new(owner: impl Into<String>, account_id: Uuid) -> Self {
        Self {
            owner: owner.into(),
            account_id,
            name: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: AccountKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Edit a category's name or parent. The direction is fixed at creation.
///
/// `parent_id` is `Some(None)` to detach the category from its parent.
#[derive(Clone, Debug)]
pub struct UpdateCategoryCmd {
    pub owner: String,
    pub category_id: Uuid,
    pub name: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
}

impl UpdateCategoryCmd {
    #[must_use]
    pub fn new(owner: impl Into<String>, category_id: Uuid) -> Self {
        Self {
            owner: owner.into(),
            category_id,
            name: None,
            parent_id: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn parent_id(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(Some(parent_id));
        self
    }

    #[must_use]
    pub fn clear_parent(mut self) -> Self {
        self.parent_id = Some(None);
        self
    }
}
