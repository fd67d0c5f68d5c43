//! Conversions between engine values and wire bodies.

use api_types::{
    account::AccountView,
    balance::BalanceDriftView,
    budget::{BudgetTarget as ApiBudgetTarget, BudgetView},
    category::{CategoryView, Direction as ApiDirection},
    transaction::{TransactionView, TransferRole as ApiTransferRole},
};
use engine::{
    Account, BalanceDrift, Budget, BudgetTarget, Category, Direction, MoneyCents, Transaction,
    TransferRole,
};

use crate::ServerError;

pub fn parse_amount(raw: &str) -> Result<MoneyCents, ServerError> {
    raw.parse::<MoneyCents>().map_err(ServerError::from)
}

pub fn map_direction(direction: Direction) -> ApiDirection {
    match direction {
        Direction::Income => ApiDirection::Income,
        Direction::Expense => ApiDirection::Expense,
    }
}

pub fn engine_direction(direction: ApiDirection) -> Direction {
    match direction {
        ApiDirection::Income => Direction::Income,
        ApiDirection::Expense => Direction::Expense,
    }
}

pub fn map_budget_target(target: BudgetTarget) -> ApiBudgetTarget {
    match target {
        BudgetTarget::Category(id) => ApiBudgetTarget::Category(id),
        BudgetTarget::Account(id) => ApiBudgetTarget::Account(id),
    }
}

pub fn engine_budget_target(target: ApiBudgetTarget) -> BudgetTarget {
    match target {
        ApiBudgetTarget::Category(id) => BudgetTarget::Category(id),
        ApiBudgetTarget::Account(id) => BudgetTarget::Account(id),
    }
}

pub fn map_account(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        kind: account.kind.as_str().to_string(),
        balance: account.balance.to_string(),
    }
}

pub fn map_category(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        direction: map_direction(category.direction),
        parent_id: category.parent_id,
        is_system: category.is_system,
    }
}

pub fn map_transaction(tx: Transaction) -> TransactionView {
    let (transfer_id, transfer_role) = match tx.transfer {
        Some(link) => (
            Some(link.transfer_id),
            Some(match link.role {
                TransferRole::Outgoing => ApiTransferRole::Outgoing,
                TransferRole::Incoming => ApiTransferRole::Incoming,
            }),
        ),
        None => (None, None),
    };
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        category_id: tx.category_id,
        amount: tx.amount.to_string(),
        occurred_at: tx.occurred_at.fixed_offset(),
        description: tx.description,
        location: tx.location,
        receipt_image_url: tx.receipt_image_url,
        transfer_id,
        transfer_role,
    }
}

pub fn map_budget(budget: Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        target: map_budget_target(budget.target),
        amount: budget.amount.to_string(),
        period_start: budget.period_start,
        period_end: budget.period_end,
    }
}

pub fn map_drift(drift: BalanceDrift) -> BalanceDriftView {
    BalanceDriftView {
        account_id: drift.account_id,
        cached: drift.cached.to_string(),
        computed: drift.computed.to_string(),
    }
}
