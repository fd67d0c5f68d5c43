use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Budget, BudgetCmd, EngineError, ResultEngine, UpdateBudgetCmd, accounts, budgets, categories,
    util::ensure_positive_amount,
};

use super::{Engine, with_tx};

fn validate_budget_cmd(cmd: &BudgetCmd) -> ResultEngine<()> {
    if cmd.category_id.is_some() == cmd.account_id.is_some() {
        return Err(EngineError::InvalidBudget(
            "a budget targets exactly one category or account".to_string(),
        ));
    }
    ensure_positive_amount(cmd.amount)?;
    if cmd.period_start > cmd.period_end {
        return Err(EngineError::InvalidBudget(
            "period_start must be <= period_end".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Creates a budget over a category or an account of the same owner.
    pub async fn new_budget(&self, cmd: BudgetCmd) -> ResultEngine<Uuid> {
        validate_budget_cmd(&cmd)?;

        with_tx!(self, |db_tx| {
            self.require_budget_target(&db_tx, &cmd).await?;

            let id = Uuid::new_v4();
            budgets::ActiveModel {
                id: ActiveValue::Set(id),
                owner: ActiveValue::Set(cmd.owner.clone()),
                category_id: ActiveValue::Set(cmd.category_id),
                account_id: ActiveValue::Set(cmd.account_id),
                amount: ActiveValue::Set(cmd.amount.cents()),
                period_start: ActiveValue::Set(cmd.period_start),
                period_end: ActiveValue::Set(cmd.period_end),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    /// All budgets of `owner`, by period start.
    pub async fn budgets(&self, owner: &str) -> ResultEngine<Vec<Budget>> {
        with_tx!(self, |db_tx| {
            let models = budgets::Entity::find()
                .filter(budgets::Column::Owner.eq(owner))
                .order_by_asc(budgets::Column::PeriodStart)
                .order_by_asc(budgets::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Budget::try_from).collect()
        })
    }

    /// Patches a budget. The merged budget is validated like a new one.
    pub async fn update_budget(&self, cmd: UpdateBudgetCmd) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_owned_locked::<budgets::Entity>(&db_tx, cmd.budget_id, &cmd.owner)
                .await?;
            let current = Budget::try_from(model.clone())?;
            let merged = BudgetCmd::new(
                cmd.owner.clone(),
                cmd.target.unwrap_or(current.target),
                cmd.amount.unwrap_or(current.amount),
                cmd.period_start.unwrap_or(current.period_start),
                cmd.period_end.unwrap_or(current.period_end),
            );
            validate_budget_cmd(&merged)?;
            self.require_budget_target(&db_tx, &merged).await?;

            let mut active = budgets::ActiveModel::from(model);
            active.category_id = ActiveValue::Set(merged.category_id);
            active.account_id = ActiveValue::Set(merged.account_id);
            active.amount = ActiveValue::Set(merged.amount.cents());
            active.period_start = ActiveValue::Set(merged.period_start);
            active.period_end = ActiveValue::Set(merged.period_end);
            let model = active.update(&db_tx).await?;
            Budget::try_from(model)
        })
    }

    pub async fn delete_budget(&self, owner: &str, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_owned::<budgets::Entity>(&db_tx, budget_id, owner)
                .await?;
            budgets::Entity::delete_by_id(budget_id).exec(&db_tx).await?;
            Ok(())
        })
    }
}

impl Engine {
    async fn require_budget_target(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &BudgetCmd,
    ) -> ResultEngine<()> {
        if let Some(category_id) = cmd.category_id {
            self.require_owned::<categories::Entity>(db_tx, category_id, &cmd.owner)
                .await?;
        }
        if let Some(account_id) = cmd.account_id {
            self.require_owned::<accounts::Entity>(db_tx, account_id, &cmd.owner)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{BudgetTarget, MoneyCents};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn budget_needs_exactly_one_target() {
        let mut cmd = BudgetCmd::new(
            "alice",
            BudgetTarget::Category(Uuid::new_v4()),
            MoneyCents::new(100_00),
            date(2025, 1, 1),
            date(2025, 1, 31),
        );
        assert!(validate_budget_cmd(&cmd).is_ok());

        cmd.account_id = Some(Uuid::new_v4());
        assert!(matches!(
            validate_budget_cmd(&cmd),
            Err(EngineError::InvalidBudget(_))
        ));

        cmd.account_id = None;
        cmd.category_id = None;
        assert!(matches!(
            validate_budget_cmd(&cmd),
            Err(EngineError::InvalidBudget(_))
        ));
    }

    #[test]
    fn budget_period_and_amount_are_checked() {
        let reversed = BudgetCmd::new(
            "alice",
            BudgetTarget::Account(Uuid::new_v4()),
            MoneyCents::new(100_00),
            date(2025, 2, 1),
            date(2025, 1, 1),
        );
        assert!(matches!(
            validate_budget_cmd(&reversed),
            Err(EngineError::InvalidBudget(_))
        ));

        let single_day = BudgetCmd::new(
            "alice",
            BudgetTarget::Account(Uuid::new_v4()),
            MoneyCents::ZERO,
            date(2025, 1, 1),
            date(2025, 1, 1),
        );
        assert!(matches!(
            validate_budget_cmd(&single_day),
            Err(EngineError::InvalidAmount(_))
        ));
    }
}
