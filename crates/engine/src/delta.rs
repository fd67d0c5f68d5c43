//! Balance deltas.
//!
//! A transaction moves its account's balance by its *effect*: `+amount` under
//! an income category, `-amount` under an expense category. Every ledger
//! mutation is reduced to a [`DeltaPlan`] computed from the before/after
//! states of the rows it touches, before anything is written.

use uuid::Uuid;

use crate::{Direction, EngineError, MoneyCents, ResultEngine};

/// Signed effect of `amount` booked under a category of `direction`.
#[must_use]
pub fn effect(direction: Direction, amount: MoneyCents) -> MoneyCents {
    match direction {
        Direction::Income => amount,
        Direction::Expense => -amount,
    }
}

/// The part of a transaction the ledger cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerState {
    pub account_id: Uuid,
    pub direction: Direction,
    pub amount: MoneyCents,
}

impl LedgerState {
    #[must_use]
    pub fn effect(&self) -> MoneyCents {
        effect(self.direction, self.amount)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceDelta {
    pub account_id: Uuid,
    pub delta: MoneyCents,
}

/// Ordered list of balance changes to apply in one unit of work.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeltaPlan {
    deltas: Vec<BalanceDelta>,
}

fn overflow() -> EngineError {
    EngineError::InvalidAmount("balance delta overflow".to_string())
}

impl DeltaPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deltas for a single row going from `old` to `new`.
    ///
    /// - create (`None -> Some`): `+effect(new)` on the new account
    /// - delete (`Some -> None`): `-effect(old)` on the old account
    /// - update on the same account: `effect(new) - effect(old)`
    /// - update moving accounts: `-effect(old)` and `+effect(new)`, not netted
    pub fn compute(old: Option<&LedgerState>, new: Option<&LedgerState>) -> ResultEngine<Self> {
        let mut plan = Self::new();
        plan.add_change(old, new)?;
        Ok(plan)
    }

    /// Appends the deltas of another row change to this plan.
    pub fn add_change(
        &mut self,
        old: Option<&LedgerState>,
        new: Option<&LedgerState>,
    ) -> ResultEngine<()> {
        match (old, new) {
            (None, None) => {}
            (None, Some(new)) => self.push(new.account_id, new.effect()),
            (Some(old), None) => {
                let reversal = old.effect().checked_neg().ok_or_else(overflow)?;
                self.push(old.account_id, reversal);
            }
            (Some(old), Some(new)) if old.account_id == new.account_id => {
                let delta = new
                    .effect()
                    .checked_sub(old.effect())
                    .ok_or_else(overflow)?;
                self.push(new.account_id, delta);
            }
            (Some(old), Some(new)) => {
                let reversal = old.effect().checked_neg().ok_or_else(overflow)?;
                self.push(old.account_id, reversal);
                self.push(new.account_id, new.effect());
            }
        }
        Ok(())
    }

    /// Zero deltas are dropped.
    pub fn push(&mut self, account_id: Uuid, delta: MoneyCents) {
        if delta.is_zero() {
            return;
        }
        self.deltas.push(BalanceDelta { account_id, delta });
    }

    #[must_use]
    pub fn deltas(&self) -> &[BalanceDelta] {
        &self.deltas
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Deltas sorted by account id, the order accounts are locked in.
    /// Deltas for the same account keep their relative order.
    #[must_use]
    pub fn into_lock_order(mut self) -> Vec<BalanceDelta> {
        self.deltas.sort_by_key(|d| d.account_id);
        self.deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(account_id: Uuid, direction: Direction, cents: i64) -> LedgerState {
        LedgerState {
            account_id,
            direction,
            amount: MoneyCents::new(cents),
        }
    }

    #[test]
    fn effect_sign_follows_direction() {
        assert_eq!(
            effect(Direction::Income, MoneyCents::new(200_00)),
            MoneyCents::new(200_00)
        );
        assert_eq!(
            effect(Direction::Expense, MoneyCents::new(300_00)),
            MoneyCents::new(-300_00)
        );
    }

    #[test]
    fn create_applies_effect_to_new_account() {
        let cash = Uuid::new_v4();
        let plan = DeltaPlan::compute(None, Some(&state(cash, Direction::Income, 200_00))).unwrap();
        assert_eq!(
            plan.deltas(),
            &[BalanceDelta {
                account_id: cash,
                delta: MoneyCents::new(200_00)
            }]
        );
    }

    #[test]
    fn delete_reverses_old_effect() {
        let cash = Uuid::new_v4();
        let plan = DeltaPlan::compute(Some(&state(cash, Direction::Expense, 50_00)), None).unwrap();
        assert_eq!(
            plan.deltas(),
            &[BalanceDelta {
                account_id: cash,
                delta: MoneyCents::new(50_00)
            }]
        );
    }

    #[test]
    fn update_on_same_account_is_the_difference() {
        let cash = Uuid::new_v4();
        let plan = DeltaPlan::compute(
            Some(&state(cash, Direction::Expense, 300_00)),
            Some(&state(cash, Direction::Expense, 250_00)),
        )
        .unwrap();
        assert_eq!(
            plan.deltas(),
            &[BalanceDelta {
                account_id: cash,
                delta: MoneyCents::new(50_00)
            }]
        );
    }

    #[test]
    fn direction_flip_counts_twice() {
        let cash = Uuid::new_v4();
        let plan = DeltaPlan::compute(
            Some(&state(cash, Direction::Expense, 10_00)),
            Some(&state(cash, Direction::Income, 10_00)),
        )
        .unwrap();
        assert_eq!(plan.deltas()[0].delta, MoneyCents::new(20_00));
    }

    #[test]
    fn account_move_produces_two_deltas() {
        let cash = Uuid::new_v4();
        let bank = Uuid::new_v4();
        let plan = DeltaPlan::compute(
            Some(&state(cash, Direction::Expense, 40_00)),
            Some(&state(bank, Direction::Expense, 40_00)),
        )
        .unwrap();
        assert_eq!(
            plan.deltas(),
            &[
                BalanceDelta {
                    account_id: cash,
                    delta: MoneyCents::new(40_00)
                },
                BalanceDelta {
                    account_id: bank,
                    delta: MoneyCents::new(-40_00)
                },
            ]
        );
    }

    #[test]
    fn unchanged_update_is_empty() {
        let cash = Uuid::new_v4();
        let same = state(cash, Direction::Income, 10_00);
        assert!(DeltaPlan::compute(Some(&same), Some(&same)).unwrap().is_empty());
    }

    #[test]
    fn lock_order_is_ascending_and_stable() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        let mut plan = DeltaPlan::new();
        plan.push(high, MoneyCents::new(1));
        plan.push(low, MoneyCents::new(2));
        plan.push(high, MoneyCents::new(3));
        let ordered = plan.into_lock_order();
        let ids: Vec<_> = ordered.iter().map(|d| (d.account_id, d.delta.cents())).collect();
        assert_eq!(ids, vec![(low, 2), (high, 1), (high, 3)]);
    }

    #[test]
    fn overflowing_difference_is_rejected() {
        let cash = Uuid::new_v4();
        let err = DeltaPlan::compute(
            Some(&state(cash, Direction::Income, i64::MAX)),
            Some(&state(cash, Direction::Expense, i64::MAX)),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
