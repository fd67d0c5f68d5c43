use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use engine::{
    AccountKind, BudgetCmd, BudgetTarget, Direction, EngineError, MoneyCents, TransactionCmd,
    TransactionListFilter, TransferCmd, UpdateAccountCmd, UpdateBudgetCmd, UpdateCategoryCmd,
};

mod common;

use common::{balance, cents, engine_with_db, fixture};

fn day(d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, d, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn opening_balance_is_booked_as_transaction() {
    let (engine, _db) = engine_with_db().await;

    let card = engine
        .new_account("alice", "Card", AccountKind::Credit, cents("-250.00"))
        .await
        .unwrap();
    let empty = engine
        .new_account("alice", "Empty", AccountKind::Wallet, MoneyCents::ZERO)
        .await
        .unwrap();

    assert_eq!(balance(&engine, "alice", card).await, cents("-250.00"));
    assert_eq!(balance(&engine, "alice", empty).await, MoneyCents::ZERO);

    let filter = TransactionListFilter {
        account_id: Some(card),
        ..Default::default()
    };
    let (rows, _) = engine
        .list_transactions("alice", &filter, 10, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, cents("250.00"));
    assert_eq!(rows[0].description.as_deref(), Some("Opening Balance"));
    let category = engine.category("alice", rows[0].category_id).await.unwrap();
    assert_eq!(category.direction, Direction::Expense);
    assert!(category.is_system);

    let filter = TransactionListFilter {
        account_id: Some(empty),
        ..Default::default()
    };
    let (rows, _) = engine
        .list_transactions("alice", &filter, 10, None)
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert!(engine.recompute_balances("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn account_names_are_unique_per_owner() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let err = engine
        .new_account("alice", "  cash ", AccountKind::Cash, MoneyCents::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // Another owner may reuse the name.
    engine
        .new_account("bob", "Cash", AccountKind::Cash, MoneyCents::ZERO)
        .await
        .unwrap();

    let err = engine
        .new_account("alice", "   ", AccountKind::Cash, MoneyCents::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));

    let err = engine
        .new_account("carol", "Cash", AccountKind::Cash, MoneyCents::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let renamed = engine
        .rename_account("alice", f.cash, "Pocket money")
        .await
        .unwrap();
    assert_eq!(renamed.name, "Pocket money");
    assert_eq!(renamed.balance, cents("1000.00"));

    let err = engine
        .rename_account("alice", f.cash, "BANK")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // Renaming to its own name with another casing is allowed.
    engine
        .rename_account("alice", f.cash, "POCKET MONEY")
        .await
        .unwrap();

    let err = engine
        .rename_account("bob", f.cash, "Mine")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));

    let names: Vec<_> = engine
        .accounts("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, vec!["Bank".to_string(), "POCKET MONEY".to_string()]);
}

#[tokio::test]
async fn renamed_account_feeds_new_transfer_descriptions() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    engine
        .rename_account("alice", f.cash, "Wallet")
        .await
        .unwrap();

    let created = engine
        .submit_transfer(TransferCmd::new(
            "alice",
            f.cash,
            f.bank,
            f.food,
            cents("5.00"),
            Utc::now(),
        ))
        .await
        .unwrap();
    let incoming = engine
        .transaction("alice", created.incoming_id)
        .await
        .unwrap();
    assert_eq!(incoming.description.as_deref(), Some("Transfer from Wallet"));
}

#[tokio::test]
async fn categories_are_unique_per_direction() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let refunds = engine
        .new_category("alice", "food", Direction::Income, None)
        .await
        .unwrap();
    assert_ne!(refunds, f.food);

    let err = engine
        .new_category("alice", "FOOD", Direction::Expense, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let groceries = engine
        .new_category("alice", "Groceries", Direction::Expense, Some(f.food))
        .await
        .unwrap();
    let category = engine.category("alice", groceries).await.unwrap();
    assert_eq!(category.parent_id, Some(f.food));
    assert!(!category.is_system);

    let err = engine
        .new_category("bob", "Groceries", Direction::Expense, Some(f.food))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));

    let err = engine
        .new_category("alice", "Orphan", Direction::Expense, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine.category("bob", f.food).await.unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));

    let all = engine.categories("alice").await.unwrap();
    assert!(all.iter().any(|c| c.id == refunds));
    assert!(all.iter().all(|c| c.owner == "alice"));
    assert!(engine.categories("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn user_category_named_like_system_one_is_reused() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let mine = engine
        .new_category("alice", "transfer in", Direction::Income, None)
        .await
        .unwrap();

    let created = engine
        .submit_transfer(TransferCmd::new(
            "alice",
            f.cash,
            f.bank,
            f.food,
            cents("5.00"),
            Utc::now(),
        ))
        .await
        .unwrap();
    let incoming = engine
        .transaction("alice", created.incoming_id)
        .await
        .unwrap();
    assert_eq!(incoming.category_id, mine);
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let mut ids = Vec::new();
    for d in 1..=5 {
        let id = engine
            .submit_transaction(
                TransactionCmd::new("alice", f.cash, f.food, cents("10.00"), day(d))
                    .description(format!("Lunch day {d}")),
            )
            .await
            .unwrap();
        ids.push(id);
    }
    let salary = engine
        .submit_transaction(
            TransactionCmd::new("alice", f.bank, f.salary, cents("900.00"), day(3))
                .description("Salary"),
        )
        .await
        .unwrap();
    let created = engine
        .submit_transfer(TransferCmd::new(
            "alice",
            f.bank,
            f.cash,
            f.food,
            cents("50.00"),
            day(4),
        ))
        .await
        .unwrap();

    let by_category = TransactionListFilter {
        category_id: Some(f.food),
        from: Some(day(1)),
        to: Some(day(6)),
        ..Default::default()
    };
    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;
    loop {
        let (rows, next) = engine
            .list_transactions("alice", &by_category, 2, cursor.as_deref())
            .await
            .unwrap();
        pages += 1;
        seen.extend(rows);
        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    assert_eq!(pages, 3);
    // Five lunches plus the outgoing transfer leg, newest first.
    assert_eq!(seen.len(), 6);
    assert_eq!(seen[0].id, ids[4]);
    assert_eq!(seen[5].id, ids[0]);
    assert!(
        seen.windows(2)
            .all(|w| (w[0].occurred_at, w[0].id) > (w[1].occurred_at, w[1].id))
    );

    let window = TransactionListFilter {
        from: Some(day(3)),
        to: Some(day(4)),
        ..Default::default()
    };
    let (rows, next) = engine
        .list_transactions("alice", &window, 10, None)
        .await
        .unwrap();
    assert!(next.is_none());
    let mut got: Vec<_> = rows.iter().map(|tx| tx.id).collect();
    got.sort();
    let mut expected = vec![ids[2], salary];
    expected.sort();
    assert_eq!(got, expected);

    let search = TransactionListFilter {
        search: Some("lunch DAY 2".to_string()),
        ..Default::default()
    };
    let (rows, _) = engine
        .list_transactions("alice", &search, 10, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, ids[1]);

    let legs = TransactionListFilter {
        transfer_id: Some(created.transfer_id),
        ..Default::default()
    };
    let (rows, _) = engine
        .list_transactions("alice", &legs, 10, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let (rows, _) = engine
        .list_transactions("bob", &TransactionListFilter::default(), 10, None)
        .await
        .unwrap();
    assert!(rows.is_empty());

    let inverted = TransactionListFilter {
        from: Some(day(5)),
        to: Some(day(5)),
        ..Default::default()
    };
    let err = engine
        .list_transactions("alice", &inverted, 10, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidFilter(_)));

    let err = engine
        .list_transactions("alice", &TransactionListFilter::default(), 10, Some("%%%"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));
}

#[tokio::test]
async fn budgets_lifecycle() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();

    let food_budget = engine
        .new_budget(BudgetCmd::new(
            "alice",
            BudgetTarget::Category(f.food),
            cents("300.00"),
            start,
            end,
        ))
        .await
        .unwrap();
    let cash_budget = engine
        .new_budget(BudgetCmd::new(
            "alice",
            BudgetTarget::Account(f.cash),
            cents("800.00"),
            start,
            start,
        ))
        .await
        .unwrap();

    let budgets = engine.budgets("alice").await.unwrap();
    assert_eq!(budgets.len(), 2);
    let food = budgets.iter().find(|b| b.id == food_budget).unwrap();
    assert_eq!(food.target, BudgetTarget::Category(f.food));
    assert_eq!(food.amount, cents("300.00"));
    assert_eq!(food.period_start, start);
    assert_eq!(food.period_end, end);

    let err = engine
        .new_budget(BudgetCmd::new(
            "alice",
            BudgetTarget::Category(f.food),
            cents("300.00"),
            end,
            start,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidBudget(_)));

    let err = engine
        .new_budget(BudgetCmd::new(
            "alice",
            BudgetTarget::Category(f.food),
            MoneyCents::ZERO,
            start,
            end,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let mut both = BudgetCmd::new(
        "alice",
        BudgetTarget::Category(f.food),
        cents("1.00"),
        start,
        end,
    );
    both.account_id = Some(f.cash);
    let err = engine.new_budget(both).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidBudget(_)));

    let err = engine
        .new_budget(BudgetCmd::new(
            "bob",
            BudgetTarget::Account(f.cash),
            cents("1.00"),
            start,
            end,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));

    let err = engine.delete_budget("bob", cash_budget).await.unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));

    engine.delete_budget("alice", cash_budget).await.unwrap();
    let err = engine.delete_budget("alice", cash_budget).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let remaining = engine.budgets("alice").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, food_budget);
    assert!(engine.budgets("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn search_covers_location_and_matches_wildcards_literally() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let discount = engine
        .submit_transaction(
            TransactionCmd::new("alice", f.cash, f.food, cents("8.00"), day(1))
                .description("Pizza 50% off"),
        )
        .await
        .unwrap();
    let market = engine
        .submit_transaction(
            TransactionCmd::new("alice", f.cash, f.food, cents("20.00"), day(2))
                .description("Groceries")
                .location("Central Market")
                .receipt_image_url("https://receipts.example/market.jpg"),
        )
        .await
        .unwrap();
    engine
        .submit_transaction(
            TransactionCmd::new("alice", f.cash, f.food, cents("3.00"), day(3))
                .description("Coffee_bar"),
        )
        .await
        .unwrap();

    let search = |text: &str| TransactionListFilter {
        search: Some(text.to_string()),
        ..Default::default()
    };

    let (rows, _) = engine
        .list_transactions("alice", &search("central market"), 10, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, market);
    assert_eq!(rows[0].location.as_deref(), Some("Central Market"));
    assert_eq!(
        rows[0].receipt_image_url.as_deref(),
        Some("https://receipts.example/market.jpg")
    );

    let (rows, _) = engine
        .list_transactions("alice", &search("%"), 10, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, discount);

    let (rows, _) = engine
        .list_transactions("alice", &search("e_b"), 10, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description.as_deref(), Some("Coffee_bar"));

    let (rows, _) = engine
        .list_transactions("alice", &search("p_zza"), 10, None)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn account_kind_update_and_delete() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let spare = engine
        .new_account("alice", "Spare", AccountKind::Other, MoneyCents::ZERO)
        .await
        .unwrap();

    let updated = engine
        .update_account(UpdateAccountCmd::new("alice", f.bank).kind(AccountKind::Investment))
        .await
        .unwrap();
    assert_eq!(updated.kind, AccountKind::Investment);
    assert_eq!(updated.name, "Bank");
    assert_eq!(updated.balance, cents("500.00"));

    let err = engine
        .update_account(UpdateAccountCmd::new("alice", f.bank).name("cash"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    let err = engine
        .update_account(UpdateAccountCmd::new("bob", f.bank).kind(AccountKind::Cash))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));

    // The opening balance is a transaction, so Cash cannot go yet.
    let err = engine.delete_account("alice", f.cash).await.unwrap_err();
    assert!(matches!(err, EngineError::ResourceInUse(_)));
    assert_eq!(balance(&engine, "alice", f.cash).await, cents("1000.00"));

    engine
        .new_budget(BudgetCmd::new(
            "alice",
            BudgetTarget::Account(spare),
            cents("10.00"),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        ))
        .await
        .unwrap();
    let err = engine.delete_account("bob", spare).await.unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));
    engine.delete_account("alice", spare).await.unwrap();
    assert!(matches!(
        engine.account("alice", spare).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(engine.budgets("alice").await.unwrap().is_empty());

    let filter = TransactionListFilter {
        account_id: Some(f.cash),
        ..Default::default()
    };
    let (rows, _) = engine
        .list_transactions("alice", &filter, 10, None)
        .await
        .unwrap();
    engine.delete_transaction("alice", rows[0].id).await.unwrap();
    engine.delete_account("alice", f.cash).await.unwrap();
    assert_eq!(engine.accounts("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn category_update_and_delete() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let groceries = engine
        .new_category("alice", "Groceries", Direction::Expense, Some(f.food))
        .await
        .unwrap();
    let snacks = engine
        .new_category("alice", "Snacks", Direction::Expense, Some(groceries))
        .await
        .unwrap();

    let renamed = engine
        .update_category(UpdateCategoryCmd::new("alice", groceries).name("Supermarket"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Supermarket");
    assert_eq!(renamed.direction, Direction::Expense);
    assert_eq!(renamed.parent_id, Some(f.food));

    let err = engine
        .update_category(UpdateCategoryCmd::new("alice", groceries).name("food"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    let err = engine
        .update_category(UpdateCategoryCmd::new("alice", f.food).parent_id(snacks))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));
    let err = engine
        .update_category(UpdateCategoryCmd::new("alice", f.food).parent_id(f.food))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));

    let detached = engine
        .update_category(UpdateCategoryCmd::new("alice", groceries).clear_parent())
        .await
        .unwrap();
    assert_eq!(detached.parent_id, None);

    engine
        .submit_transfer(TransferCmd::new(
            "alice",
            f.cash,
            f.bank,
            f.food,
            cents("1.00"),
            Utc::now(),
        ))
        .await
        .unwrap();
    let transfer_in = engine
        .categories("alice")
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.is_system && c.name == "Transfer In")
        .unwrap();
    let err = engine
        .update_category(UpdateCategoryCmd::new("alice", transfer_in.id).name("Incoming"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));

    let err = engine.delete_category("alice", f.food).await.unwrap_err();
    assert!(matches!(err, EngineError::ResourceInUse(_)));

    engine
        .new_budget(BudgetCmd::new(
            "alice",
            BudgetTarget::Category(groceries),
            cents("50.00"),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        ))
        .await
        .unwrap();
    let err = engine.delete_category("bob", groceries).await.unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));
    engine.delete_category("alice", groceries).await.unwrap();
    assert!(engine.budgets("alice").await.unwrap().is_empty());
    let snacks = engine.category("alice", snacks).await.unwrap();
    assert_eq!(snacks.parent_id, None);
}

#[tokio::test]
async fn budget_update_is_validated_as_a_whole() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let start = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
    let budget = engine
        .new_budget(BudgetCmd::new(
            "alice",
            BudgetTarget::Category(f.food),
            cents("300.00"),
            start,
            end,
        ))
        .await
        .unwrap();

    let updated = engine
        .update_budget(
            UpdateBudgetCmd::new("alice", budget)
                .amount(cents("250.00"))
                .target(BudgetTarget::Account(f.cash)),
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, cents("250.00"));
    assert_eq!(updated.target, BudgetTarget::Account(f.cash));
    assert_eq!(updated.period_start, start);

    let err = engine
        .update_budget(UpdateBudgetCmd::new("alice", budget).period(end, start))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidBudget(_)));
    let err = engine
        .update_budget(UpdateBudgetCmd::new("alice", budget).amount(MoneyCents::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    let err = engine
        .update_budget(UpdateBudgetCmd::new("bob", budget).amount(cents("1.00")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));

    let bob_account = engine
        .new_account("bob", "Wallet", AccountKind::Wallet, MoneyCents::ZERO)
        .await
        .unwrap();
    let err = engine
        .update_budget(
            UpdateBudgetCmd::new("alice", budget).target(BudgetTarget::Account(bob_account)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));

    let stored = engine.budgets("alice").await.unwrap();
    assert_eq!(stored[0].amount, cents("250.00"));
    assert_eq!(stored[0].target, BudgetTarget::Account(f.cash));
}
