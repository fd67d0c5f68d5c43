#![allow(dead_code)]

use std::{future::Future, path::PathBuf, time::Duration};

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{AccountKind, Direction, Engine, EngineError, MoneyCents};
use migration::MigratorTrait;

async fn seed_users(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![username.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_users(&db).await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Removes the SQLite file (and its journal files) when the test ends,
/// whether it passed or panicked.
pub struct DbFile(PathBuf);

impl Drop for DbFile {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub async fn engine_with_file_db() -> (Engine, DatabaseConnection, DbFile) {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let file = DbFile(root.join(format!("ledger_{}.db", Uuid::new_v4())));
    let url = format!("sqlite:{}?mode=rwc", file.0.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_users(&db).await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, file)
}

pub fn cents(raw: &str) -> MoneyCents {
    raw.parse().unwrap()
}

pub async fn balance(engine: &Engine, owner: &str, account_id: Uuid) -> MoneyCents {
    engine.account(owner, account_id).await.unwrap().balance
}

/// Accounts and categories of the reference scenario, owned by alice.
#[derive(Clone, Copy)]
pub struct Fixture {
    pub cash: Uuid,
    pub bank: Uuid,
    pub salary: Uuid,
    pub food: Uuid,
}

pub async fn fixture(engine: &Engine) -> Fixture {
    let cash = engine
        .new_account("alice", "Cash", AccountKind::Cash, cents("1000.00"))
        .await
        .unwrap();
    let bank = engine
        .new_account("alice", "Bank", AccountKind::Bank, cents("500.00"))
        .await
        .unwrap();
    let salary = engine
        .new_category("alice", "Salary", Direction::Income, None)
        .await
        .unwrap();
    let food = engine
        .new_category("alice", "Food", Direction::Expense, None)
        .await
        .unwrap();
    Fixture {
        cash,
        bank,
        salary,
        food,
    }
}

/// Resubmits `op` while it fails with a retryable lock conflict.
pub async fn retry<T, F, Fut>(mut op: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    for _ in 0..500 {
        match op().await {
            Ok(value) => return value,
            Err(err) if err.is_retryable() => tokio::time::sleep(Duration::from_millis(5)).await,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
    panic!("too many lock conflicts");
}
