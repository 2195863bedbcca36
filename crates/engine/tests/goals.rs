use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    CreateGoalCmd, CreateTransactionCmd, Engine, EngineError, MoneyCents, UpdateGoalCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, path)
}

async fn seed_category(db: &DatabaseConnection, name: &str, kind: &str) -> Uuid {
    let id = Uuid::new_v4();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO categories (id, name, kind) VALUES (?, ?, ?)",
        vec![id.to_string().into(), name.into(), kind.into()],
    ))
    .await
    .unwrap();
    id
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn create_goal_starts_at_zero() {
    let (engine, db) = engine_with_db().await;
    let saving = seed_category(&db, "Savings", "saving").await;

    let goal_id = engine
        .create_goal(CreateGoalCmd::new("  Vacation  ", 100_000, saving))
        .await
        .unwrap();

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.name, "Vacation");
    assert_eq!(goal.target_cents, MoneyCents::new(100_000));
    assert_eq!(goal.current_cents, MoneyCents::ZERO);
    assert_eq!(goal.available_cents(), MoneyCents::new(100_000));

    assert_eq!(engine.list_goals().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_goal_requires_saving_category() {
    let (engine, db) = engine_with_db().await;
    let food = seed_category(&db, "Food", "expense").await;

    let err = engine
        .create_goal(CreateGoalCmd::new("Vacation", 1000, food))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("goals belong to saving categories".to_string())
    );

    let err = engine
        .create_goal(CreateGoalCmd::new("Vacation", 1000, Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("category".to_string()));
}

#[tokio::test]
async fn create_goal_rejects_bad_input() {
    let (engine, db) = engine_with_db().await;
    let saving = seed_category(&db, "Savings", "saving").await;

    let err = engine
        .create_goal(CreateGoalCmd::new("   ", 1000, saving))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("goal name must not be empty".to_string())
    );

    let err = engine
        .create_goal(CreateGoalCmd::new("Vacation", 0, saving))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("target_cents must be > 0".to_string())
    );
}

#[tokio::test]
async fn update_goal_patches_name_and_target() {
    let (engine, db) = engine_with_db().await;
    let saving = seed_category(&db, "Savings", "saving").await;
    let goal_id = engine
        .create_goal(CreateGoalCmd::new("Vacation", 1000, saving))
        .await
        .unwrap();

    engine
        .update_goal(
            UpdateGoalCmd::new(goal_id)
                .name("Summer trip")
                .target_cents(2000),
        )
        .await
        .unwrap();

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.name, "Summer trip");
    assert_eq!(goal.target_cents, MoneyCents::new(2000));
    assert_eq!(goal.current_cents, MoneyCents::ZERO);
}

#[tokio::test]
async fn update_goal_cannot_drop_target_below_allocated() {
    let (engine, db) = engine_with_db().await;
    let saving = seed_category(&db, "Savings", "saving").await;
    let goal_id = engine
        .create_goal(CreateGoalCmd::new("Vacation", 1000, saving))
        .await
        .unwrap();

    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", saving, 400, date(2026, 3, 2)).goal_id(goal_id),
        )
        .await
        .unwrap();

    let err = engine
        .update_goal(UpdateGoalCmd::new(goal_id).target_cents(300))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("target 3.00 is below the allocated 4.00".to_string())
    );

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.target_cents, MoneyCents::new(1000));

    // Shrinking down to exactly the allocated amount is fine.
    engine
        .update_goal(UpdateGoalCmd::new(goal_id).target_cents(400))
        .await
        .unwrap();
    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.available_cents(), MoneyCents::ZERO);
}

#[tokio::test]
async fn delete_goal_blocked_while_referenced() {
    let (engine, db) = engine_with_db().await;
    let saving = seed_category(&db, "Savings", "saving").await;
    let goal_id = engine
        .create_goal(CreateGoalCmd::new("Vacation", 1000, saving))
        .await
        .unwrap();

    let tx_id = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", saving, 400, date(2026, 3, 2)).goal_id(goal_id),
        )
        .await
        .unwrap();

    let err = engine.delete_goal(goal_id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("goal still has 1 allocated transaction(s)".to_string())
    );

    engine.delete_transaction(tx_id, "alice").await.unwrap();
    engine.delete_goal(goal_id).await.unwrap();

    let err = engine.goal(goal_id).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound("goal".to_string()));
}

#[tokio::test]
async fn reconcile_repairs_drifted_progress() {
    let (engine, db) = engine_with_db().await;
    let saving = seed_category(&db, "Savings", "saving").await;
    let goal_id = engine
        .create_goal(CreateGoalCmd::new("Vacation", 1000, saving))
        .await
        .unwrap();

    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", saving, 400, date(2026, 3, 2)).goal_id(goal_id),
        )
        .await
        .unwrap();

    // Corrupt the denormalized progress directly in the DB.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE goals SET current_cents = ? WHERE id = ?;",
        vec![999i64.into(), goal_id.to_string().into()],
    ))
    .await
    .unwrap();

    let report = engine.reconcile_goal(goal_id).await.unwrap();
    assert!(!report.is_consistent());
    assert_eq!(report.recorded_cents, MoneyCents::new(999));
    assert_eq!(report.replayed_cents, MoneyCents::new(400));

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.current_cents, MoneyCents::new(400));

    // A second pass finds nothing to repair.
    let report = engine.reconcile_goal(goal_id).await.unwrap();
    assert!(report.is_consistent());
}

#[tokio::test]
async fn reconcile_rejects_logs_past_the_target() {
    let (engine, db) = engine_with_db().await;
    let saving = seed_category(&db, "Savings", "saving").await;
    let goal_id = engine
        .create_goal(CreateGoalCmd::new("Vacation", 1000, saving))
        .await
        .unwrap();

    let tx_id = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", saving, 400, date(2026, 3, 2)).goal_id(goal_id),
        )
        .await
        .unwrap();

    // Forge an extra log row so the sum exceeds the target; that cannot be
    // repaired by rewriting the progress.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO savings_logs (id, transaction_id, goal_id, owner_id, amount_cents, created_at) \
         VALUES (?, ?, ?, ?, ?, ?);",
        vec![
            Uuid::new_v4().to_string().into(),
            tx_id.to_string().into(),
            goal_id.to_string().into(),
            "alice".into(),
            800i64.into(),
            "2026-03-02T00:00:00+00:00".into(),
        ],
    ))
    .await
    .unwrap();

    let err = engine.reconcile_goal(goal_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Inconsistent(_)));

    // The stored progress is left alone.
    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.current_cents, MoneyCents::new(400));
}

#[tokio::test]
async fn concurrent_allocations_fill_goal_exactly() {
    let (engine, db, path) = engine_with_file_db().await;
    let saving = seed_category(&db, "Savings", "saving").await;
    let goal_id = engine
        .create_goal(CreateGoalCmd::new("House", 1000, saving))
        .await
        .unwrap();

    let engine = Arc::new(engine);
    let mut handles = Vec::new();
    for _ in 0..5 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            // Contention surfaces as a transient LockTimeout; retry the whole
            // operation the way a real caller would.
            for _ in 0..50 {
                let cmd = CreateTransactionCmd::new("alice", saving, 300, date(2026, 3, 2))
                    .goal_id(goal_id);
                match engine.create_transaction(cmd).await {
                    Ok(_) => return Ok(()),
                    Err(EngineError::CapacityExceeded { available }) => return Err(available),
                    Err(EngineError::LockTimeout(_)) => {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
            panic!("allocation kept timing out");
        }));
    }

    let mut succeeded = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(_) => rejected += 1,
        }
    }

    // Target 1000 fits exactly three allocations of 300.
    assert_eq!(succeeded, 3);
    assert_eq!(rejected, 2);

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.current_cents, MoneyCents::new(900));
    assert_eq!(engine.savings_history(goal_id).await.unwrap().len(), 3);

    drop(db);
    let _ = std::fs::remove_file(path);
}
