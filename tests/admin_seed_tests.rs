use reader_db::db::admin::INITIAL_ADMIN_REASON;
use reader_db::db::models::{self, AdminPrivilege, User};
use reader_db::{DbError, Engine, EngineOptions, SeedOutcome, seed_initial_admin};
use tempfile::TempDir;

async fn seeded_engine() -> (TempDir, Engine, i64) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("reader.db");
    let engine = Engine::local(
        path.to_str().expect("temp path was not utf-8"),
        EngineOptions::default(),
    )
    .await
    .expect("failed to build local engine");
    engine
        .initialize_schema(&models::registry())
        .await
        .expect("init failed");

    let user_id = engine
        .with_session(async |session| {
            User {
                id: None,
                username: "ada".to_string(),
                email: "ada@school.org".to_string(),
                full_name: "Ada Lovelace".to_string(),
                is_teacher: true,
                hashed_password: None,
            }
            .insert(session)
            .await
        })
        .await
        .expect("user insert failed");
    (dir, engine, user_id)
}

async fn active_admins(engine: &Engine) -> Vec<AdminPrivilege> {
    engine
        .with_session(async |session| AdminPrivilege::list_active(session).await)
        .await
        .expect("admin listing failed")
}

#[tokio::test]
async fn seeds_first_admin_for_known_email() {
    let (_dir, engine, user_id) = seeded_engine().await;

    let outcome = seed_initial_admin(&engine, "ada@school.org").await.unwrap();
    assert_eq!(outcome, SeedOutcome::Created(user_id));

    let admins = active_admins(&engine).await;
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].user_id, user_id);
    assert_eq!(admins[0].granted_by_id, None);
    assert_eq!(admins[0].grant_reason, INITIAL_ADMIN_REASON);
    assert!(admins[0].is_active);
    assert_eq!(engine.open_sessions(), 0);
}

#[tokio::test]
async fn second_seed_is_a_no_op() {
    let (_dir, engine, _) = seeded_engine().await;

    seed_initial_admin(&engine, "ada@school.org").await.unwrap();
    let again = seed_initial_admin(&engine, "ada@school.org").await.unwrap();

    assert_eq!(again, SeedOutcome::AdminsExist);
    assert_eq!(active_admins(&engine).await.len(), 1);
}

#[tokio::test]
async fn unknown_email_creates_nothing() {
    let (_dir, engine, _) = seeded_engine().await;

    let outcome = seed_initial_admin(&engine, "nobody@school.org").await.unwrap();

    assert_eq!(outcome, SeedOutcome::UserNotFound);
    assert!(active_admins(&engine).await.is_empty());
}

#[tokio::test]
async fn user_row_round_trips() {
    let (_dir, engine, user_id) = seeded_engine().await;

    let user = engine
        .with_session(async |session| User::find_by_email(session, "ada@school.org").await)
        .await
        .expect("lookup failed")
        .expect("user missing");

    assert_eq!(user.id, Some(user_id));
    assert_eq!(user.username, "ada");
    assert!(user.is_teacher);
    assert_eq!(user.hashed_password, None);
}

#[tokio::test]
async fn seeding_before_schema_surfaces_driver_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("empty.db");
    let engine = Engine::local(path.to_str().unwrap(), EngineOptions::default())
        .await
        .unwrap();

    let err = seed_initial_admin(&engine, "ada@school.org").await.unwrap_err();
    assert!(matches!(err, DbError::Driver(_)));
    assert_eq!(engine.open_sessions(), 0);
}
