//! SQLAlchemy-style relative SQLite URLs resolve against the working directory
//!
//! Kept in its own test binary because it changes the process's current directory.

use chatbox_db::{Engine, PoolSettings, SessionFactory, Settings};
use sqlx::Row;

#[tokio::test]
async fn relative_sqlite_url_opens_file_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let url = Settings::default()
        .resolve_connection_string_with(Some("sqlite:///test.db".to_string()))
        .unwrap();
    let engine = Engine::connect(&url, &PoolSettings::default()).unwrap();
    let sessions = SessionFactory::new(engine);

    let mut session = sessions.open();
    session
        .execute(sqlx::query("CREATE TABLE messages (id INTEGER PRIMARY KEY, body TEXT)"))
        .await
        .unwrap();
    session
        .execute(sqlx::query("INSERT INTO messages (body) VALUES ('hi')"))
        .await
        .unwrap();
    session.commit().await.unwrap();
    session.close().await.unwrap();

    assert!(dir.path().join("test.db").exists());

    let mut session = sessions.open();
    let row = session
        .fetch_one(sqlx::query("SELECT COUNT(*) FROM messages"))
        .await
        .unwrap();
    assert_eq!(row.try_get::<i64, _>(0).unwrap(), 1);
    session.close().await.unwrap();
    assert_eq!(sessions.open_sessions(), 0);
}
