use std::sync::Arc;

use fundfolio_core::db;

/// Creates a fresh database in a temporary directory and returns a pool
/// with all migrations applied. The TempDir guard must stay alive for
/// the duration of the test.
pub fn setup_pool() -> (Arc<db::DbPool>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = db::init(dir.path().to_str().unwrap()).unwrap();
    let pool = db::create_pool(&db_path).unwrap();
    db::run_migrations(&pool).unwrap();
    (pool, dir)
}
