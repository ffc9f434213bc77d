//! Test support: environment/database preparation, seed data, and in-memory collaborator doubles.
pub mod mocks;
pub mod prepare_env;
pub mod seed;

pub use mocks::{CountingProvider, FailingGateway, HappyGateway, NullNotifier, RejectingProvider};
pub use prepare_env::{create_database, prepare_test_env, random_db_path, run_migrations};
