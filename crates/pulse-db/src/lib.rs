//! # pulse-db
//!
//! PostgreSQL storage layer for pulsecoach.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for the pulse-core store traits
//! - Vector search over day-summary embeddings with pgvector
//! - Idempotent schema bootstrap

pub mod alerts;
pub mod embeddings;
pub mod job_log;
pub mod pool;
pub mod profile;
pub mod records;
pub mod schema;
pub mod turns;

pub use alerts::PgAlertRepository;
pub use embeddings::PgDayEmbeddingIndex;
pub use job_log::PgJobLogRepository;
pub use pool::{create_pool, create_pool_with_config, database_url_from_env, PoolConfig};
pub use profile::{PgProfileRepository, ProfileCache};
pub use records::PgHealthRecordRepository;
pub use schema::init_schema;
pub use turns::PgTurnRepository;
