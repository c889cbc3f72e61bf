//! Aggregate queries over the marketplace collections.
//!
//! Handlers only see the [`AnalyticsStore`] trait. [`MongoStore`] runs the
//! queries as aggregation pipelines on the database; [`MemoryStore`] answers
//! them from in-process collections and backs the tests.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{DailyProjects, DailySignups, PlatformStats, RevenueStats, SkillCount};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("unexpected document shape: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    #[error("invalid document: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Headline counts across all four collections.
    async fn platform_stats(&self) -> StoreResult<PlatformStats>;

    /// Skills listed by freelancers, most common first.
    async fn skill_popularity(&self) -> StoreResult<Vec<SkillCount>>;

    /// Total and mean budget of completed projects. Zero when none exist.
    async fn revenue_stats(&self) -> StoreResult<RevenueStats>;

    /// New accounts per UTC day created at or after `since`, oldest day first.
    async fn signup_trends(&self, since: DateTime<Utc>) -> StoreResult<Vec<DailySignups>>;

    /// New projects per UTC day created at or after `since`, oldest day first.
    async fn project_posting_trends(
        &self,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DailyProjects>>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Format used to bucket timestamps into days.
pub const DAY_FORMAT: &str = "%Y-%m-%d";
