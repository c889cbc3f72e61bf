use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::{Client, Database};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::{AnalyticsStore, StoreError, StoreResult, DAY_FORMAT};
use crate::models::{ProjectStatus, Role, BIDS, PROJECTS, REVIEWS, USERS};
use crate::types::{DailyProjects, DailySignups, PlatformStats, RevenueStats, SkillCount};

/// Used when neither the configuration nor the connection string names a database.
pub const DEFAULT_DATABASE: &str = "freelance";

#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Builds a client from `uri` and selects `database`, falling back to the
    /// database named in the URI.
    pub async fn connect(uri: &str, database: Option<&str>) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = match database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };
        info!("Using database '{}'", db.name());
        Ok(Self::new(db))
    }

    /// Wraps an already configured database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn count(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        let total = self
            .db
            .collection::<Document>(collection)
            .count_documents(filter)
            .await?;
        Ok(total)
    }

    async fn aggregate<T: DeserializeOwned>(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> StoreResult<Vec<T>> {
        debug!(collection, stages = pipeline.len(), "running aggregation");
        let cursor = self
            .db
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .await?;
        let rows: Vec<Document> = cursor.try_collect().await?;

        rows.into_iter()
            .map(|row| bson::from_document(row).map_err(StoreError::from))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevenueRow {
    #[serde(default)]
    total_revenue: f64,
    avg_project_budget: Option<f64>,
}

pub(crate) fn skill_popularity_pipeline() -> Vec<Document> {
    vec![
        doc! { "$match": { "role": Role::Freelancer.as_str() } },
        doc! { "$unwind": "$skills" },
        doc! { "$group": { "_id": "$skills", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1, "_id": 1 } },
    ]
}

pub(crate) fn revenue_pipeline() -> Vec<Document> {
    vec![
        doc! { "$match": { "status": ProjectStatus::Completed.as_str() } },
        doc! {
            "$group": {
                "_id": null,
                "totalRevenue": { "$sum": "$budget" },
                "avgProjectBudget": { "$avg": "$budget" },
            }
        },
    ]
}

/// Counts documents per UTC day of `createdAt`, storing the tally under `count_field`.
pub(crate) fn daily_count_pipeline(since: DateTime<Utc>, count_field: &str) -> Vec<Document> {
    let since = bson::DateTime::from_millis(since.timestamp_millis());

    let mut group = doc! {
        "_id": { "$dateToString": { "format": DAY_FORMAT, "date": "$createdAt" } },
    };
    group.insert(count_field, doc! { "$sum": 1 });

    vec![
        doc! { "$match": { "createdAt": { "$gte": since } } },
        doc! { "$group": group },
        doc! { "$sort": { "_id": 1 } },
    ]
}

#[async_trait]
impl AnalyticsStore for MongoStore {
    async fn platform_stats(&self) -> StoreResult<PlatformStats> {
        let (
            total_users,
            total_freelancers,
            total_clients,
            total_projects,
            total_bids,
            total_reviews,
            completed_projects,
        ) = tokio::try_join!(
            self.count(USERS, doc! {}),
            self.count(USERS, doc! { "role": Role::Freelancer.as_str() }),
            self.count(USERS, doc! { "role": Role::Client.as_str() }),
            self.count(PROJECTS, doc! {}),
            self.count(BIDS, doc! {}),
            self.count(REVIEWS, doc! {}),
            self.count(PROJECTS, doc! { "status": ProjectStatus::Completed.as_str() }),
        )?;

        Ok(PlatformStats {
            total_users,
            total_freelancers,
            total_clients,
            total_projects,
            total_bids,
            total_reviews,
            completed_projects,
        })
    }

    async fn skill_popularity(&self) -> StoreResult<Vec<SkillCount>> {
        self.aggregate(USERS, skill_popularity_pipeline()).await
    }

    async fn revenue_stats(&self) -> StoreResult<RevenueStats> {
        let rows: Vec<RevenueRow> = self.aggregate(PROJECTS, revenue_pipeline()).await?;

        Ok(rows
            .into_iter()
            .next()
            .map(|row| RevenueStats {
                total_revenue: row.total_revenue,
                avg_project_budget: row.avg_project_budget.unwrap_or(0.0),
            })
            .unwrap_or_default())
    }

    async fn signup_trends(&self, since: DateTime<Utc>) -> StoreResult<Vec<DailySignups>> {
        self.aggregate(USERS, daily_count_pipeline(since, "signups"))
            .await
    }

    async fn project_posting_trends(
        &self,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DailyProjects>> {
        self.aggregate(PROJECTS, daily_count_pipeline(since, "projects"))
            .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
