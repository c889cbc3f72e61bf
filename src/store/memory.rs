use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use tokio::sync::RwLock;
use validator::Validate;

use super::{AnalyticsStore, StoreResult, DAY_FORMAT};
use crate::models::{Bid, Project, ProjectStatus, Review, Role, User};
use crate::types::{DailyProjects, DailySignups, PlatformStats, RevenueStats, SkillCount};

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    projects: Vec<Project>,
    bids: Vec<Bid>,
    reviews: Vec<Review>,
}

/// In-process store with the same aggregation semantics as [`super::MongoStore`].
///
/// Documents are validated on insert and receive an `_id` and timestamps
/// when they do not carry their own.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

fn stamp(
    id: &mut Option<ObjectId>,
    created_at: &mut Option<bson::DateTime>,
    updated_at: &mut Option<bson::DateTime>,
) -> ObjectId {
    let now = bson::DateTime::now();
    created_at.get_or_insert(now);
    updated_at.get_or_insert(now);
    *id.get_or_insert_with(ObjectId::new)
}

fn in_window(created_at: Option<bson::DateTime>, since: DateTime<Utc>) -> Option<bson::DateTime> {
    created_at.filter(|at| at.timestamp_millis() >= since.timestamp_millis())
}

fn day_key(at: bson::DateTime) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis())
        .map(|at| at.format(DAY_FORMAT).to_string())
}

fn per_day(timestamps: impl Iterator<Item = bson::DateTime>) -> BTreeMap<String, u64> {
    let mut days = BTreeMap::new();
    for day in timestamps.filter_map(day_key) {
        *days.entry(day).or_insert(0) += 1;
    }
    days
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, mut user: User) -> StoreResult<ObjectId> {
        user.validate()?;
        let id = stamp(&mut user.id, &mut user.created_at, &mut user.updated_at);
        self.collections.write().await.users.push(user);
        Ok(id)
    }

    pub async fn insert_project(&self, mut project: Project) -> StoreResult<ObjectId> {
        project.validate()?;
        let id = stamp(
            &mut project.id,
            &mut project.created_at,
            &mut project.updated_at,
        );
        self.collections.write().await.projects.push(project);
        Ok(id)
    }

    pub async fn insert_bid(&self, mut bid: Bid) -> StoreResult<ObjectId> {
        bid.validate()?;
        let id = stamp(&mut bid.id, &mut bid.created_at, &mut bid.updated_at);
        self.collections.write().await.bids.push(bid);
        Ok(id)
    }

    pub async fn insert_review(&self, mut review: Review) -> StoreResult<ObjectId> {
        review.validate()?;
        let id = stamp(&mut review.id, &mut review.created_at, &mut review.updated_at);
        self.collections.write().await.reviews.push(review);
        Ok(id)
    }
}

#[async_trait]
impl AnalyticsStore for MemoryStore {
    async fn platform_stats(&self) -> StoreResult<PlatformStats> {
        let data = self.collections.read().await;
        let users_with = |role: Role| data.users.iter().filter(|u| u.role == role).count() as u64;

        Ok(PlatformStats {
            total_users: data.users.len() as u64,
            total_freelancers: users_with(Role::Freelancer),
            total_clients: users_with(Role::Client),
            total_projects: data.projects.len() as u64,
            total_bids: data.bids.len() as u64,
            total_reviews: data.reviews.len() as u64,
            completed_projects: data
                .projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Completed)
                .count() as u64,
        })
    }

    async fn skill_popularity(&self) -> StoreResult<Vec<SkillCount>> {
        let data = self.collections.read().await;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for skill in data
            .users
            .iter()
            .filter(|u| u.role == Role::Freelancer)
            .flat_map(|u| u.skills.iter())
        {
            *counts.entry(skill.as_str()).or_insert(0) += 1;
        }

        let mut skills: Vec<SkillCount> = counts
            .into_iter()
            .map(|(skill, count)| SkillCount {
                skill: skill.to_string(),
                count,
            })
            .collect();
        skills.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.skill.cmp(&b.skill)));
        Ok(skills)
    }

    async fn revenue_stats(&self) -> StoreResult<RevenueStats> {
        let data = self.collections.read().await;
        let budgets: Vec<f64> = data
            .projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Completed)
            .map(|p| p.budget)
            .collect();

        if budgets.is_empty() {
            return Ok(RevenueStats::default());
        }

        let total_revenue: f64 = budgets.iter().sum();
        Ok(RevenueStats {
            total_revenue,
            avg_project_budget: total_revenue / budgets.len() as f64,
        })
    }

    async fn signup_trends(&self, since: DateTime<Utc>) -> StoreResult<Vec<DailySignups>> {
        let data = self.collections.read().await;
        let days = per_day(
            data.users
                .iter()
                .filter_map(|u| in_window(u.created_at, since)),
        );

        Ok(days
            .into_iter()
            .map(|(date, signups)| DailySignups { date, signups })
            .collect())
    }

    async fn project_posting_trends(
        &self,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DailyProjects>> {
        let data = self.collections.read().await;
        let days = per_day(
            data.projects
                .iter()
                .filter_map(|p| in_window(p.created_at, since)),
        );

        Ok(days
            .into_iter()
            .map(|(date, projects)| DailyProjects { date, projects })
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
