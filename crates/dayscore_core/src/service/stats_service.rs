//! Home dashboard and ranking statistics.
//!
//! # Responsibility
//! - Summarize one user's records for the home view.
//! - Rank all users by cumulative satisfaction points.
//!
//! # Invariants
//! - A user without records has no average (`None`), not `0.0`.
//! - The streak counts back from `today`, or from the day before when
//!   `today` has no record yet.
//! - Ranks are 1-based, ordered by total points descending; equal totals
//!   keep user registration order and still get distinct ranks.

use crate::model::satisfaction::{
    average_of, format_average, image_path_for, round_to_tenth, SatisfactionLevel,
};
use crate::model::session::Session;
use crate::model::user::UserId;
use crate::repo::record_repo::RecordRepository;
use crate::repo::RepoResult;
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::collections::HashSet;

/// Home dashboard summary for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStats {
    /// Mean level rounded to one decimal; `None` when there are no records.
    pub average_satisfaction: Option<f64>,
    pub yesterday_satisfaction: Option<SatisfactionLevel>,
    pub consecutive_days: u32,
    pub total_records: u64,
}

impl HomeStats {
    /// `3.5`-style display of the average, when one exists.
    pub fn formatted_average(&self) -> Option<String> {
        self.average_satisfaction.map(format_average)
    }

    /// Dashboard image for the average, when one exists.
    pub fn image_path(&self) -> Option<String> {
        self.average_satisfaction.map(image_path_for)
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: u32,
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub total_satisfaction: u64,
    /// Mean level rounded to one decimal.
    pub average_satisfaction: f64,
    pub total_records: u64,
}

/// Statistics service over record repositories.
pub struct StatsService<R: RecordRepository> {
    repo: R,
}

impl<R: RecordRepository> StatsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Builds the home summary for the session user as of `today`.
    pub fn home_stats(&self, session: &Session, today: NaiveDate) -> RepoResult<HomeStats> {
        let days = self.repo.record_days(session.user_id())?;

        let average_satisfaction =
            average_of(days.iter().map(|day| day.satisfaction_level)).map(round_to_tenth);
        let yesterday = today.pred_opt();
        let yesterday_satisfaction = yesterday.and_then(|yesterday| {
            days.iter()
                .find(|day| day.date == yesterday)
                .map(|day| day.satisfaction_level)
        });
        let recorded: HashSet<NaiveDate> = days.iter().map(|day| day.date).collect();
        let consecutive_days = streak_length(&recorded, today);

        info!(
            "event=stats_home module=service status=ok user_id={} total_records={} streak={}",
            session.user_id(),
            days.len(),
            consecutive_days
        );

        Ok(HomeStats {
            average_satisfaction,
            yesterday_satisfaction,
            consecutive_days,
            total_records: days.len() as u64,
        })
    }

    /// Ranks every user with at least one record by total points.
    pub fn ranking(&self) -> RepoResult<Vec<RankingEntry>> {
        let mut totals = self.repo.user_totals()?;
        totals.sort_by(|a, b| b.total_points.cmp(&a.total_points));

        let ranking: Vec<RankingEntry> = totals
            .into_iter()
            .zip(1_u32..)
            .map(|(totals, rank)| RankingEntry {
                rank,
                average_satisfaction: round_to_tenth(
                    totals.total_points as f64 / totals.record_count.max(1) as f64,
                ),
                user_id: totals.user_id,
                username: totals.username,
                email: totals.email,
                total_satisfaction: totals.total_points,
                total_records: totals.record_count,
            })
            .collect();

        info!(
            "event=stats_ranking module=service status=ok users={}",
            ranking.len()
        );
        Ok(ranking)
    }
}

/// Counts consecutive recorded days ending at `today`, or at the day before
/// when `today` is not recorded.
pub fn streak_length(recorded: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if recorded.contains(&today) {
        Some(today)
    } else {
        today.pred_opt()
    };

    let mut count = 0;
    let mut cursor = start;
    while let Some(day) = cursor.filter(|day| recorded.contains(day)) {
        count += 1;
        cursor = day.pred_opt();
    }
    count
}
