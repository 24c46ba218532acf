//! Dashboard view-model fed by the per-day order snapshot

use serde::Serialize;
use shared::models::Order;

use super::aggregator::{
    Bucket, BucketCounts, Buckets, FormattedSummary, SaleRow, SalesSummary, pending_notice, rows,
    search_rows,
};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub date: String,
    pub counts: BucketCounts,
    pub summary: SalesSummary,
    pub cards: FormattedSummary,
    pub notice: Option<String>,
}

#[derive(Debug, Default)]
pub struct SalesDashboard {
    date: String,
    buckets: Buckets,
    summary: SalesSummary,
    notice: Option<String>,
}

impl SalesDashboard {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// Switches to another day and clears the previous day's data
    pub fn reset(&mut self, date: impl Into<String>) {
        *self = Self::new(date);
    }

    /// Replaces every bucket with the new snapshot. Orders of another day
    /// are ignored.
    pub fn apply(&mut self, orders: Vec<Order>) {
        let previous_pending = self.buckets.pending.len();
        let orders: Vec<Order> = orders.into_iter().filter(|o| o.date == self.date).collect();
        self.buckets = Buckets::partition(orders);
        self.summary = SalesSummary::from_finalized(&self.buckets.finalized);
        if let Some(notice) = pending_notice(previous_pending, self.buckets.pending.len()) {
            tracing::info!(date = %self.date, "{}", notice);
            self.notice = Some(notice);
        } else if self.buckets.pending.is_empty() {
            self.notice = None;
        }
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn orders(&self, bucket: Bucket) -> &[Order] {
        self.buckets.get(bucket)
    }

    pub fn summary(&self) -> &SalesSummary {
        &self.summary
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn rows(&self, bucket: Bucket, search: Option<&str>) -> Vec<SaleRow> {
        let all = rows(bucket, self.buckets.get(bucket));
        match search {
            Some(term) => search_rows(all, term),
            None => all,
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            date: self.date.clone(),
            counts: self.buckets.counts(),
            summary: self.summary.clone(),
            cards: self.summary.formatted(),
            notice: self.notice.clone(),
        }
    }
}
