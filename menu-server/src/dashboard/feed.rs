//! Per-day live feed
//!
//! One feed is active at a time. Selecting another day drops the old feed
//! before the new one attaches.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use super::view::SalesDashboard;
use super::{DashboardError, DashboardResult};
use crate::db::repository::OrderRepository;
use crate::live::LiveFeed;

pub struct SalesFeed {
    orders: OrderRepository,
    view: Arc<RwLock<SalesDashboard>>,
    feed: Mutex<Option<LiveFeed>>,
}

impl SalesFeed {
    pub fn new(orders: OrderRepository) -> Self {
        Self {
            orders,
            view: Arc::new(RwLock::new(SalesDashboard::default())),
            feed: Mutex::new(None),
        }
    }

    pub fn view(&self) -> Arc<RwLock<SalesDashboard>> {
        self.view.clone()
    }

    /// Day currently shown, if a feed is attached
    pub async fn current_date(&self) -> Option<String> {
        let slot = self.feed.lock().await;
        slot.as_ref().map(|_| self.view.read().date().to_string())
    }

    /// Attaches the feed for `date`. A no-op when that day is already live.
    pub async fn select_date(&self, date: NaiveDate) -> DashboardResult<()> {
        let date = date.format("%Y-%m-%d").to_string();
        let mut slot = self.feed.lock().await;

        if let Some(feed) = slot.as_ref()
            && feed.is_running()
            && self.view.read().date() == date
        {
            return Ok(());
        }

        slot.take();
        self.view.write().reset(date.clone());

        let subscription = self
            .orders
            .subscribe_by_date(&date)
            .await
            .map_err(DashboardError::Repo)?;
        let day = date.clone();
        let feed = LiveFeed::attach("sales", subscription, self.view.clone(), move |view, snaps| {
            // a late snapshot from a previous day's feed must not land here
            if view.date() == day {
                view.apply(snaps.iter().map(OrderRepository::from_snapshot).collect());
            }
        })
        .await?;

        tracing::info!(date = %date, "Sales feed attached");
        *slot = Some(feed);
        Ok(())
    }

    pub async fn stop(&self) {
        self.feed.lock().await.take();
    }
}
