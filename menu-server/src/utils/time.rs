//! 时间工具函数
//!
//! 订单的 `data`/`hora` 都取本地时钟，Clock 抽象方便测试固定时间。

use chrono::{Local, NaiveDate, NaiveDateTime};

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Data inválida: {}", date)))
}

/// Order date field (YYYY-MM-DD)
pub fn format_order_date(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Order time field (HH:MM, 24h)
pub fn format_order_time(at: NaiveDateTime) -> String {
    at.format("%H:%M").to_string()
}

/// Source of "now"
pub trait Clock: Send + Sync {
    /// Local wall-clock time
    fn now_local(&self) -> NaiveDateTime;

    /// Unix millis
    fn now_millis(&self) -> i64;

    fn today(&self) -> NaiveDate {
        self.now_local().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub local: NaiveDateTime,
    pub millis: i64,
}

impl FixedClock {
    pub fn new(local: NaiveDateTime, millis: i64) -> Self {
        Self { local, millis }
    }
}

impl Clock for FixedClock {
    fn now_local(&self) -> NaiveDateTime {
        self.local
    }

    fn now_millis(&self) -> i64 {
        self.millis
    }
}
