//! 时间工具函数，统一使用 UTC
//!
//! 日期字符串只活在 HTTP 边界上：handler 层换算成 `i64` Unix millis，
//! repository 层不认识任何别的时间表示。

use chrono::{Datelike, Months, NaiveDate, Utc};

use super::{AppError, AppResult};

/// `YYYY-MM-DD` 字符串转 [`NaiveDate`]
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("date must be YYYY-MM-DD, got '{date}'")))
}

/// 验证日期严格在过去 (UTC)
pub fn validate_past_date(date: NaiveDate, field: &str) -> AppResult<()> {
    let today = Utc::now().date_naive();
    if date >= today {
        return Err(AppError::validation(format!(
            "{} must be in the past (today is {})",
            field, today
        )));
    }
    Ok(())
}

/// 日期开始 (00:00:00 UTC) → Unix millis
pub fn day_start_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis()
}

/// Unix millis → UTC 日期
pub fn date_from_millis(millis: i64) -> NaiveDate {
    chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .date_naive()
}

/// Unix millis → 月份键 "YYYY-MM" (UTC)
pub fn month_key(millis: i64) -> String {
    let date = date_from_millis(millis);
    format!("{:04}-{:02}", date.year(), date.month())
}

/// 滚动窗口起点: 包含当前月在内往前数 `months` 个自然月的月初 (UTC)
///
/// `months = 12` → 去年同月 1 号 00:00，调用方使用 `>= start` 语义。
pub fn trailing_months_start(now_millis: i64, months: u32) -> i64 {
    let current_month_start = date_from_millis(now_millis).with_day(1).unwrap();
    let start = current_month_start
        .checked_sub_months(Months::new(months.saturating_sub(1)))
        .unwrap_or(current_month_start);
    day_start_millis(start)
}

/// 根据出生日期计算某天的年龄
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(date_of_birth).unwrap_or(0)
}
