//! 小工具

/// 当前 UTC 时间的 Unix 毫秒时间戳
///
/// 所有落库时间戳（`created_at` / `updated_at` / `payment_date`）都用这个刻度。
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_millisecond_scale() {
        let now = now_millis();
        // 2020-01-01 之后，毫秒刻度（秒刻度会小三个量级）
        assert!(now > 1_577_836_800_000);
        assert!(now < 4_102_444_800_000);
    }
}
