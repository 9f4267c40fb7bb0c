//! 提醒限流 - alert-once 防抖
//!
//! 同一会话在 30 秒窗口内连续到达的消息只在第一次发声 / 振动，
//! 之后的更新带上 `alert_once` 标记。窗口从上一次实际发声的时间算起。
//! 上次提醒时间按 group_uid 记录，单调不减；group 清空后再出现也沿用原记录。

use std::collections::HashMap;

/// 再次提醒的最小间隔（毫秒）
pub const ALERT_AGAIN_WINDOW_MS: i64 = 30_000;

/// alert-once 限流器
#[derive(Debug)]
pub struct AlertThrottle {
    /// 防抖窗口（毫秒）
    window_ms: i64,
    /// group_uid -> 上次提醒时间（单调时钟毫秒）
    last_alert: HashMap<String, i64>,
}

impl AlertThrottle {
    pub fn new() -> Self {
        Self::with_window(ALERT_AGAIN_WINDOW_MS)
    }

    /// 创建带自定义窗口的限流器
    pub fn with_window(window_ms: i64) -> Self {
        Self {
            window_ms,
            last_alert: HashMap::new(),
        }
    }

    /// 计算本次是否应设置 alert_once；不在窗口内时记录本次为提醒时间
    pub fn check_and_record(&mut self, group_uid: &str, now: i64) -> bool {
        if self.is_within_window(group_uid, now) {
            return true;
        }
        let last = self.last_alert.entry(group_uid.to_string()).or_insert(now);
        *last = (*last).max(now);
        false
    }

    /// 只判断，不记录
    pub fn is_within_window(&self, group_uid: &str, now: i64) -> bool {
        self.last_alert
            .get(group_uid)
            .map(|last| now - *last < self.window_ms)
            .unwrap_or(false)
    }

    pub fn last_alert_time(&self, group_uid: &str) -> Option<i64> {
        self.last_alert.get(group_uid).copied()
    }

    /// 清理过期的记录（过期记录与无记录的判断结果相同）
    pub fn cleanup(&mut self, now: i64) {
        let window = self.window_ms;
        self.last_alert.retain(|_, last| now - *last < window);
    }

    pub fn tracked_groups(&self) -> usize {
        self.last_alert.len()
    }
}

impl Default for AlertThrottle {
    fn default() -> Self {
        Self::new()
    }
}
