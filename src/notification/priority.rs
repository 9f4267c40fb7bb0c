//! Notification priority
//!
//! 用户在设置中选择的通知优先级，映射到平台的 priority 取值：
//! - MAX / HIGH: 弹出横幅
//! - DEFAULT: 正常显示
//! - LOW / MIN: 静默，仅在通知栏中出现

use serde::{Deserialize, Serialize};

/// Priority level for posted notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Min,
    Low,
    Default,
    #[default]
    High,
    Max,
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Min => "MIN",
            NotificationPriority::Low => "LOW",
            NotificationPriority::Default => "DEFAULT",
            NotificationPriority::High => "HIGH",
            NotificationPriority::Max => "MAX",
        }
    }

    /// 平台侧的数值（-2 ..= 2）
    pub fn platform_value(&self) -> i8 {
        match self {
            NotificationPriority::Min => -2,
            NotificationPriority::Low => -1,
            NotificationPriority::Default => 0,
            NotificationPriority::High => 1,
            NotificationPriority::Max => 2,
        }
    }
}

/// Parse a priority name (case-insensitive). Numeric platform values are accepted too.
pub fn parse_priority(value: &str) -> Option<NotificationPriority> {
    match value.trim().to_lowercase().as_str() {
        "min" | "-2" => Some(NotificationPriority::Min),
        "low" | "-1" => Some(NotificationPriority::Low),
        "default" | "0" => Some(NotificationPriority::Default),
        "high" | "1" => Some(NotificationPriority::High),
        "max" | "2" => Some(NotificationPriority::Max),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_display() {
        assert_eq!(format!("{}", NotificationPriority::High), "HIGH");
        assert_eq!(format!("{}", NotificationPriority::Min), "MIN");
    }

    #[test]
    fn test_platform_value_ordering() {
        assert!(NotificationPriority::Min.platform_value() < NotificationPriority::Low.platform_value());
        assert_eq!(NotificationPriority::Default.platform_value(), 0);
        assert_eq!(NotificationPriority::Max.platform_value(), 2);
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!(parse_priority("HIGH"), Some(NotificationPriority::High));
        assert_eq!(parse_priority(" low "), Some(NotificationPriority::Low));
        assert_eq!(parse_priority("-2"), Some(NotificationPriority::Min));
        assert_eq!(parse_priority("urgent"), None);
    }

    #[test]
    fn test_priority_serde_lowercase() {
        let json = serde_json::to_string(&NotificationPriority::Max).unwrap();
        assert_eq!(json, "\"max\"");
        let parsed: NotificationPriority = serde_json::from_str("\"default\"").unwrap();
        assert_eq!(parsed, NotificationPriority::Default);
    }
}
