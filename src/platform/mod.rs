//! 平台适配层接口
//!
//! 核心层只通过这里的 trait 与系统通知栏、时钟和锁定状态交互，
//! 便于用内存实现（`memory`）驱动测试和 CLI 回放。

pub mod memory;

use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

use crate::notification::payload::{NotificationCategory, PlatformNotification};

/// 应用锁定状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    #[default]
    Unlocked,
    /// PIN / 密码锁定
    PinLocked,
    /// 主密钥锁定
    MasterKeyLocked,
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        !matches!(self, LockState::Unlocked)
    }
}

/// 系统响铃模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingerMode {
    Silent,
    Vibrate,
    #[default]
    Normal,
}

/// 平台发布失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// 自定义铃声无访问权限
    #[error("access to notification sound denied")]
    SoundAccessDenied,
    #[error("notification rejected: {0}")]
    Rejected(String),
    #[error("notification service unavailable: {0}")]
    Unavailable(String),
}

/// 系统通知栏
pub trait NotificationPlatform: Send + Sync {
    /// 发布通知；相同 id 替换已有内容
    fn post(&self, id: i32, notification: &PlatformNotification) -> Result<(), PlatformError>;

    /// 撤回通知；id 不存在时也返回成功
    fn cancel(&self, id: i32) -> Result<(), PlatformError>;

    /// 本进程发布的、指定分类下仍在显示的通知 id
    fn list_owned_active(&self, category: NotificationCategory) -> Result<Vec<i32>, PlatformError>;

    fn ringer_mode(&self) -> RingerMode;

    /// 未读角标
    fn update_badge(&self, count: usize);
}

/// 单调时钟（毫秒），只用于 alert-once 间隔计算
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// 系统时钟
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}

/// 锁定状态查询
pub trait LockStateSource: Send + Sync {
    fn lock_state(&self) -> LockState;
}
