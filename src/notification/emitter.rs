//! 发布执行器 - 在协调器锁外执行平台调用
//!
//! 协调器在锁内生成 `EmitOp` 列表，释放锁后交给 `Emitter` 依次执行。
//! 平台失败只记录日志，不回滚状态。

use std::sync::Arc;
use tracing::{debug, error, warn};

use super::payload::PlatformNotification;
use crate::config::PreferenceSource;
use crate::platform::{NotificationPlatform, PlatformError};

/// 一次待执行的平台调用
#[derive(Debug, Clone, PartialEq)]
pub enum EmitOp {
    Post {
        id: i32,
        notification: Box<PlatformNotification>,
    },
    Cancel(i32),
    Badge(usize),
}

impl EmitOp {
    pub fn post(id: i32, notification: PlatformNotification) -> Self {
        EmitOp::Post {
            id,
            notification: Box::new(notification),
        }
    }
}

/// 平台调用执行器
#[derive(Clone)]
pub struct Emitter {
    platform: Arc<dyn NotificationPlatform>,
    prefs: Arc<dyn PreferenceSource>,
}

impl Emitter {
    pub fn new(platform: Arc<dyn NotificationPlatform>, prefs: Arc<dyn PreferenceSource>) -> Self {
        Self { platform, prefs }
    }

    pub fn platform(&self) -> &Arc<dyn NotificationPlatform> {
        &self.platform
    }

    /// 按顺序执行
    pub fn apply(&self, plan: Vec<EmitOp>) {
        for op in plan {
            match op {
                EmitOp::Post { id, notification } => {
                    self.post(id, &notification);
                }
                EmitOp::Cancel(id) => self.cancel(id),
                EmitOp::Badge(count) => self.platform.update_badge(count),
            }
        }
    }

    /// 发布通知；铃声无权限时用默认铃声重试一次
    pub fn post(&self, id: i32, notification: &PlatformNotification) -> bool {
        let error = match self.platform.post(id, notification) {
            Ok(()) => {
                debug!(id, title = %notification.title, alert_once = notification.alert_once, "Notification posted");
                return true;
            }
            Err(e) => e,
        };

        if error == PlatformError::SoundAccessDenied {
            if let Some(fallback) = self.with_default_sound(notification) {
                warn!(id, "Custom notification sound not accessible, retrying with default sound");
                return match self.platform.post(id, &fallback) {
                    Ok(()) => true,
                    Err(e) => {
                        error!(id, error = %e, "Failed to post notification with default sound");
                        false
                    }
                };
            }
        }

        error!(id, channel = notification.channel.as_str(), error = %error, "Failed to post notification");
        false
    }

    pub fn cancel(&self, id: i32) {
        if let Err(e) = self.platform.cancel(id) {
            warn!(id, error = %e, "Failed to cancel notification");
        }
    }

    /// 替换为默认铃声；渠道不支持或已经是默认铃声时返回 None
    fn with_default_sound(&self, notification: &PlatformNotification) -> Option<PlatformNotification> {
        if !notification.channel.supports_sound_fallback() {
            return None;
        }
        let default_sound = self.prefs.default_notification_sound();
        let schema = notification.schema.as_ref()?;
        if schema.sound_uri.as_deref() == Some(default_sound.as_str()) {
            return None;
        }

        let mut fallback = notification.clone();
        if let Some(schema) = fallback.schema.as_mut() {
            schema.sound_uri = Some(default_sound);
        }
        Some(fallback)
    }
}
