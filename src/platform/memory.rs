//! 内存平台实现 - 用于测试与 CLI 回放
//!
//! 记录所有平台调用，并保存当前"显示中"的通知。

use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{Clock, NotificationPlatform, PlatformError, RingerMode};
use crate::notification::payload::{NotificationCategory, PlatformNotification};

/// 一次平台调用
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlatformOp {
    Post {
        id: i32,
        notification: PlatformNotification,
    },
    Rejected {
        id: i32,
        error: String,
    },
    Cancel {
        id: i32,
    },
    Badge {
        count: usize,
    },
}

#[derive(Debug, Default)]
struct MemoryState {
    active: BTreeMap<i32, PlatformNotification>,
    ops: Vec<PlatformOp>,
    badge: Option<usize>,
    ringer_mode: RingerMode,
    pending_failures: VecDeque<PlatformError>,
    denied_sounds: HashSet<String>,
}

/// 内存中的系统通知栏
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    state: Mutex<MemoryState>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_ringer_mode(&self, mode: RingerMode) {
        self.lock().ringer_mode = mode;
    }

    /// 让下一次 post 失败
    pub fn fail_next_post(&self, error: PlatformError) {
        self.lock().pending_failures.push_back(error);
    }

    /// 拒绝所有使用该铃声的 post（模拟铃声权限被收回）
    pub fn deny_sound(&self, sound_uri: impl Into<String>) {
        self.lock().denied_sounds.insert(sound_uri.into());
    }

    /// 当前显示中的通知
    pub fn active(&self, id: i32) -> Option<PlatformNotification> {
        self.lock().active.get(&id).cloned()
    }

    pub fn active_ids(&self) -> Vec<i32> {
        self.lock().active.keys().copied().collect()
    }

    pub fn is_active(&self, id: i32) -> bool {
        self.lock().active.contains_key(&id)
    }

    /// 最近一次发布的角标，从未发布为 None
    pub fn badge(&self) -> Option<usize> {
        self.lock().badge
    }

    pub fn ops(&self) -> Vec<PlatformOp> {
        self.lock().ops.clone()
    }

    /// 取出并清空调用记录
    pub fn take_ops(&self) -> Vec<PlatformOp> {
        std::mem::take(&mut self.lock().ops)
    }

    /// 某个 id 上成功发布过的所有通知，按时间顺序
    pub fn posts_for(&self, id: i32) -> Vec<PlatformNotification> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                PlatformOp::Post {
                    id: posted,
                    notification,
                } if *posted == id => Some(notification.clone()),
                _ => None,
            })
            .collect()
    }

    /// 所有成功发布的通知
    pub fn all_posts(&self) -> Vec<(i32, PlatformNotification)> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                PlatformOp::Post { id, notification } => Some((*id, notification.clone())),
                _ => None,
            })
            .collect()
    }
}

impl NotificationPlatform for InMemoryPlatform {
    fn post(&self, id: i32, notification: &PlatformNotification) -> Result<(), PlatformError> {
        let mut state = self.lock();

        let denied = notification
            .schema
            .as_ref()
            .and_then(|s| s.sound_uri.as_ref())
            .map(|uri| state.denied_sounds.contains(uri))
            .unwrap_or(false);
        let failure = if denied {
            Some(PlatformError::SoundAccessDenied)
        } else {
            state.pending_failures.pop_front()
        };

        if let Some(error) = failure {
            state.ops.push(PlatformOp::Rejected {
                id,
                error: error.to_string(),
            });
            return Err(error);
        }

        state.active.insert(id, notification.clone());
        state.ops.push(PlatformOp::Post {
            id,
            notification: notification.clone(),
        });
        Ok(())
    }

    fn cancel(&self, id: i32) -> Result<(), PlatformError> {
        let mut state = self.lock();
        state.active.remove(&id);
        state.ops.push(PlatformOp::Cancel { id });
        Ok(())
    }

    fn list_owned_active(&self, category: NotificationCategory) -> Result<Vec<i32>, PlatformError> {
        Ok(self
            .lock()
            .active
            .iter()
            .filter(|(_, n)| n.category == category)
            .map(|(id, _)| *id)
            .collect())
    }

    fn ringer_mode(&self) -> RingerMode {
        self.lock().ringer_mode
    }

    fn update_badge(&self, count: usize) {
        let mut state = self.lock();
        state.badge = Some(count);
        state.ops.push(PlatformOp::Badge { count });
    }
}

/// 可手动推进的时钟
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::payload::NotificationChannel;
    use crate::notification::schema::NotificationSchema;

    fn message(title: &str) -> PlatformNotification {
        PlatformNotification::new(
            NotificationChannel::Chat,
            NotificationCategory::Message,
            title,
            "body",
        )
    }

    #[test]
    fn test_post_replaces_and_cancel_is_idempotent() {
        let platform = InMemoryPlatform::new();
        platform.post(1, &message("first")).unwrap();
        platform.post(1, &message("second")).unwrap();
        assert_eq!(platform.active(1).unwrap().title, "second");
        assert_eq!(platform.posts_for(1).len(), 2);

        platform.cancel(1).unwrap();
        platform.cancel(1).unwrap();
        assert!(!platform.is_active(1));
    }

    #[test]
    fn test_list_owned_active_filters_category() {
        let platform = InMemoryPlatform::new();
        platform.post(1, &message("chat")).unwrap();
        let alert = PlatformNotification::new(
            NotificationChannel::Alert,
            NotificationCategory::Error,
            "oops",
            "",
        );
        platform.post(2, &alert).unwrap();

        assert_eq!(
            platform.list_owned_active(NotificationCategory::Message).unwrap(),
            vec![1]
        );
    }

    #[test]
    fn test_failures() {
        let platform = InMemoryPlatform::new();
        platform.fail_next_post(PlatformError::Unavailable("boot".to_string()));
        assert!(platform.post(1, &message("x")).is_err());
        assert!(platform.post(1, &message("x")).is_ok());

        platform.deny_sound("content://custom");
        let mut schema = NotificationSchema::silent();
        schema.sound_uri = Some("content://custom".to_string());
        let n = message("y").with_schema(schema);
        assert_eq!(platform.post(2, &n), Err(PlatformError::SoundAccessDenied));
        assert!(!platform.is_active(2));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        clock.advance(5_000);
        assert_eq!(clock.now_millis(), 5_000);
        clock.set(31_000);
        assert_eq!(clock.now_millis(), 31_000);
        assert_eq!(ManualClock::starting_at(7).now_millis(), 7);
    }
}
