#![allow(dead_code)]

use std::sync::Arc;

use message_notifier::notification::PlatformNotification;
use message_notifier::{
    ConversationNotification, InMemoryPlatform, LockState, LockStateHandle, ManualClock,
    NotificationCoordinator, NotificationGroup, Person, PlatformOp, Preferences, Receiver,
};

/// 测试环境：协调器 + 内存平台 + 手动时钟 + 锁定状态
pub struct Harness {
    pub coordinator: Arc<NotificationCoordinator>,
    pub platform: Arc<InMemoryPlatform>,
    pub clock: Arc<ManualClock>,
    pub lock: Arc<LockStateHandle>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_prefs(Preferences::default())
    }

    pub fn with_prefs(prefs: Preferences) -> Self {
        let platform = Arc::new(InMemoryPlatform::new());
        let clock = Arc::new(ManualClock::new());
        let lock = Arc::new(LockStateHandle::default());
        let coordinator = NotificationCoordinator::builder()
            .platform(platform.clone())
            .preferences(Arc::new(prefs))
            .clock(clock.clone())
            .lock_state(lock.clone())
            .build()
            .expect("coordinator");

        Self {
            coordinator: Arc::new(coordinator),
            platform,
            clock,
            lock,
        }
    }

    pub fn lock_app(&self) {
        self.lock.set(LockState::PinLocked);
        self.coordinator.on_lock_transition(true);
    }

    pub fn unlock_app(&self) {
        self.lock.set(LockState::Unlocked);
        self.coordinator.on_lock_transition(false);
    }

    /// 所有成功发布的通知
    pub fn posts(&self) -> Vec<(i32, PlatformNotification)> {
        self.platform.all_posts()
    }

    pub fn post_count(&self) -> usize {
        self.platform
            .ops()
            .iter()
            .filter(|op| matches!(op, PlatformOp::Post { .. }))
            .count()
    }
}

/// 1:1 会话，notification id 等于 unique_id
pub fn contact(identity: &str, unique_id: i32, name: &str) -> NotificationGroup {
    NotificationGroup::new(Receiver::contact(identity, unique_id), name)
}

pub fn group_chat(group_id: i64, unique_id: i32, name: &str) -> NotificationGroup {
    NotificationGroup::new(Receiver::group(group_id, unique_id), name)
}

pub fn message(uid: &str, group: &NotificationGroup, sender: &str, text: &str) -> ConversationNotification {
    ConversationNotification::new(uid, group.clone(), Person::new(sender, sender), text)
}
