//! 辅助系统通知
//!
//! 与会话通知共用平台和设置，但不进入会话存储：
//! 发送失败、备份失败、群通话提醒。

use tracing::{debug, warn};

use super::dnd::DndPolicy;
use super::emitter::{EmitOp, Emitter};
use super::model::{NotificationGroup, Receiver};
use super::msg;
use super::payload::{
    ActionKind, NotificationAction, NotificationCategory, NotificationChannel, PlatformNotification,
};
use super::priority::NotificationPriority;
use super::schema::SchemaBuilder;
use crate::config::PreferenceSource;
use std::sync::Arc;

pub const UNSENT_MESSAGES_NOTIFICATION_ID: i32 = 726;
pub const SAFE_BACKUP_FAILED_NOTIFICATION_ID: i32 = 727;
/// 群通话通知 id = 基数 + group_id
pub const GROUP_CALL_NOTIFICATION_BASE: i32 = 40_000;

/// 群通话通知 id；group_id 超出范围时返回 None
pub fn group_call_notification_id(group_id: i64) -> Option<i32> {
    i32::try_from(group_id)
        .ok()
        .and_then(|id| GROUP_CALL_NOTIFICATION_BASE.checked_add(id))
}

/// 辅助系统通知
#[derive(Clone)]
pub struct SystemNotices {
    emitter: Emitter,
    prefs: Arc<dyn PreferenceSource>,
    dnd: DndPolicy,
    schemas: SchemaBuilder,
}

impl SystemNotices {
    pub fn new(
        emitter: Emitter,
        prefs: Arc<dyn PreferenceSource>,
        dnd: DndPolicy,
        schemas: SchemaBuilder,
    ) -> Self {
        Self {
            emitter,
            prefs,
            dnd,
            schemas,
        }
    }

    /// 发送失败的消息数；为 0 时撤回
    pub fn show_unsent_messages(&self, count: usize) {
        if count == 0 {
            self.emitter.cancel(UNSENT_MESSAGES_NOTIFICATION_ID);
            return;
        }

        let notification = PlatformNotification::new(
            NotificationChannel::Alert,
            NotificationCategory::Error,
            msg::UNSENT_TITLE,
            msg::unsent_messages(count),
        )
        .with_priority(NotificationPriority::High)
        .with_ticker(msg::unsent_messages(count))
        .with_action(NotificationAction::new(ActionKind::TryAgain, msg::TRY_AGAIN));

        self.emitter
            .apply(vec![EmitOp::post(UNSENT_MESSAGES_NOTIFICATION_ID, notification)]);
    }

    /// 备份失败提醒，备份未启用时撤回
    pub fn show_safe_backup_failed(&self, days: u32) {
        if !self.prefs.safe_backup_enabled() || days == 0 {
            self.emitter.cancel(SAFE_BACKUP_FAILED_NOTIFICATION_ID);
            return;
        }

        let notification = PlatformNotification::new(
            NotificationChannel::Alert,
            NotificationCategory::Error,
            msg::SAFE_BACKUP_FAILED_TITLE,
            msg::safe_backup_failed(days),
        )
        .with_priority(NotificationPriority::High);

        self.emitter
            .apply(vec![EmitOp::post(SAFE_BACKUP_FAILED_NOTIFICATION_ID, notification)]);
    }

    /// 群通话开始；会话静音时不提醒
    pub fn show_group_call(&self, group: &NotificationGroup, caller: &str) {
        let Receiver::Group { group_id, .. } = &group.receiver else {
            warn!(receiver = %group.receiver, "Group call notice for a non-group receiver");
            return;
        };
        let Some(id) = group_call_notification_id(*group_id) else {
            warn!(group_id, "Group id out of notification id range");
            return;
        };
        if self.dnd.is_chat_muted(&group.receiver) {
            debug!(group_id, "Group call notice suppressed by mute");
            return;
        }

        let schema = self
            .schemas
            .build(group, None)
            .unwrap_or_else(|| self.schemas.quiet_schema());
        let mut notification = PlatformNotification::new(
            NotificationChannel::GroupCall,
            NotificationCategory::Call,
            group.name.clone(),
            msg::group_call_started(caller),
        )
        .with_priority(self.prefs.notification_priority())
        .with_schema(schema)
        .with_action(
            NotificationAction::new(ActionKind::JoinCall, msg::JOIN_CALL)
                .showing_ui()
                .for_receiver(group.receiver.unique_id_string()),
        );
        notification.group_key = Some(group.group_uid.clone());
        notification.large_icon = group.avatar.clone();
        notification.alert_once = true;

        self.emitter.apply(vec![EmitOp::post(id, notification)]);
    }

    pub fn cancel_group_call(&self, group_id: i64) {
        if let Some(id) = group_call_notification_id(group_id) {
            self.emitter.cancel(id);
        }
    }
}
