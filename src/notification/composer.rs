//! 通知内容组装
//!
//! 把一个会话（group）及其待处理消息转换为 `PlatformNotification`。
//!
//! 预览策略：偏好开启预览 && 会话未隐藏 && 应用未锁定。
//! 预览关闭时正文和 ticker 退化为 "N new messages" 摘要，
//! 不带会话历史，动作只保留不可见的"标为已读"。

use std::sync::Arc;

use super::model::{ConversationNotification, MessageKind, NotificationGroup, Person};
use super::msg;
use super::payload::{
    ActionKind, MessagingStyle, NotificationAction, NotificationCategory, NotificationChannel,
    PlatformNotification, RemoteInput, StyleMessage,
};
use super::schema::NotificationSchema;
use crate::config::{HiddenChats, PreferenceSource};

/// ticker 中消息文本的最大长度（Unicode 码点）
pub const MAX_TICKER_TEXT_LENGTH: usize = 256;
/// 会话历史中保留的最近消息数
pub const MAX_RETAINED_MESSAGES: usize = 25;
pub const NAME_PREPEND_SEPARATOR: &str = ": ";
const ELLIPSIS: &str = "...";

/// 截断到最多 `max` 个码点（含省略号）
pub fn trim_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.chars().count());
    let mut trimmed: String = text.chars().take(keep).collect();
    trimmed.push_str(ELLIPSIS);
    trimmed
}

/// 组装一条会话通知所需的上下文
#[derive(Debug, Clone)]
pub struct ComposeContext<'a> {
    /// 触发本次发布的通知
    pub trigger: &'a ConversationNotification,
    /// 该 group 的全部待处理通知，最新的在前
    pub history: &'a [ConversationNotification],
    /// 全部待处理通知数
    pub unread_messages: usize,
    /// 有待处理通知的会话数
    pub unread_conversations: usize,
    pub schema: NotificationSchema,
    pub alert_once: bool,
    pub unlocked: bool,
}

impl ComposeContext<'_> {
    fn group(&self) -> &NotificationGroup {
        &self.trigger.group
    }

    fn group_count(&self) -> usize {
        self.history.len().max(1)
    }
}

/// 通知内容组装器
#[derive(Clone)]
pub struct PresentationComposer {
    prefs: Arc<dyn PreferenceSource>,
    hidden: Arc<dyn HiddenChats>,
}

impl PresentationComposer {
    pub fn new(prefs: Arc<dyn PreferenceSource>, hidden: Arc<dyn HiddenChats>) -> Self {
        Self { prefs, hidden }
    }

    /// 是否显示消息预览
    pub fn shows_preview(&self, group: &NotificationGroup, unlocked: bool) -> bool {
        self.prefs.show_message_preview()
            && !self.hidden.contains(group.receiver.unique_id_string())
            && unlocked
    }

    pub fn is_hidden(&self, group: &NotificationGroup) -> bool {
        self.hidden.contains(group.receiver.unique_id_string())
    }

    /// 组装会话通知
    pub fn compose(&self, ctx: &ComposeContext<'_>) -> PlatformNotification {
        let group = ctx.group();
        let trigger = ctx.trigger;
        let preview = self.shows_preview(group, ctx.unlocked);
        let chat_summary = msg::new_messages(ctx.group_count());
        let total_summary = msg::new_messages_in_chats(ctx.unread_messages, ctx.unread_conversations);

        let title = if preview && !group.receiver.is_group() {
            trigger.sender.name.clone()
        } else if preview {
            group.name.clone()
        } else if self.is_hidden(group) {
            msg::PRIVATE_CHAT.to_string()
        } else {
            group.name.clone()
        };

        let (text, ticker) = if preview {
            let ticker = format!(
                "{}{}{}",
                trigger.sender.name,
                NAME_PREPEND_SEPARATOR,
                trim_text(&trigger.message, MAX_TICKER_TEXT_LENGTH)
            );
            (trigger.message.clone(), ticker)
        } else {
            (chat_summary.clone(), total_summary)
        };

        let mut notification = PlatformNotification::new(
            NotificationChannel::Chat,
            NotificationCategory::Message,
            title,
            text,
        )
        .with_priority(self.prefs.notification_priority())
        .with_ticker(ticker)
        .with_public_version(chat_summary, msg::CONTENTS_HIDDEN)
        .with_schema(ctx.schema.clone());

        notification.group_key = Some(group.group_uid.clone());
        notification.alert_once = ctx.alert_once;

        if preview {
            notification.style = Some(self.messaging_style(ctx));
            notification.actions = self.actions(ctx);
            notification.wearable_actions = self.wearable_actions(ctx);
            notification.shortcut_id = Some(group.receiver.unique_id_string().to_string());
            notification.person = Some(trigger.sender.clone());
            notification.large_icon = group.avatar.clone();
        } else {
            notification.actions = vec![self.mark_read(group).invisible()];
        }

        notification
    }

    /// 最近 25 条消息，最早的在前
    fn messaging_style(&self, ctx: &ComposeContext<'_>) -> MessagingStyle {
        let group = ctx.group();
        let is_group = group.receiver.is_group();

        let messages = ctx
            .history
            .iter()
            .take(MAX_RETAINED_MESSAGES)
            .rev()
            .map(|n| StyleMessage {
                text: n.message.clone(),
                timestamp_millis: n.timestamp_millis(),
                // 单聊中统一使用会话名
                sender: if is_group {
                    n.sender.clone()
                } else {
                    n.sender.renamed(group.name.clone())
                },
                data: n.thumbnail.clone(),
            })
            .collect();

        MessagingStyle {
            me: Person::me(msg::ME),
            conversation_title: is_group.then(|| group.name.clone()),
            is_group_conversation: is_group,
            messages,
        }
    }

    fn actions(&self, ctx: &ComposeContext<'_>) -> Vec<NotificationAction> {
        let group = ctx.group();
        let trigger = ctx.trigger;
        let single = ctx.group_count() == 1;

        let mut actions = vec![self.reply(group, Vec::new())];

        if !group.receiver.is_group() && trigger.kind == MessageKind::VoipStatus {
            actions.push(
                NotificationAction::new(ActionKind::ReturnCall, msg::RETURN_CALL)
                    .showing_ui()
                    .for_receiver(group.receiver.unique_id_string()),
            );
        } else if single {
            actions.push(self.ack(group, trigger));
        }

        actions.push(self.mark_read(group));
        actions
    }

    fn wearable_actions(&self, ctx: &ComposeContext<'_>) -> Vec<NotificationAction> {
        let group = ctx.group();
        let choices = msg::WEARABLE_REPLY_CHOICES
            .iter()
            .map(|c| c.to_string())
            .collect();

        let mut actions = vec![self.reply(group, choices)];
        if !group.receiver.is_group() && ctx.group_count() == 1 {
            actions.push(self.ack(group, ctx.trigger));
            actions.push(
                NotificationAction::new(ActionKind::ThumbsDown, msg::DECLINE)
                    .for_receiver(group.receiver.unique_id_string())
                    .for_message(ctx.trigger.message_id),
            );
        }
        actions.push(self.mark_read(group));
        actions
    }

    fn reply(&self, group: &NotificationGroup, choices: Vec<String>) -> NotificationAction {
        NotificationAction::new(ActionKind::Reply, msg::REPLY)
            .for_receiver(group.receiver.unique_id_string())
            .with_remote_input(RemoteInput {
                label: msg::reply_label(&group.name, group.receiver.is_group()),
                choices,
                allow_generated_replies: !self.prefs.disable_smart_replies(),
            })
    }

    fn ack(&self, group: &NotificationGroup, trigger: &ConversationNotification) -> NotificationAction {
        NotificationAction::new(ActionKind::ThumbsUp, msg::ACKNOWLEDGE)
            .for_receiver(group.receiver.unique_id_string())
            .for_message(trigger.message_id)
    }

    fn mark_read(&self, group: &NotificationGroup) -> NotificationAction {
        NotificationAction::new(ActionKind::MarkAsRead, msg::MARK_READ)
            .for_receiver(group.receiver.unique_id_string())
    }

    /// 锁定时替代会话详情的占位通知
    pub fn pin_locked_placeholder(
        &self,
        unread_messages: usize,
        schema: NotificationSchema,
        alert_once: bool,
    ) -> PlatformNotification {
        let mut notification = PlatformNotification::new(
            NotificationChannel::Chat,
            NotificationCategory::Message,
            msg::NEW_MESSAGES_LOCKED,
            msg::LOCKED_DESCRIPTION,
        )
        .with_priority(self.prefs.notification_priority())
        .with_ticker(msg::new_messages(unread_messages.max(1)))
        .with_public_version(msg::NEW_MESSAGES_LOCKED, msg::LOCKED_DESCRIPTION)
        .with_schema(schema);
        notification.alert_once = alert_once;
        notification
    }

    /// 主密钥锁定时的通用提示
    pub fn master_key_placeholder(&self, schema: NotificationSchema) -> PlatformNotification {
        PlatformNotification::new(
            NotificationChannel::Chat,
            NotificationCategory::Message,
            msg::MASTER_KEY_LOCKED,
            msg::MASTER_KEY_LOCKED_DESCRIPTION,
        )
        .with_priority(self.prefs.notification_priority())
        .with_ticker(msg::MASTER_KEY_LOCKED)
        .with_public_version(msg::MASTER_KEY_LOCKED, msg::MASTER_KEY_LOCKED_DESCRIPTION)
        .with_schema(schema)
    }
}
