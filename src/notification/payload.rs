//! 平台通知载荷
//!
//! 核心层把会话状态转换成 `PlatformNotification`，交给平台适配层发布。
//! 载荷只描述"显示什么"，不包含任何平台对象（PendingIntent、图标位图等）。

use serde::{Deserialize, Serialize};

use super::model::{Person, Thumbnail};
use super::priority::NotificationPriority;
use super::schema::NotificationSchema;

/// 平台通知渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// 新消息
    Chat,
    /// 静默更新
    ChatUpdate,
    /// 群通话
    GroupCall,
    /// 错误 / 警告
    Alert,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Chat => "chat",
            NotificationChannel::ChatUpdate => "chat_update",
            NotificationChannel::GroupCall => "group_call",
            NotificationChannel::Alert => "alert",
        }
    }

    /// 发布失败时是否可以回退到默认铃声重试
    pub fn supports_sound_fallback(&self) -> bool {
        !matches!(self, NotificationChannel::Alert)
    }
}

/// 通知分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Message,
    Call,
    Error,
}

/// 锁屏 / 公开可见时显示的脱敏版本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicVersion {
    pub title: String,
    pub text: String,
}

/// 会话历史中的一条消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleMessage {
    pub text: String,
    /// 绝对时间戳（毫秒），未知为 0
    pub timestamp_millis: i64,
    pub sender: Person,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Thumbnail>,
}

/// Messaging style 会话历史（最早的在前）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingStyle {
    pub me: Person,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_title: Option<String>,
    pub is_group_conversation: bool,
    pub messages: Vec<StyleMessage>,
}

/// 通知动作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Reply,
    ThumbsUp,
    ThumbsDown,
    MarkAsRead,
    ReturnCall,
    JoinCall,
    TryAgain,
}

/// 动作是否渲染给用户
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVisibility {
    Visible,
    /// 不显示，但辅助功能 / 车载等集成仍可触发
    Invisible,
}

/// 内联输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteInput {
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    pub allow_generated_replies: bool,
}

/// 通知动作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub kind: ActionKind,
    pub label: String,
    pub visibility: ActionVisibility,
    pub shows_user_interface: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_input: Option<RemoteInput>,
    /// 动作作用的接收方（unique_id_string）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// 动作作用的消息（ack / decline）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
}

impl NotificationAction {
    pub fn new(kind: ActionKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            visibility: ActionVisibility::Visible,
            shows_user_interface: false,
            remote_input: None,
            receiver: None,
            message_id: None,
        }
    }

    pub fn invisible(mut self) -> Self {
        self.visibility = ActionVisibility::Invisible;
        self
    }

    pub fn showing_ui(mut self) -> Self {
        self.shows_user_interface = true;
        self
    }

    pub fn with_remote_input(mut self, input: RemoteInput) -> Self {
        self.remote_input = Some(input);
        self
    }

    pub fn for_receiver(mut self, unique_id_string: impl Into<String>) -> Self {
        self.receiver = Some(unique_id_string.into());
        self
    }

    pub fn for_message(mut self, message_id: Option<i64>) -> Self {
        self.message_id = message_id;
        self
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == ActionVisibility::Visible
    }
}

/// 交给平台发布的通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformNotification {
    pub channel: NotificationChannel,
    pub category: NotificationCategory,
    pub priority: NotificationPriority,
    pub title: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_version: Option<PublicVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<MessagingStyle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
    /// 穿戴设备上的动作
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wearable_actions: Vec<NotificationAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    pub alert_once: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<NotificationSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut_id: Option<String>,
    /// 发送者（用于系统 DND 的联系人优先级）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<Person>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_icon: Option<String>,
}

impl PlatformNotification {
    pub fn new(
        channel: NotificationChannel,
        category: NotificationCategory,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            category,
            priority: NotificationPriority::Default,
            title: title.into(),
            text: text.into(),
            ticker: None,
            public_version: None,
            style: None,
            actions: Vec::new(),
            wearable_actions: Vec::new(),
            group_key: None,
            alert_once: false,
            schema: None,
            shortcut_id: None,
            person: None,
            large_icon: None,
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn with_public_version(mut self, title: impl Into<String>, text: impl Into<String>) -> Self {
        self.public_version = Some(PublicVersion {
            title: title.into(),
            text: text.into(),
        });
        self
    }

    pub fn with_schema(mut self, schema: NotificationSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.actions.push(action);
        self
    }

    /// 所有用户可见的文本（标题、正文、ticker、公开版本、会话历史）
    pub fn visible_texts(&self) -> Vec<&str> {
        let mut texts = vec![self.title.as_str(), self.text.as_str()];
        if let Some(ticker) = &self.ticker {
            texts.push(ticker);
        }
        if let Some(public) = &self.public_version {
            texts.push(&public.title);
            texts.push(&public.text);
        }
        if let Some(style) = &self.style {
            texts.extend(style.messages.iter().map(|m| m.text.as_str()));
        }
        texts
    }

    pub fn visible_actions(&self) -> Vec<ActionKind> {
        self.actions
            .iter()
            .filter(|a| a.is_visible())
            .map(|a| a.kind)
            .collect()
    }

    pub fn has_action(&self, kind: ActionKind) -> bool {
        self.actions.iter().any(|a| a.kind == kind)
    }
}
