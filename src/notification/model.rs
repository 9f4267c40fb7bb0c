//! 会话通知数据模型
//!
//! 一条 `ConversationNotification` 对应一条收到的消息；
//! `NotificationGroup` 是同一会话（单聊或群聊）下所有待处理通知的聚合。
//! 通知按值持有所属的 group，group 只通过通知存在。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 会话历史中本地用户的 `Person` key
pub const ME_PERSON_KEY: &str = "me";

/// 接收方类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverKind {
    Contact,
    Group,
}

/// 会话的接收方：联系人或群组
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Receiver {
    Contact {
        identity: String,
        unique_id: i32,
        unique_id_string: String,
    },
    Group {
        group_id: i64,
        unique_id: i32,
        unique_id_string: String,
    },
}

impl Receiver {
    /// 创建联系人接收方，unique_id_string 由 identity 派生
    pub fn contact(identity: impl Into<String>, unique_id: i32) -> Self {
        let identity = identity.into();
        let unique_id_string = format!("contact-{}", identity);
        Receiver::Contact {
            identity,
            unique_id,
            unique_id_string,
        }
    }

    /// 创建群组接收方，unique_id_string 由 group_id 派生
    pub fn group(group_id: i64, unique_id: i32) -> Self {
        Receiver::Group {
            group_id,
            unique_id,
            unique_id_string: format!("group-{}", group_id),
        }
    }

    pub fn kind(&self) -> ReceiverKind {
        match self {
            Receiver::Contact { .. } => ReceiverKind::Contact,
            Receiver::Group { .. } => ReceiverKind::Group,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Receiver::Group { .. })
    }

    pub fn unique_id(&self) -> i32 {
        match self {
            Receiver::Contact { unique_id, .. } | Receiver::Group { unique_id, .. } => *unique_id,
        }
    }

    pub fn unique_id_string(&self) -> &str {
        match self {
            Receiver::Contact {
                unique_id_string, ..
            }
            | Receiver::Group {
                unique_id_string, ..
            } => unique_id_string,
        }
    }

    /// 是否指向同一会话（按类型 + unique_id_string 比较）
    pub fn same_as(&self, other: &Receiver) -> bool {
        self.kind() == other.kind() && self.unique_id_string() == other.unique_id_string()
    }
}

impl std::fmt::Display for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.unique_id_string())
    }
}

/// 消息发送者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// 稳定的身份 key
    pub key: String,
    /// 显示名
    pub name: String,
    /// 头像句柄（由上层持有）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Person {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            avatar: None,
        }
    }

    /// 本地用户
    pub fn me(name: impl Into<String>) -> Self {
        Self::new(ME_PERSON_KEY, name)
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// 保留 key/头像，替换显示名
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            key: self.key.clone(),
            name: name.into(),
            avatar: self.avatar.clone(),
        }
    }
}

/// 缩略图引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub handle: String,
    pub mime_type: String,
}

/// 消息类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    /// 通话状态（未接来电等）
    VoipStatus,
    File,
    Other,
}

/// 一个会话的通知聚合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationGroup {
    /// 稳定的 group uid，同时用作平台的 group key
    pub group_uid: String,
    pub receiver: Receiver,
    /// 会话显示名（联系人名或群名）
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// 发布到平台时使用的通知 ID
    pub notification_id: i32,
}

impl NotificationGroup {
    /// group_uid 默认取 receiver 的 unique_id_string，notification_id 默认取 unique_id
    pub fn new(receiver: Receiver, name: impl Into<String>) -> Self {
        Self {
            group_uid: receiver.unique_id_string().to_string(),
            notification_id: receiver.unique_id(),
            receiver,
            name: name.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    pub fn with_notification_id(mut self, notification_id: i32) -> Self {
        self.notification_id = notification_id;
        self
    }
}

/// 一条待处理的会话通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationNotification {
    /// 全局唯一 ID
    pub uid: String,
    pub group: NotificationGroup,
    pub sender: Person,
    /// 原始消息文本（只用于策略判断，例如 @ 提及）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_message: Option<String>,
    /// 可展示的消息文本（可能已被裁剪或替换）
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
    #[serde(default)]
    pub kind: MessageKind,
    /// 消息时间，未知时为 None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
    /// 上游消息 ID（用于 ack / decline 动作）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
}

impl ConversationNotification {
    /// 创建通知，原始文本与展示文本相同
    pub fn new(
        uid: impl Into<String>,
        group: NotificationGroup,
        sender: Person,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            uid: uid.into(),
            group,
            sender,
            raw_message: Some(message.clone()),
            message,
            thumbnail: None,
            kind: MessageKind::Text,
            when: None,
            deleted: false,
            message_id: None,
        }
    }

    /// 替换展示文本（原始文本保持不变）
    pub fn with_display_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_raw_message(mut self, raw: Option<String>) -> Self {
        self.raw_message = raw;
        self
    }

    pub fn with_thumbnail(mut self, handle: impl Into<String>, mime_type: impl Into<String>) -> Self {
        self.thumbnail = Some(Thumbnail {
            handle: handle.into(),
            mime_type: mime_type.into(),
        });
        self
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_when(mut self, when: DateTime<Utc>) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_message_id(mut self, message_id: i64) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// 标记为已删除（上游消息被删除）
    pub fn into_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn receiver(&self) -> &Receiver {
        &self.group.receiver
    }

    /// 消息时间（毫秒），未知时为 0
    pub fn timestamp_millis(&self) -> i64 {
        self.when.map(|w| w.timestamp_millis()).unwrap_or(0)
    }
}
