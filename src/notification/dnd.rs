//! 免打扰策略（DND）
//!
//! 判断一条消息是否应被静默丢弃：
//! 1. 全局工作时间静音生效
//! 2. 会话被单独静音
//! 3. 会话设置为"仅提及"，且原始文本中没有提及本人或 @All
//!
//! 提及检测只针对原始文本，展示文本可能已被隐私策略替换。

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::model::Receiver;

/// 单个会话的静音设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMute {
    #[default]
    Unmuted,
    /// 完全静音
    Muted,
    /// 仅在被提及时通知
    MentionsOnly,
}

/// DND 查询接口，由宿主应用提供
pub trait MuteSettings: Send + Sync {
    /// 会话级静音设置
    fn chat_mute(&self, receiver: &Receiver) -> ChatMute;

    /// 全局工作时间静音是否生效
    fn is_work_muted(&self) -> bool;

    /// 本地用户的 identity（用于提及检测）
    fn my_identity(&self) -> String;
}

/// 免打扰策略
#[derive(Clone)]
pub struct DndPolicy {
    settings: Arc<dyn MuteSettings>,
}

impl DndPolicy {
    pub fn new(settings: Arc<dyn MuteSettings>) -> Self {
        Self { settings }
    }

    /// 是否应静默此消息
    pub fn is_suppressed(&self, receiver: &Receiver, raw_text: Option<&str>) -> bool {
        if self.settings.is_work_muted() {
            debug!(receiver = %receiver, "Suppressed by work-hours mute");
            return true;
        }

        match self.settings.chat_mute(receiver) {
            ChatMute::Unmuted => false,
            ChatMute::Muted => {
                debug!(receiver = %receiver, "Suppressed by chat mute");
                true
            }
            ChatMute::MentionsOnly => {
                let identity = self.settings.my_identity();
                let mentioned = raw_text
                    .map(|text| contains_mention(text, &identity))
                    .unwrap_or(false);
                if !mentioned {
                    debug!(receiver = %receiver, "Suppressed by mention-only mute (no mention)");
                }
                !mentioned
            }
        }
    }

    /// 会话是否处于静音（不考虑提及），用于群通话提醒
    pub fn is_chat_muted(&self, receiver: &Receiver) -> bool {
        self.settings.is_work_muted() || self.settings.chat_mute(receiver) == ChatMute::Muted
    }
}

/// 文本是否提及了 `identity` 或全体成员
///
/// 支持 `@[ABCD1234]`、`@ABCD1234`、`@All` 以及全体标记 `@[@@@@@@@@]`，大小写不敏感。
pub fn contains_mention(text: &str, identity: &str) -> bool {
    let identity = regex::escape(identity.trim());
    let pattern = if identity.is_empty() {
        r"(?i)@(?:\[@{8}\]|all\b)".to_string()
    } else {
        format!(
            r"(?i)@(?:\[(?:{id}|@{{8}})\]|(?:{id}|all)\b)",
            id = identity
        )
    };

    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            warn!(error = %e, "Invalid mention pattern");
            false
        }
    }
}
