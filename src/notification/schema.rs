//! 通知提醒方案 - 声音 / 振动 / 指示灯
//!
//! 群聊使用群组铃声、群组振动与群组指示灯设置；单聊使用联系人铃声和全局设置。
//! 构建时会快照平台当前的响铃模式，供平台层判断声音是否实际生效。

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::dnd::DndPolicy;
use super::model::{NotificationGroup, Receiver};
use crate::config::PreferenceSource;
use crate::platform::{NotificationPlatform, RingerMode};

/// 指示灯调色板，偏好设置里保存的是下标字符串
pub const LIGHT_PALETTE: [i32; 8] = [
    0x00FF_FFFF, // white
    0x00FF_0000, // red
    0x0000_FF00, // green
    0x0000_00FF, // blue
    0x00FF_FF00, // yellow
    0x0000_FFFF, // cyan
    0x00FF_00FF, // magenta
    0x00FF_8000, // orange
];

/// 没有配置指示灯时的颜色值
pub const NO_LIGHT: i32 = -1;

/// 单次提醒的声音 / 振动 / 指示灯方案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSchema {
    pub sound_uri: Option<String>,
    pub vibrate: bool,
    pub light_color: i32,
    pub ringer_mode: RingerMode,
}

impl NotificationSchema {
    /// 不发声、不振动
    pub fn silent() -> Self {
        Self {
            sound_uri: None,
            vibrate: false,
            light_color: 0,
            ringer_mode: RingerMode::Normal,
        }
    }

    /// 声音是否会实际播放
    pub fn plays_sound(&self) -> bool {
        self.sound_uri.is_some() && self.ringer_mode == RingerMode::Normal
    }

    /// 振动是否会实际生效
    pub fn vibrates(&self) -> bool {
        self.vibrate && self.ringer_mode != RingerMode::Silent
    }
}

/// 把偏好里的下标字符串转换为颜色值
pub fn light_color(index: Option<&str>) -> i32 {
    index
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<usize>().ok())
        .and_then(|i| LIGHT_PALETTE.get(i).copied())
        .unwrap_or(NO_LIGHT)
}

/// 提醒方案构建器
#[derive(Clone)]
pub struct SchemaBuilder {
    prefs: Arc<dyn PreferenceSource>,
    dnd: DndPolicy,
    platform: Arc<dyn NotificationPlatform>,
}

impl SchemaBuilder {
    pub fn new(
        prefs: Arc<dyn PreferenceSource>,
        dnd: DndPolicy,
        platform: Arc<dyn NotificationPlatform>,
    ) -> Self {
        Self {
            prefs,
            dnd,
            platform,
        }
    }

    /// 为一条消息构建提醒方案
    ///
    /// 只有在 DND 静默此消息时返回 `None`，调用方应直接丢弃该事件。
    pub fn build(&self, group: &NotificationGroup, raw_text: Option<&str>) -> Option<NotificationSchema> {
        let receiver = &group.receiver;
        if self.dnd.is_suppressed(receiver, raw_text) {
            return None;
        }

        let ringer_mode = self.platform.ringer_mode();
        let schema = match receiver {
            Receiver::Group {
                unique_id_string, ..
            } => NotificationSchema {
                sound_uri: self.prefs.group_ringtone(unique_id_string),
                vibrate: self.prefs.group_vibrate(),
                light_color: light_color(self.prefs.group_notification_light().as_deref()),
                ringer_mode,
            },
            Receiver::Contact {
                unique_id_string, ..
            } => NotificationSchema {
                sound_uri: self.prefs.contact_ringtone(unique_id_string),
                vibrate: self.prefs.vibrate(),
                light_color: light_color(self.prefs.notification_light().as_deref()),
                ringer_mode,
            },
        };
        Some(schema)
    }

    /// 全局默认方案（主密钥锁定占位通知使用）
    pub fn default_schema(&self) -> NotificationSchema {
        NotificationSchema {
            sound_uri: Some(self.prefs.default_notification_sound()),
            vibrate: self.prefs.vibrate(),
            light_color: light_color(self.prefs.notification_light().as_deref()),
            ringer_mode: self.platform.ringer_mode(),
        }
    }

    /// 静默方案（锁定时替换已有通知的占位通知使用）
    pub fn quiet_schema(&self) -> NotificationSchema {
        NotificationSchema {
            ringer_mode: self.platform.ringer_mode(),
            ..NotificationSchema::silent()
        }
    }
}
