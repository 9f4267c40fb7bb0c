//! 偏好设置
//!
//! 核心层通过 `PreferenceSource` / `HiddenChats` / `MuteSettings` 三个 trait 读取设置，
//! 宿主应用可以分别实现。`Preferences` 是一个可从 JSON 文件加载的完整实现，
//! CLI 和测试都使用它。
//!
//! 配置文件默认位于 `~/.config/message-notifier/preferences.json`，
//! 读取时持有共享文件锁，写入时持有排他锁。

use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::notification::dnd::{ChatMute, MuteSettings};
use crate::notification::model::Receiver;
use crate::notification::priority::NotificationPriority;

/// 系统默认通知铃声
pub const DEFAULT_NOTIFICATION_SOUND: &str = "content://settings/system/notification_sound";

/// 偏好设置读取接口
pub trait PreferenceSource: Send + Sync {
    fn show_message_preview(&self) -> bool;
    fn notification_priority(&self) -> NotificationPriority;
    fn vibrate(&self) -> bool;
    fn group_vibrate(&self) -> bool;
    /// 指示灯调色板下标
    fn notification_light(&self) -> Option<String>;
    fn group_notification_light(&self) -> Option<String>;
    /// 联系人铃声；None 表示静音
    fn contact_ringtone(&self, unique_id_string: &str) -> Option<String>;
    /// 群组铃声；None 表示静音
    fn group_ringtone(&self, unique_id_string: &str) -> Option<String>;
    fn default_notification_sound(&self) -> String;
    fn disable_smart_replies(&self) -> bool;
    fn wizard_running(&self) -> bool;
    fn credentials_valid(&self) -> bool;
    fn safe_backup_enabled(&self) -> bool;
}

/// 隐藏会话集合，按 receiver 的 unique_id_string 查询
pub trait HiddenChats: Send + Sync {
    fn contains(&self, unique_id_string: &str) -> bool;
}

impl HiddenChats for HashSet<String> {
    fn contains(&self, unique_id_string: &str) -> bool {
        HashSet::contains(self, unique_id_string)
    }
}

/// 完整的偏好设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub show_message_preview: bool,
    pub notification_priority: NotificationPriority,
    pub vibrate: bool,
    pub group_vibrate: bool,
    pub notification_light: Option<String>,
    pub group_notification_light: Option<String>,
    /// unique_id_string -> 铃声 URI，空字符串表示静音
    pub contact_ringtones: HashMap<String, String>,
    pub group_ringtones: HashMap<String, String>,
    pub default_notification_sound: String,
    pub disable_smart_replies: bool,
    pub wizard_running: bool,
    pub credentials_valid: bool,
    #[serde(alias = "threema_safe_enabled")]
    pub safe_backup_enabled: bool,
    pub hidden_chats: BTreeSet<String>,
    pub chat_mutes: HashMap<String, ChatMute>,
    /// 工作时间静音是否生效
    pub work_muted: bool,
    pub my_identity: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            show_message_preview: true,
            notification_priority: NotificationPriority::High,
            vibrate: true,
            group_vibrate: true,
            notification_light: None,
            group_notification_light: None,
            contact_ringtones: HashMap::new(),
            group_ringtones: HashMap::new(),
            default_notification_sound: DEFAULT_NOTIFICATION_SOUND.to_string(),
            disable_smart_replies: false,
            wizard_running: false,
            credentials_valid: true,
            safe_backup_enabled: false,
            hidden_chats: BTreeSet::new(),
            chat_mutes: HashMap::new(),
            work_muted: false,
            my_identity: String::new(),
        }
    }
}

impl Preferences {
    /// 默认配置文件路径
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow!("无法获取配置目录"))?;
        Ok(dir.join("message-notifier").join("preferences.json"))
    }

    /// 从默认路径加载
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// 从文件加载；文件不存在时返回默认设置
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Preferences file not found, using defaults");
            return Ok(Self::default());
        }

        let lock_file = open_lock_file(path)?;
        lock_file.lock_shared()?;

        let result = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))
            .and_then(|content| {
                serde_json::from_str::<Preferences>(&content)
                    .with_context(|| format!("解析配置文件失败: {}", path.display()))
            });

        let _ = lock_file.unlock();
        result
    }

    /// 写入文件（排他锁）
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("创建配置目录失败: {}", parent.display()))?;
            }
        }

        let lock_file = open_lock_file(path)?;
        lock_file.lock_exclusive()?;

        let result = serde_json::to_string_pretty(self)
            .context("序列化配置失败")
            .and_then(|content| {
                fs::write(path, content)
                    .with_context(|| format!("写入配置文件失败: {}", path.display()))
            });

        let _ = lock_file.unlock();

        if result.is_ok() {
            info!(path = %path.display(), "Preferences saved");
        }
        result
    }

    /// 空字符串表示静音，未配置时使用默认铃声
    fn ringtone_lookup(&self, map: &HashMap<String, String>, unique_id_string: &str) -> Option<String> {
        match map.get(unique_id_string) {
            Some(uri) if uri.trim().is_empty() => None,
            Some(uri) => Some(uri.clone()),
            None => Some(self.default_notification_sound.clone()),
        }
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    let mut lock_path = path.as_os_str().to_owned();
    lock_path.push(".lock");
    OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(PathBuf::from(lock_path))
        .with_context(|| format!("无法打开锁文件: {}.lock", path.display()))
}

impl PreferenceSource for Preferences {
    fn show_message_preview(&self) -> bool {
        self.show_message_preview
    }

    fn notification_priority(&self) -> NotificationPriority {
        self.notification_priority
    }

    fn vibrate(&self) -> bool {
        self.vibrate
    }

    fn group_vibrate(&self) -> bool {
        self.group_vibrate
    }

    fn notification_light(&self) -> Option<String> {
        self.notification_light.clone()
    }

    fn group_notification_light(&self) -> Option<String> {
        self.group_notification_light.clone()
    }

    fn contact_ringtone(&self, unique_id_string: &str) -> Option<String> {
        self.ringtone_lookup(&self.contact_ringtones, unique_id_string)
    }

    fn group_ringtone(&self, unique_id_string: &str) -> Option<String> {
        self.ringtone_lookup(&self.group_ringtones, unique_id_string)
    }

    fn default_notification_sound(&self) -> String {
        self.default_notification_sound.clone()
    }

    fn disable_smart_replies(&self) -> bool {
        self.disable_smart_replies
    }

    fn wizard_running(&self) -> bool {
        self.wizard_running
    }

    fn credentials_valid(&self) -> bool {
        self.credentials_valid
    }

    fn safe_backup_enabled(&self) -> bool {
        self.safe_backup_enabled
    }
}

impl HiddenChats for Preferences {
    fn contains(&self, unique_id_string: &str) -> bool {
        self.hidden_chats.contains(unique_id_string)
    }
}

impl MuteSettings for Preferences {
    fn chat_mute(&self, receiver: &Receiver) -> ChatMute {
        self.chat_mutes
            .get(receiver.unique_id_string())
            .copied()
            .unwrap_or_default()
    }

    fn is_work_muted(&self) -> bool {
        self.work_muted
    }

    fn my_identity(&self) -> String {
        self.my_identity.clone()
    }
}
