//! Message Notifier - 会话通知协调器
//!
//! 接收消息事件，维护按会话分组的待处理通知，决定是否提醒，
//! 并生成交给平台发布的通知内容。

pub mod config;
pub mod notification;
pub mod platform;
pub mod replay;

pub use config::{HiddenChats, PreferenceSource, Preferences};
pub use notification::{
    ChatMute, ConversationNotification, CoordinatorBuilder, LockStateHandle, LockWatcher,
    MessageKind, NotificationCoordinator, NotificationGroup, NotificationPriority, Person,
    PlatformNotification, Receiver, SystemNotices,
};
pub use platform::memory::{InMemoryPlatform, ManualClock, PlatformOp};
pub use platform::{Clock, LockState, LockStateSource, NotificationPlatform, PlatformError, RingerMode};
pub use replay::{parse_script, load_script, ReplayReport, Replayer, ScriptEvent};
