//! 会话通知核心
//!
//! # 数据流
//! 1. 消息事件进入 `NotificationCoordinator`
//! 2. 经过 DND 与可见会话过滤
//! 3. 更新 `ConversationStore`
//! 4. `PresentationComposer` 生成通知内容
//! 5. `Emitter` 在锁外调用平台发布或撤回
//!
//! # 使用示例
//! ```ignore
//! use message_notifier::notification::NotificationCoordinator;
//! use message_notifier::platform::memory::InMemoryPlatform;
//!
//! let coordinator = NotificationCoordinator::builder()
//!     .platform(Arc::new(InMemoryPlatform::new()))
//!     .preferences(Arc::new(Preferences::default()))
//!     .build()?;
//!
//! coordinator.ingest(notification, false);
//! ```

pub mod composer;
pub mod coordinator;
pub mod dnd;
pub mod emitter;
pub mod lock_watcher;
pub mod model;
pub mod msg;
pub mod notices;
pub mod payload;
pub mod priority;
pub mod schema;
pub mod store;
pub mod throttle;

pub use composer::{trim_text, ComposeContext, PresentationComposer};
pub use coordinator::{
    CoordinatorBuilder, NotificationCoordinator, MASTER_KEY_LOCKED_NOTIFICATION_ID,
    NEW_MESSAGE_NOTIFICATION_ID, PIN_LOCKED_NOTIFICATION_ID,
};
pub use dnd::{contains_mention, ChatMute, DndPolicy, MuteSettings};
pub use emitter::{EmitOp, Emitter};
pub use lock_watcher::{LockStateHandle, LockWatcher};
pub use model::{
    ConversationNotification, MessageKind, NotificationGroup, Person, Receiver, ReceiverKind,
    Thumbnail,
};
pub use notices::SystemNotices;
pub use payload::{
    ActionKind, NotificationAction, NotificationCategory, NotificationChannel, PlatformNotification,
};
pub use priority::{parse_priority, NotificationPriority};
pub use schema::{NotificationSchema, SchemaBuilder};
pub use store::ConversationStore;
pub use throttle::AlertThrottle;
