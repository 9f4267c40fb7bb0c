//! 事件脚本回放
//!
//! JSONL 脚本，每行一个事件（`#` 开头为注释）：
//! ```text
//! {"op":"ingest","notification":{...},"update_existing":false}
//! {"op":"advance","millis":5000}
//! {"op":"lock"}
//! ```
//! 回放使用内存平台和手动时钟，结束后输出平台调用记录与最终状态。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::Preferences;
use crate::notification::coordinator::NotificationCoordinator;
use crate::notification::lock_watcher::LockStateHandle;
use crate::notification::model::{ConversationNotification, NotificationGroup, Receiver};
use crate::notification::notices::SystemNotices;
use crate::notification::payload::PlatformNotification;
use crate::platform::memory::{InMemoryPlatform, ManualClock, PlatformOp};
use crate::platform::LockState;

/// 脚本事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptEvent {
    Ingest {
        notification: ConversationNotification,
        #[serde(default)]
        update_existing: bool,
    },
    Delete {
        uid: String,
    },
    Cancel {
        uids: Vec<String>,
    },
    CancelReceiver {
        receiver: Receiver,
    },
    CancelAll,
    Visible {
        #[serde(default)]
        receiver: Option<Receiver>,
    },
    Lock {
        #[serde(default)]
        master_key: bool,
    },
    Unlock,
    /// 推进手动时钟
    Advance {
        millis: i64,
    },
    Unsent {
        count: usize,
    },
    BackupFailed {
        days: u32,
    },
    GroupCall {
        group: NotificationGroup,
        caller: String,
    },
    GroupCallEnded {
        group_id: i64,
    },
}

/// 解析 JSONL 脚本
pub fn parse_script(content: &str) -> Result<Vec<ScriptEvent>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line.trim())
                .with_context(|| format!("脚本第 {} 行解析失败", index + 1))
        })
        .collect()
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptEvent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("读取脚本失败: {}", path.display()))?;
    parse_script(&content)
}

/// 仍在显示的通知
#[derive(Debug, Clone, Serialize)]
pub struct ActiveNotification {
    pub id: i32,
    pub notification: PlatformNotification,
}

/// 回放结果
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub events: usize,
    pub ops: Vec<PlatformOp>,
    pub active: Vec<ActiveNotification>,
    pub pending_uids: Vec<String>,
    pub badge: Option<usize>,
}

/// 回放器
pub struct Replayer {
    coordinator: Arc<NotificationCoordinator>,
    notices: SystemNotices,
    platform: Arc<InMemoryPlatform>,
    clock: Arc<ManualClock>,
    lock: Arc<LockStateHandle>,
}

impl Replayer {
    pub fn new(prefs: Preferences) -> Result<Self> {
        let platform = Arc::new(InMemoryPlatform::new());
        let clock = Arc::new(ManualClock::new());
        let lock = Arc::new(LockStateHandle::default());

        let coordinator = NotificationCoordinator::builder()
            .platform(platform.clone())
            .preferences(Arc::new(prefs))
            .clock(clock.clone())
            .lock_state(lock.clone())
            .build()?;
        let notices = coordinator.notices();

        Ok(Self {
            coordinator: Arc::new(coordinator),
            notices,
            platform,
            clock,
            lock,
        })
    }

    pub fn coordinator(&self) -> &Arc<NotificationCoordinator> {
        &self.coordinator
    }

    pub fn platform(&self) -> &Arc<InMemoryPlatform> {
        &self.platform
    }

    pub fn apply(&self, event: ScriptEvent) {
        debug!(?event, "Replaying event");
        match event {
            ScriptEvent::Ingest {
                notification,
                update_existing,
            } => self.coordinator.ingest(notification, update_existing),
            ScriptEvent::Delete { uid } => self.coordinator.on_deleted(&uid),
            ScriptEvent::Cancel { uids } => self.coordinator.cancel_by_uid(uids),
            ScriptEvent::CancelReceiver { receiver } => self.coordinator.cancel_by_receiver(&receiver),
            ScriptEvent::CancelAll => self.coordinator.cancel_all(),
            ScriptEvent::Visible { receiver } => self.coordinator.set_visible_receiver(receiver),
            ScriptEvent::Lock { master_key } => {
                let state = if master_key {
                    LockState::MasterKeyLocked
                } else {
                    LockState::PinLocked
                };
                self.lock.set(state);
                self.coordinator.on_lock_transition(true);
            }
            ScriptEvent::Unlock => {
                self.lock.set(LockState::Unlocked);
                self.coordinator.on_lock_transition(false);
            }
            ScriptEvent::Advance { millis } => self.clock.advance(millis),
            ScriptEvent::Unsent { count } => self.notices.show_unsent_messages(count),
            ScriptEvent::BackupFailed { days } => self.notices.show_safe_backup_failed(days),
            ScriptEvent::GroupCall { group, caller } => self.notices.show_group_call(&group, &caller),
            ScriptEvent::GroupCallEnded { group_id } => self.notices.cancel_group_call(group_id),
        }
    }

    /// 依次回放并生成报告
    pub fn run(&self, events: Vec<ScriptEvent>) -> ReplayReport {
        let count = events.len();
        for event in events {
            self.apply(event);
        }
        self.report(count)
    }

    pub fn report(&self, events: usize) -> ReplayReport {
        let active = self
            .platform
            .active_ids()
            .into_iter()
            .filter_map(|id| {
                self.platform
                    .active(id)
                    .map(|notification| ActiveNotification { id, notification })
            })
            .collect();

        ReplayReport {
            events,
            ops: self.platform.ops(),
            active,
            pending_uids: self.coordinator.pending_uids(),
            badge: self.platform.badge(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
# two messages from Echo, then the chat is opened
{"op":"ingest","notification":{"uid":"a","group":{"group_uid":"contact-ECHOECHO","receiver":{"kind":"contact","identity":"ECHOECHO","unique_id":11,"unique_id_string":"contact-ECHOECHO"},"name":"Echo","notification_id":11},"sender":{"key":"ECHOECHO","name":"Echo"},"message":"hi"}}
{"op":"advance","millis":5000}
{"op":"ingest","notification":{"uid":"b","group":{"group_uid":"contact-ECHOECHO","receiver":{"kind":"contact","identity":"ECHOECHO","unique_id":11,"unique_id_string":"contact-ECHOECHO"},"name":"Echo","notification_id":11},"sender":{"key":"ECHOECHO","name":"Echo"},"message":"there"}}

{"op":"visible","receiver":{"kind":"contact","identity":"ECHOECHO","unique_id":11,"unique_id_string":"contact-ECHOECHO"}}
"#;

    #[test]
    fn test_parse_script_skips_comments_and_blanks() {
        let events = parse_script(SCRIPT).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[1], ScriptEvent::Advance { millis: 5000 });
    }

    #[test]
    fn test_parse_script_reports_line() {
        let err = parse_script("{\"op\":\"unlock\"}\n{\"op\":\"bogus\"}").unwrap_err();
        assert!(err.to_string().contains("第 2 行"));
    }

    #[test]
    fn test_replay_script() {
        let replayer = Replayer::new(Preferences::default()).unwrap();
        let report = replayer.run(parse_script(SCRIPT).unwrap());

        assert_eq!(report.events, 4);
        assert!(report.pending_uids.is_empty());
        assert!(report.active.is_empty());
        assert_eq!(report.badge, Some(0));

        let alerts: Vec<bool> = report
            .ops
            .iter()
            .filter_map(|op| match op {
                PlatformOp::Post { notification, .. } => Some(notification.alert_once),
                _ => None,
            })
            .collect();
        assert_eq!(alerts, vec![false, true]);
    }

    #[test]
    fn test_replay_lock_events() {
        let replayer = Replayer::new(Preferences::default()).unwrap();
        let mut events = parse_script(SCRIPT).unwrap();
        events.pop();
        events.push(ScriptEvent::Lock { master_key: false });
        let report = replayer.run(events);

        let ids: Vec<i32> = report.active.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![crate::notification::PIN_LOCKED_NOTIFICATION_ID]);
        assert_eq!(report.pending_uids, vec!["b", "a"]);
    }
}
