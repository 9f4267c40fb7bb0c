//! 锁定状态监听
//!
//! `LockStateHandle` 持有当前锁定状态（tokio watch 通道），
//! `LockWatcher` 在后台订阅状态变化并转发给协调器的 `on_lock_transition`。

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::coordinator::NotificationCoordinator;
use crate::platform::{LockState, LockStateSource};

/// 锁定状态发布端
#[derive(Debug, Clone)]
pub struct LockStateHandle {
    tx: watch::Sender<LockState>,
}

impl LockStateHandle {
    pub fn new(initial: LockState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// 更新状态，返回旧状态
    pub fn set(&self, state: LockState) -> LockState {
        self.tx.send_replace(state)
    }

    pub fn subscribe(&self) -> watch::Receiver<LockState> {
        self.tx.subscribe()
    }
}

impl Default for LockStateHandle {
    fn default() -> Self {
        Self::new(LockState::Unlocked)
    }
}

impl LockStateSource for LockStateHandle {
    fn lock_state(&self) -> LockState {
        *self.tx.borrow()
    }
}

/// 锁定状态监听器
pub struct LockWatcher {
    coordinator: Arc<NotificationCoordinator>,
    rx: watch::Receiver<LockState>,
    /// 订阅时的锁定状态，之后的变化都与它比较
    last_locked: bool,
}

impl LockWatcher {
    pub fn new(coordinator: Arc<NotificationCoordinator>, handle: &LockStateHandle) -> Self {
        let mut rx = handle.subscribe();
        let last_locked = rx.borrow_and_update().is_locked();
        Self {
            coordinator,
            rx,
            last_locked,
        }
    }

    /// 持续监听，直到所有发布端被释放
    pub async fn run(mut self) {
        let mut last_locked = self.last_locked;
        info!(locked = last_locked, "Lock watcher started");

        while self.rx.changed().await.is_ok() {
            let state = *self.rx.borrow_and_update();
            let locked = state.is_locked();
            if locked == last_locked {
                debug!(?state, "Lock state changed without lock transition");
                continue;
            }
            last_locked = locked;

            let coordinator = self.coordinator.clone();
            if let Err(e) =
                tokio::task::spawn_blocking(move || coordinator.on_lock_transition(locked)).await
            {
                warn!(error = %e, "Lock transition task failed");
            }
        }

        info!("Lock watcher stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
