//! 会话通知协调器
//!
//! 对外的唯一入口：接收消息事件、维护待处理通知、决定是否提醒，
//! 并与外部动作（打开会话、锁定应用、消息删除、平台撤回）对账。
//!
//! 所有状态（存储、可见会话、alert-once 记录、占位通知标记）放在一把互斥锁里。
//! 每个操作在锁内生成 `EmitOp` 计划，释放锁后再调用平台。

use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::composer::{ComposeContext, PresentationComposer};
use super::dnd::{DndPolicy, MuteSettings};
use super::emitter::{EmitOp, Emitter};
use super::lock_watcher::LockStateHandle;
use super::model::{ConversationNotification, NotificationGroup, Receiver};
use super::notices::SystemNotices;
use super::payload::{NotificationCategory, NotificationChannel, PlatformNotification};
use super::schema::{NotificationSchema, SchemaBuilder};
use super::store::{ConversationStore, UpdateOutcome};
use super::throttle::{AlertThrottle, ALERT_AGAIN_WINDOW_MS};
use crate::config::{HiddenChats, PreferenceSource, Preferences};
use crate::platform::{Clock, LockState, LockStateSource, NotificationPlatform, SystemClock};

/// "有新消息" 汇总通知
pub const NEW_MESSAGE_NOTIFICATION_ID: i32 = 723;
/// PIN 锁定时的占位通知
pub const PIN_LOCKED_NOTIFICATION_ID: i32 = 724;
/// 主密钥锁定提示
pub const MASTER_KEY_LOCKED_NOTIFICATION_ID: i32 = 725;

fn is_placeholder(id: i32) -> bool {
    id == PIN_LOCKED_NOTIFICATION_ID || id == MASTER_KEY_LOCKED_NOTIFICATION_ID
}

struct CoordinatorState {
    store: ConversationStore,
    visible_receiver: Option<Receiver>,
    throttle: AlertThrottle,
    /// 当前锁定状态，只由 `on_lock_transition` 改变
    lock_state: LockState,
    /// PIN 锁定占位通知是否已发布
    placeholder_posted: bool,
}

impl CoordinatorState {
    /// 存储清空后撤回占位通知
    fn withdraw_placeholder_if_empty(&mut self, plan: &mut Vec<EmitOp>) {
        if self.store.is_empty() && self.placeholder_posted {
            plan.push(EmitOp::Cancel(PIN_LOCKED_NOTIFICATION_ID));
            self.placeholder_posted = false;
        }
    }
}

/// 会话通知协调器
pub struct NotificationCoordinator {
    state: Mutex<CoordinatorState>,
    prefs: Arc<dyn PreferenceSource>,
    dnd: DndPolicy,
    schemas: SchemaBuilder,
    composer: PresentationComposer,
    emitter: Emitter,
    clock: Arc<dyn Clock>,
    lock_source: Arc<dyn LockStateSource>,
}

impl NotificationCoordinator {
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    fn state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(|e| {
            warn!("Coordinator state mutex poisoned, recovering");
            e.into_inner()
        })
    }

    /// 设置当前前台会话；先撤回该会话的待处理通知
    pub fn set_visible_receiver(&self, receiver: Option<Receiver>) {
        let plan = {
            let mut state = self.state();
            let mut plan = Vec::new();
            if let Some(r) = &receiver {
                plan = self.plan_cancel_receiver(&mut state, r);
            }
            debug!(receiver = ?receiver.as_ref().map(|r| r.to_string()), "Visible receiver set");
            state.visible_receiver = receiver;
            plan
        };
        self.emitter.apply(plan);
    }

    /// 接收一条消息事件
    pub fn ingest(&self, notification: ConversationNotification, update_existing: bool) {
        if !self.prefs.credentials_valid() || self.prefs.wizard_running() {
            debug!(uid = %notification.uid, "Setup incomplete, dropping notification");
            return;
        }

        let plan = {
            let mut state = self.state();
            self.plan_ingest(&mut state, notification, update_existing)
        };
        self.emitter.apply(plan);
    }

    /// 上游消息被删除
    pub fn on_deleted(&self, uid: &str) {
        let plan = {
            let mut state = self.state();
            let existing = state.store.get(uid).cloned();
            match existing {
                Some(existing) => self.plan_ingest(&mut state, existing.into_deleted(), true),
                None => {
                    info!(uid, "Deleted message has no pending notification");
                    Vec::new()
                }
            }
        };
        self.emitter.apply(plan);
    }

    /// 按 uid 撤回
    pub fn cancel_by_uid<I, S>(&self, uids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let plan = {
            let mut state = self.state();
            let mut touched: BTreeMap<i32, NotificationGroup> = BTreeMap::new();
            for uid in uids {
                let uid = uid.as_ref();
                match state.store.remove_by_uid(uid) {
                    Some(removed) => {
                        touched.insert(removed.group.notification_id, removed.group);
                    }
                    None => info!(uid, "Cancel for unknown uid ignored"),
                }
            }

            if touched.is_empty() {
                Vec::new()
            } else {
                let mut plan = Vec::new();
                for group in touched.values() {
                    self.plan_refresh_group(&mut state, group, &mut plan);
                }
                state.withdraw_placeholder_if_empty(&mut plan);
                plan.push(EmitOp::Badge(state.store.total_count()));
                plan
            }
        };
        self.emitter.apply(plan);
    }

    /// 撤回某个会话的全部通知
    pub fn cancel_by_receiver(&self, receiver: &Receiver) {
        let plan = {
            let mut state = self.state();
            self.plan_cancel_receiver(&mut state, receiver)
        };
        self.emitter.apply(plan);
    }

    /// 撤回全部通知
    pub fn cancel_all(&self) {
        let plan = {
            let mut state = self.state();
            let removed = state.store.clear();
            let ids: BTreeSet<i32> = removed.iter().map(|n| n.group.notification_id).collect();

            let mut plan: Vec<EmitOp> = ids.into_iter().map(EmitOp::Cancel).collect();
            plan.push(EmitOp::Cancel(NEW_MESSAGE_NOTIFICATION_ID));
            state.withdraw_placeholder_if_empty(&mut plan);
            plan.push(EmitOp::Badge(0));

            let now = self.clock.now_millis();
            state.throttle.cleanup(now);
            info!(count = removed.len(), "All conversation notifications cancelled");
            plan
        };
        self.emitter.apply(plan);
    }

    /// 应用锁定 / 解锁
    pub fn on_lock_transition(&self, locked: bool) {
        if locked {
            self.on_locked();
        } else {
            self.on_unlocked();
        }
    }

    fn on_locked(&self) {
        // 平台查询放在锁外，结果在锁内与存储合并
        let owned = match self
            .emitter
            .platform()
            .list_owned_active(NotificationCategory::Message)
        {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Failed to list active notifications");
                Vec::new()
            }
        };

        let lock_state = match self.lock_source.lock_state() {
            LockState::MasterKeyLocked => LockState::MasterKeyLocked,
            _ => LockState::PinLocked,
        };
        let master_key = lock_state == LockState::MasterKeyLocked;

        let plan = {
            let mut state = self.state();
            state.lock_state = lock_state;
            let mut ids: BTreeSet<i32> = owned.into_iter().filter(|id| !is_placeholder(*id)).collect();
            ids.extend(state.store.groups().iter().map(|g| g.notification_id));

            let any_existed = !ids.is_empty() || !state.store.is_empty();
            let mut plan: Vec<EmitOp> = ids.into_iter().map(EmitOp::Cancel).collect();

            if any_existed {
                // 替换已有通知，走静默更新渠道
                if master_key {
                    let mut placeholder = self.composer.master_key_placeholder(self.schemas.quiet_schema());
                    placeholder.channel = NotificationChannel::ChatUpdate;
                    plan.push(EmitOp::post(MASTER_KEY_LOCKED_NOTIFICATION_ID, placeholder));
                } else {
                    let mut placeholder = self.composer.pin_locked_placeholder(
                        state.store.total_count(),
                        self.schemas.quiet_schema(),
                        true,
                    );
                    placeholder.channel = NotificationChannel::ChatUpdate;
                    plan.push(EmitOp::post(PIN_LOCKED_NOTIFICATION_ID, placeholder));
                    state.placeholder_posted = true;
                }
            }

            info!(pending = state.store.total_count(), master_key, "App locked, notifications replaced");
            plan
        };
        self.emitter.apply(plan);
    }

    fn on_unlocked(&self) {
        let plan = {
            let mut state = self.state();
            let mut plan = vec![
                EmitOp::Cancel(PIN_LOCKED_NOTIFICATION_ID),
                EmitOp::Cancel(MASTER_KEY_LOCKED_NOTIFICATION_ID),
            ];
            state.lock_state = LockState::Unlocked;
            state.placeholder_posted = false;

            // 静默重新发布每个会话，不推进提醒时间
            for group in state.store.groups() {
                let Some(trigger) = state.store.iter_by_group(&group.group_uid).next().cloned() else {
                    continue;
                };
                let schema = self
                    .schemas
                    .build(&trigger.group, trigger.raw_message.as_deref())
                    .unwrap_or_else(|| self.schemas.quiet_schema());
                let notification = self.compose(&state, &trigger, schema, true, true);
                plan.push(EmitOp::post(trigger.group.notification_id, notification));
            }
            plan.push(EmitOp::Badge(state.store.total_count()));

            info!(pending = state.store.total_count(), "App unlocked, notifications restored");
            plan
        };
        self.emitter.apply(plan);
    }

    /// 主密钥锁定提示（默认提醒方案）
    pub fn show_master_key_locked(&self) {
        let placeholder = self.composer.master_key_placeholder(self.schemas.default_schema());
        self.emitter.apply(vec![EmitOp::post(MASTER_KEY_LOCKED_NOTIFICATION_ID, placeholder)]);
    }

    /// 共享平台与设置的辅助通知
    pub fn notices(&self) -> SystemNotices {
        SystemNotices::new(
            self.emitter.clone(),
            self.prefs.clone(),
            self.dnd.clone(),
            self.schemas.clone(),
        )
    }

    pub fn pending_count(&self) -> usize {
        self.state().store.total_count()
    }

    /// 待处理通知 uid，最新的在前
    pub fn pending_uids(&self) -> Vec<String> {
        self.state().store.uids()
    }

    pub fn pending_conversations(&self) -> usize {
        self.state().store.distinct_group_count()
    }

    pub fn visible_receiver(&self) -> Option<Receiver> {
        self.state().visible_receiver.clone()
    }

    pub fn is_placeholder_posted(&self) -> bool {
        self.state().placeholder_posted
    }

    pub fn last_alert_time(&self, group_uid: &str) -> Option<i64> {
        self.state().throttle.last_alert_time(group_uid)
    }

    fn plan_ingest(
        &self,
        state: &mut CoordinatorState,
        notification: ConversationNotification,
        update_existing: bool,
    ) -> Vec<EmitOp> {
        let mut plan = Vec::new();
        let uid = notification.uid.clone();
        let group_uid = notification.group.group_uid.clone();

        if state
            .visible_receiver
            .as_ref()
            .is_some_and(|visible| visible.same_as(notification.receiver()))
        {
            debug!(uid = %uid, "Chat is visible, dropping notification");
            return plan;
        }

        let existed = state.store.contains(&uid);
        if !existed {
            if notification.deleted {
                info!(uid = %uid, "Deletion for unknown uid ignored");
                return plan;
            }
            if self
                .dnd
                .is_suppressed(notification.receiver(), notification.raw_message.as_deref())
            {
                if state.store.count_by_group(&group_uid) == 0 {
                    plan.push(EmitOp::Cancel(notification.group.notification_id));
                }
                return plan;
            }
            state.store.insert(notification.clone());
        } else if update_existing {
            if state.store.update(notification.clone()) == UpdateOutcome::Missing {
                info!(uid = %uid, "Update for unknown uid ignored");
                return plan;
            }
        } else {
            debug!(uid = %uid, "Duplicate notification ignored");
            return plan;
        }

        let deleted = notification.deleted;
        let trigger = if deleted {
            let newest = state.store.iter_by_group(&group_uid).next().cloned();
            match newest {
                Some(newest) => newest,
                None => {
                    plan.push(EmitOp::Cancel(notification.group.notification_id));
                    state.withdraw_placeholder_if_empty(&mut plan);
                    plan.push(EmitOp::Badge(state.store.total_count()));
                    return plan;
                }
            }
        } else {
            if existed && !self.update_is_visible(state, &notification) {
                debug!(uid = %uid, "Update stored without re-emitting");
                return plan;
            }
            notification
        };

        let schema = if deleted {
            self.schemas.quiet_schema()
        } else {
            match self
                .schemas
                .build(&trigger.group, trigger.raw_message.as_deref())
            {
                Some(schema) => schema,
                None => {
                    debug!(uid = %uid, "Suppressed by DND, no alert");
                    return plan;
                }
            }
        };

        let now = self.clock.now_millis();
        let alert_once = deleted || state.throttle.check_and_record(&group_uid, now);

        // 锁定期间只发布占位通知，不更新角标
        match state.lock_state {
            LockState::PinLocked => {
                let placeholder = self.composer.pin_locked_placeholder(
                    state.store.total_count(),
                    schema,
                    alert_once,
                );
                plan.push(EmitOp::post(PIN_LOCKED_NOTIFICATION_ID, placeholder));
                state.placeholder_posted = true;
                return plan;
            }
            LockState::MasterKeyLocked => {
                let placeholder = self.composer.master_key_placeholder(self.schemas.default_schema());
                plan.push(EmitOp::post(MASTER_KEY_LOCKED_NOTIFICATION_ID, placeholder));
                return plan;
            }
            LockState::Unlocked => {
                if state.placeholder_posted {
                    plan.push(EmitOp::Cancel(PIN_LOCKED_NOTIFICATION_ID));
                    state.placeholder_posted = false;
                }
                let payload = self.compose(state, &trigger, schema, alert_once, true);
                plan.push(EmitOp::post(trigger.group.notification_id, payload));
            }
        }

        plan.push(EmitOp::Badge(state.store.total_count()));
        plan
    }

    /// 已存在通知的更新是否需要重新发布
    fn update_is_visible(&self, state: &CoordinatorState, notification: &ConversationNotification) -> bool {
        self.composer
            .shows_preview(&notification.group, state.lock_state == LockState::Unlocked)
    }

    /// 静默重新发布 group 的最新通知；group 已空时撤回。锁定期间保持占位通知不变
    fn plan_refresh_group(&self, state: &mut CoordinatorState, group: &NotificationGroup, plan: &mut Vec<EmitOp>) {
        let newest = state.store.iter_by_group(&group.group_uid).next().cloned();
        match newest {
            None => plan.push(EmitOp::Cancel(group.notification_id)),
            Some(newest) if state.lock_state == LockState::Unlocked => {
                let payload = self.compose(state, &newest, self.schemas.quiet_schema(), true, true);
                plan.push(EmitOp::post(newest.group.notification_id, payload));
            }
            Some(_) => {}
        }
    }

    fn plan_cancel_receiver(&self, state: &mut CoordinatorState, receiver: &Receiver) -> Vec<EmitOp> {
        let removed = state.store.remove_by_receiver_uid(receiver.unique_id_string());

        let mut ids: BTreeSet<i32> = removed.iter().map(|n| n.group.notification_id).collect();
        if receiver.unique_id() != 0 {
            ids.insert(receiver.unique_id());
        }

        let mut plan: Vec<EmitOp> = ids.into_iter().map(EmitOp::Cancel).collect();
        plan.push(EmitOp::Cancel(NEW_MESSAGE_NOTIFICATION_ID));
        state.withdraw_placeholder_if_empty(&mut plan);
        plan.push(EmitOp::Badge(state.store.total_count()));

        if !removed.is_empty() {
            debug!(receiver = %receiver, count = removed.len(), "Receiver notifications cancelled");
        }
        plan
    }

    fn compose(
        &self,
        state: &CoordinatorState,
        trigger: &ConversationNotification,
        schema: NotificationSchema,
        alert_once: bool,
        unlocked: bool,
    ) -> PlatformNotification {
        let history: Vec<ConversationNotification> = state
            .store
            .iter_by_group(&trigger.group.group_uid)
            .cloned()
            .collect();

        self.composer.compose(&ComposeContext {
            trigger,
            history: &history,
            unread_messages: state.store.total_count(),
            unread_conversations: state.store.distinct_group_count(),
            schema,
            alert_once,
            unlocked,
        })
    }
}

/// 协调器构建器
pub struct CoordinatorBuilder {
    platform: Option<Arc<dyn NotificationPlatform>>,
    prefs: Option<Arc<dyn PreferenceSource>>,
    hidden: Option<Arc<dyn HiddenChats>>,
    mutes: Option<Arc<dyn MuteSettings>>,
    clock: Option<Arc<dyn Clock>>,
    lock_source: Option<Arc<dyn LockStateSource>>,
    alert_window_ms: i64,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            platform: None,
            prefs: None,
            hidden: None,
            mutes: None,
            clock: None,
            lock_source: None,
            alert_window_ms: ALERT_AGAIN_WINDOW_MS,
        }
    }

    pub fn platform(mut self, platform: Arc<dyn NotificationPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// 同时作为偏好、隐藏会话与 DND 设置
    pub fn preferences(mut self, prefs: Arc<Preferences>) -> Self {
        self.prefs = Some(prefs.clone());
        self.hidden = Some(prefs.clone());
        self.mutes = Some(prefs);
        self
    }

    pub fn preference_source(mut self, prefs: Arc<dyn PreferenceSource>) -> Self {
        self.prefs = Some(prefs);
        self
    }

    pub fn hidden_chats(mut self, hidden: Arc<dyn HiddenChats>) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn mute_settings(mut self, mutes: Arc<dyn MuteSettings>) -> Self {
        self.mutes = Some(mutes);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn lock_state(mut self, source: Arc<dyn LockStateSource>) -> Self {
        self.lock_source = Some(source);
        self
    }

    pub fn alert_window_ms(mut self, window_ms: i64) -> Self {
        self.alert_window_ms = window_ms;
        self
    }

    pub fn build(self) -> Result<NotificationCoordinator> {
        let platform = self
            .platform
            .ok_or_else(|| anyhow!("notification platform is required"))?;

        let defaults = Arc::new(Preferences::default());
        let prefs: Arc<dyn PreferenceSource> = match self.prefs {
            Some(prefs) => prefs,
            None => defaults.clone(),
        };
        let hidden: Arc<dyn HiddenChats> = match self.hidden {
            Some(hidden) => hidden,
            None => defaults.clone(),
        };
        let mutes: Arc<dyn MuteSettings> = match self.mutes {
            Some(mutes) => mutes,
            None => defaults,
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock::new()),
        };
        let lock_source: Arc<dyn LockStateSource> = match self.lock_source {
            Some(source) => source,
            None => Arc::new(LockStateHandle::default()),
        };

        let dnd = DndPolicy::new(mutes);
        let schemas = SchemaBuilder::new(prefs.clone(), dnd.clone(), platform.clone());

        Ok(NotificationCoordinator {
            state: Mutex::new(CoordinatorState {
                store: ConversationStore::new(),
                visible_receiver: None,
                throttle: AlertThrottle::with_window(self.alert_window_ms),
                lock_state: lock_source.lock_state(),
                placeholder_posted: false,
            }),
            composer: PresentationComposer::new(prefs.clone(), hidden),
            emitter: Emitter::new(platform, prefs.clone()),
            prefs,
            dnd,
            schemas,
            clock,
            lock_source,
        })
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::model::{NotificationGroup, Person};
    use crate::platform::memory::{InMemoryPlatform, ManualClock};

    struct Fixture {
        coordinator: NotificationCoordinator,
        platform: Arc<InMemoryPlatform>,
        lock: Arc<LockStateHandle>,
    }

    fn fixture(prefs: Preferences) -> Fixture {
        let platform = Arc::new(InMemoryPlatform::new());
        let lock = Arc::new(LockStateHandle::default());
        let coordinator = NotificationCoordinator::builder()
            .platform(platform.clone())
            .preferences(Arc::new(prefs))
            .clock(Arc::new(ManualClock::new()))
            .lock_state(lock.clone())
            .build()
            .unwrap();
        Fixture {
            coordinator,
            platform,
            lock,
        }
    }

    fn echo() -> NotificationGroup {
        NotificationGroup::new(Receiver::contact("ECHOECHO", 11), "Echo")
    }

    fn note(uid: &str, group: &NotificationGroup, text: &str) -> ConversationNotification {
        ConversationNotification::new(uid, group.clone(), Person::new("ECHOECHO", "Echo"), text)
    }

    #[test]
    fn test_build_requires_platform() {
        assert!(NotificationCoordinator::builder().build().is_err());
    }

    #[test]
    fn test_wizard_running_drops() {
        let mut prefs = Preferences::default();
        prefs.wizard_running = true;
        let f = fixture(prefs);
        f.coordinator.ingest(note("a", &echo(), "hi"), false);
        assert_eq!(f.coordinator.pending_count(), 0);
        assert!(f.platform.ops().is_empty());
    }

    #[test]
    fn test_invalid_credentials_drop() {
        let mut prefs = Preferences::default();
        prefs.credentials_valid = false;
        let f = fixture(prefs);
        f.coordinator.ingest(note("a", &echo(), "hi"), false);
        assert_eq!(f.coordinator.pending_count(), 0);
    }

    #[test]
    fn test_duplicate_without_update_is_ignored() {
        let f = fixture(Preferences::default());
        let g = echo();
        f.coordinator.ingest(note("a", &g, "hi"), false);
        f.coordinator.ingest(note("a", &g, "edited"), false);

        assert_eq!(f.platform.posts_for(11).len(), 1);
        assert_eq!(f.platform.active(11).unwrap().text, "hi");
    }

    #[test]
    fn test_update_existing_reemits() {
        let f = fixture(Preferences::default());
        let g = echo();
        f.coordinator.ingest(note("a", &g, "hi"), false);
        f.coordinator.ingest(note("a", &g, "edited"), true);

        assert_eq!(f.coordinator.pending_uids(), vec!["a"]);
        assert_eq!(f.platform.active(11).unwrap().text, "edited");
    }

    #[test]
    fn test_update_not_reemitted_without_preview() {
        let mut prefs = Preferences::default();
        prefs.show_message_preview = false;
        let f = fixture(prefs);
        let g = echo();
        f.coordinator.ingest(note("a", &g, "hi"), false);
        f.coordinator.ingest(note("a", &g, "edited"), true);

        assert_eq!(f.platform.posts_for(11).len(), 1);
    }

    #[test]
    fn test_update_for_absent_uid_is_fresh_insert() {
        let f = fixture(Preferences::default());
        f.coordinator.ingest(note("a", &echo(), "hi"), true);
        assert_eq!(f.coordinator.pending_uids(), vec!["a"]);
        assert!(f.platform.is_active(11));
    }

    #[test]
    fn test_ingest_while_pin_locked_posts_placeholder() {
        let f = fixture(Preferences::default());
        f.lock.set(LockState::PinLocked);
        f.coordinator.on_lock_transition(true);

        f.coordinator.ingest(note("a", &echo(), "hi"), false);

        assert!(f.platform.is_active(PIN_LOCKED_NOTIFICATION_ID));
        assert!(!f.platform.is_active(11));
        assert!(f.coordinator.is_placeholder_posted());
        // 锁定期间不发布角标
        assert_eq!(f.platform.badge(), None);
    }

    #[test]
    fn test_ingest_while_master_key_locked() {
        let f = fixture(Preferences::default());
        f.lock.set(LockState::MasterKeyLocked);
        f.coordinator.on_lock_transition(true);

        f.coordinator.ingest(note("a", &echo(), "hi"), false);

        assert!(f.platform.is_active(MASTER_KEY_LOCKED_NOTIFICATION_ID));
        assert!(!f.platform.is_active(11));
        assert!(!f.coordinator.is_placeholder_posted());
    }

    #[test]
    fn test_cancel_all_withdraws_everything() {
        let f = fixture(Preferences::default());
        f.coordinator.ingest(note("a", &echo(), "hi"), false);
        f.coordinator
            .ingest(note("b", &NotificationGroup::new(Receiver::group(3, 33), "Crew"), "yo"), false);

        f.coordinator.cancel_all();

        assert_eq!(f.coordinator.pending_count(), 0);
        assert!(f.platform.active_ids().is_empty());
        assert_eq!(f.platform.badge(), Some(0));
    }

    #[test]
    fn test_on_deleted_unknown_is_noop() {
        let f = fixture(Preferences::default());
        f.coordinator.on_deleted("missing");
        assert!(f.platform.ops().is_empty());
    }

    #[test]
    fn test_lock_transition_without_handle_keeps_chats_hidden() {
        let platform = Arc::new(InMemoryPlatform::new());
        let coordinator = NotificationCoordinator::builder()
            .platform(platform.clone())
            .preferences(Arc::new(Preferences::default()))
            .clock(Arc::new(ManualClock::new()))
            .build()
            .unwrap();
        let g = echo();

        coordinator.ingest(note("a", &g, "hi"), false);
        coordinator.on_lock_transition(true);
        assert_eq!(platform.active_ids(), vec![PIN_LOCKED_NOTIFICATION_ID]);

        coordinator.ingest(note("b", &g, "secret while locked"), false);
        assert_eq!(platform.active_ids(), vec![PIN_LOCKED_NOTIFICATION_ID]);
        assert!(coordinator.is_placeholder_posted());
        assert!(platform
            .all_posts()
            .iter()
            .all(|(_, n)| n.visible_texts().iter().all(|t| !t.contains("secret"))));

        coordinator.on_lock_transition(false);
        assert_eq!(platform.active_ids(), vec![11]);
        assert_eq!(platform.active(11).unwrap().text, "secret while locked");
    }

    #[test]
    fn test_lock_placeholder_uses_update_channel() {
        let f = fixture(Preferences::default());
        f.coordinator.ingest(note("a", &echo(), "hi"), false);
        f.lock.set(LockState::PinLocked);
        f.coordinator.on_lock_transition(true);

        let placeholder = f.platform.active(PIN_LOCKED_NOTIFICATION_ID).unwrap();
        assert_eq!(placeholder.channel, NotificationChannel::ChatUpdate);
        assert!(placeholder.alert_once);
    }

    #[test]
    fn test_cancel_sibling_reposts_remaining() {
        let f = fixture(Preferences::default());
        let g = echo();
        f.coordinator.ingest(note("a", &g, "first"), false);
        f.coordinator.ingest(note("b", &g, "second"), false);

        f.coordinator.cancel_by_uid(["b"]);

        assert_eq!(f.coordinator.pending_uids(), vec!["a"]);
        let shown = f.platform.active(11).unwrap();
        assert_eq!(shown.text, "first");
        assert!(shown.alert_once);
        assert_eq!(f.platform.badge(), Some(1));
    }

    #[test]
    fn test_cancel_sibling_while_locked_keeps_placeholder() {
        let f = fixture(Preferences::default());
        let g = echo();
        f.coordinator.ingest(note("a", &g, "first"), false);
        f.coordinator.ingest(note("b", &g, "second"), false);
        f.coordinator.on_lock_transition(true);

        f.coordinator.cancel_by_uid(["b"]);

        assert_eq!(f.platform.active_ids(), vec![PIN_LOCKED_NOTIFICATION_ID]);
    }
}
