//! 待处理通知存储 - 内存中的有序列表
//!
//! 最新的通知在最前面。uid 在存储内唯一，另有一个 uid 索引用于 O(1) 判重。
//! 不单独保存 group 表：group 只要还被某条通知引用就存在。
//! 所有操作都在协调器的互斥锁内执行，这里不再加锁。

use std::collections::{HashSet, VecDeque};

use super::model::{ConversationNotification, NotificationGroup};

/// `update` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// 原位替换
    Replaced,
    /// 通知被标记删除，已移除
    Removed,
    /// uid 不存在
    Missing,
}

/// 待处理通知存储
#[derive(Debug, Default)]
pub struct ConversationStore {
    entries: VecDeque<ConversationNotification>,
    uids: HashSet<String>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入到最前面；uid 已存在时不做任何事，返回 false
    pub fn insert(&mut self, notification: ConversationNotification) -> bool {
        if self.uids.contains(&notification.uid) {
            return false;
        }
        self.uids.insert(notification.uid.clone());
        self.entries.push_front(notification);
        true
    }

    /// 按 uid 定位：已删除则移除，否则原位替换
    pub fn update(&mut self, notification: ConversationNotification) -> UpdateOutcome {
        let Some(pos) = self.position(&notification.uid) else {
            return UpdateOutcome::Missing;
        };

        if notification.deleted {
            self.entries.remove(pos);
            self.uids.remove(&notification.uid);
            UpdateOutcome::Removed
        } else {
            self.entries[pos] = notification;
            UpdateOutcome::Replaced
        }
    }

    pub fn remove_by_uid(&mut self, uid: &str) -> Option<ConversationNotification> {
        let pos = self.position(uid)?;
        self.uids.remove(uid);
        self.entries.remove(pos)
    }

    /// 移除所有属于该接收方的通知，返回被移除的通知（保持原顺序）
    pub fn remove_by_receiver_uid(&mut self, unique_id_string: &str) -> Vec<ConversationNotification> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .entries
            .drain(..)
            .partition(|n| n.group.receiver.unique_id_string() == unique_id_string);

        for n in &removed {
            self.uids.remove(&n.uid);
        }
        self.entries = kept.into();
        removed
    }

    pub fn count_by_group(&self, group_uid: &str) -> usize {
        self.iter_by_group(group_uid).count()
    }

    /// 某个 group 的通知，最新的在前
    pub fn iter_by_group<'a>(
        &'a self,
        group_uid: &'a str,
    ) -> impl Iterator<Item = &'a ConversationNotification> + 'a {
        self.entries
            .iter()
            .filter(move |n| n.group.group_uid == group_uid)
    }

    /// 当前存活的 group，按最新通知排序；每个 group 取其最新通知携带的信息
    pub fn groups(&self) -> Vec<NotificationGroup> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|n| seen.insert(n.group.group_uid.as_str()))
            .map(|n| n.group.clone())
            .collect()
    }

    pub fn distinct_group_count(&self) -> usize {
        self.entries
            .iter()
            .map(|n| n.group.group_uid.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.uids.contains(uid)
    }

    pub fn get(&self, uid: &str) -> Option<&ConversationNotification> {
        if !self.contains(uid) {
            return None;
        }
        self.entries.iter().find(|n| n.uid == uid)
    }

    /// 所有 uid，最新的在前
    pub fn uids(&self) -> Vec<String> {
        self.entries.iter().map(|n| n.uid.clone()).collect()
    }

    /// 清空并返回被移除的通知
    pub fn clear(&mut self) -> Vec<ConversationNotification> {
        self.uids.clear();
        self.entries.drain(..).collect()
    }

    fn position(&self, uid: &str) -> Option<usize> {
        if !self.contains(uid) {
            return None;
        }
        self.entries.iter().position(|n| n.uid == uid)
    }
}
