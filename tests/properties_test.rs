//! 针对协调器不变量的随机操作序列测试

mod common;

use std::collections::{BTreeSet, HashMap};

use proptest::collection::vec;
use proptest::prelude::*;

use common::{contact, group_chat, message, Harness};
use message_notifier::notification::ChatMute;
use message_notifier::{NotificationGroup, Preferences};

fn groups() -> Vec<NotificationGroup> {
    vec![
        contact("ECHOECHO", 11, "Echo"),
        group_chat(2, 22, "Crew"),
        group_chat(3, 33, "Quiet"),
    ]
}

/// group-3 为"仅提及"
fn mention_only_prefs() -> Preferences {
    let mut prefs = Preferences::default();
    prefs.my_identity = "ME".to_string();
    prefs
        .chat_mutes
        .insert("group-3".to_string(), ChatMute::MentionsOnly);
    prefs
}

#[derive(Debug, Clone)]
enum StoreOp {
    Ingest { uid: u8, group: usize, mention: bool },
    Cancel { uid: u8 },
}

fn arb_store_op() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        2 => (0u8..25, 0usize..3, any::<bool>())
            .prop_map(|(uid, group, mention)| StoreOp::Ingest { uid, group, mention }),
        1 => (0u8..25).prop_map(|uid| StoreOp::Cancel { uid }),
    ]
}

#[derive(Debug, Clone)]
enum ViewOp {
    Open(usize),
    Close,
    Ingest(usize),
}

fn arb_view_op() -> impl Strategy<Value = ViewOp> {
    prop_oneof![
        1 => (0usize..3).prop_map(ViewOp::Open),
        1 => Just(ViewOp::Close),
        3 => (0usize..3).prop_map(ViewOp::Ingest),
    ]
}

#[derive(Debug, Clone)]
enum PrivacyOp {
    Ingest(usize),
    Edit(u8),
    Delete(u8),
    Lock,
    Unlock,
}

fn arb_privacy_op() -> impl Strategy<Value = PrivacyOp> {
    prop_oneof![
        4 => (0usize..2).prop_map(PrivacyOp::Ingest),
        1 => (0u8..30).prop_map(PrivacyOp::Edit),
        1 => (0u8..30).prop_map(PrivacyOp::Delete),
        1 => Just(PrivacyOp::Lock),
        1 => Just(PrivacyOp::Unlock),
    ]
}

/// 每个 id 当前显示的正文
fn shown_texts(h: &Harness) -> Vec<(i32, String)> {
    h.platform
        .active_ids()
        .into_iter()
        .filter_map(|id| h.platform.active(id).map(|n| (id, n.text)))
        .collect()
}

fn ingest_prefix(h: &Harness, prefix: &[(u8, usize)]) {
    let groups = groups();
    for (uid, group) in prefix {
        h.coordinator.ingest(
            message(&format!("u{}", uid), &groups[*group], "Ann", &format!("text {}", uid)),
            false,
        );
    }
}

/// 隐私序列产生的所有正文都不能出现在任何发布内容里
fn run_privacy_ops(h: &Harness, ops: &[PrivacyOp]) -> Vec<String> {
    let groups = groups();
    let mut secrets = Vec::new();
    for (step, op) in ops.iter().enumerate() {
        h.clock.advance(7_000);
        match op {
            PrivacyOp::Ingest(group) => {
                let secret = format!("secret-{}", step);
                h.coordinator
                    .ingest(message(&format!("s{}", step), &groups[*group], "Ann", &secret), false);
                secrets.push(secret);
            }
            PrivacyOp::Edit(n) => {
                let secret = format!("secret-edit-{}", step);
                let group = &groups[usize::from(*n) % 2];
                h.coordinator
                    .ingest(message(&format!("s{}", n), group, "Ann", &secret), true);
                secrets.push(secret);
            }
            PrivacyOp::Delete(n) => h.coordinator.on_deleted(&format!("s{}", n)),
            PrivacyOp::Lock => h.lock_app(),
            PrivacyOp::Unlock => h.unlock_app(),
        }
    }
    secrets
}

fn leaked(h: &Harness, secrets: &[String]) -> Option<(i32, String)> {
    for (id, payload) in h.posts() {
        for text in payload.visible_texts() {
            if let Some(secret) = secrets.iter().find(|s| text.contains(s.as_str())) {
                return Some((id, secret.clone()));
            }
        }
    }
    None
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// 存储中的 uid 恰好是未被撤回、且没有被 DND 丢弃的那些
    #[test]
    fn store_matches_surviving_uids(ops in vec(arb_store_op(), 1..120)) {
        let h = Harness::with_prefs(mention_only_prefs());
        let groups = groups();
        let mut expected = BTreeSet::new();

        for op in &ops {
            match op {
                StoreOp::Cancel { uid } => {
                    let uid = format!("u{}", uid);
                    h.coordinator.cancel_by_uid([uid.as_str()]);
                    expected.remove(&uid);
                }
                StoreOp::Ingest { uid, group, mention } => {
                    let uid = format!("u{}", uid);
                    let text = if *mention { "@ME look" } else { "plain" };
                    h.coordinator.ingest(message(&uid, &groups[*group], "Ann", text), false);
                    if *group != 2 || *mention {
                        expected.insert(uid);
                    }
                }
            }
        }

        let actual: BTreeSet<String> = h.coordinator.pending_uids().into_iter().collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(h.platform.badge().unwrap_or(0), h.coordinator.pending_count());
    }

    /// 可见会话既不在存储中，也不在通知栏上
    #[test]
    fn visible_receiver_never_stored(ops in vec(arb_view_op(), 1..150)) {
        let h = Harness::new();
        let groups = groups();
        let mut owner: HashMap<String, usize> = HashMap::new();

        for (step, op) in ops.iter().enumerate() {
            match op {
                ViewOp::Open(group) => h
                    .coordinator
                    .set_visible_receiver(Some(groups[*group].receiver.clone())),
                ViewOp::Close => h.coordinator.set_visible_receiver(None),
                ViewOp::Ingest(group) => {
                    let uid = format!("m{}", step);
                    owner.insert(uid.clone(), *group);
                    h.coordinator.ingest(message(&uid, &groups[*group], "Ann", "hi"), false);
                }
            }

            if let Some(visible) = h.coordinator.visible_receiver() {
                for uid in h.coordinator.pending_uids() {
                    prop_assert!(!groups[owner[&uid]].receiver.same_as(&visible));
                }
                for g in groups.iter().filter(|g| g.receiver.same_as(&visible)) {
                    prop_assert!(!h.platform.is_active(g.notification_id));
                }
            }
        }
    }

    /// 同一会话 30 秒内最多一次发声
    #[test]
    fn at_most_one_loud_alert_per_window(
        arrivals in vec((0usize..2, 0i64..12_000), 1..150)
    ) {
        let h = Harness::new();
        let groups = groups();
        let mut loud: HashMap<usize, Vec<i64>> = HashMap::new();
        let mut now = 0i64;

        for (step, (group, delta)) in arrivals.iter().enumerate() {
            now += delta;
            h.clock.set(now);
            let g = &groups[*group];

            let before = h.platform.posts_for(g.notification_id).len();
            h.coordinator.ingest(message(&format!("m{}", step), g, "Ann", "hi"), false);
            let posts = h.platform.posts_for(g.notification_id);
            prop_assert_eq!(posts.len(), before + 1);
            if posts.last().is_some_and(|p| !p.alert_once) {
                loud.entry(*group).or_default().push(now);
            }
        }

        for times in loud.values() {
            for pair in times.windows(2) {
                prop_assert!(pair[1] - pair[0] >= 30_000, "loud at {} and {}", pair[0], pair[1]);
            }
        }
    }

    /// ingest 后立即按 uid 撤回，存储和通知栏恢复原状
    #[test]
    fn ingest_then_cancel_round_trip(
        prefix in vec((0u8..25, 0usize..3), 1..40),
        group in 0usize..3,
    ) {
        let h = Harness::new();
        ingest_prefix(&h, &prefix);

        let uids_before = h.coordinator.pending_uids();
        let shown_before = shown_texts(&h);
        let badge_before = h.platform.badge();

        h.coordinator
            .ingest(message("fresh", &groups()[group], "Ann", "fresh text"), false);
        h.coordinator.cancel_by_uid(["fresh"]);

        prop_assert_eq!(h.coordinator.pending_uids(), uids_before);
        prop_assert_eq!(shown_texts(&h), shown_before);
        prop_assert_eq!(h.platform.badge(), badge_before);
    }

    /// 重复锁定与锁定一次的结果相同
    #[test]
    fn lock_is_idempotent(prefix in vec((0u8..25, 0usize..3), 0..40)) {
        let h = Harness::new();
        ingest_prefix(&h, &prefix);

        h.lock_app();
        let shown_once = shown_texts(&h);
        let placeholder_once = h.coordinator.is_placeholder_posted();
        let uids_once = h.coordinator.pending_uids();

        h.lock_app();

        prop_assert_eq!(shown_texts(&h), shown_once);
        prop_assert_eq!(h.coordinator.is_placeholder_posted(), placeholder_once);
        prop_assert_eq!(h.coordinator.pending_uids(), uids_once);
        prop_assert_eq!(placeholder_once, !prefix.is_empty());
    }

    /// 预览关闭或会话隐藏时，消息正文不会出现在任何可见字段里
    #[test]
    fn no_preview_text_leaks(
        ops in vec(arb_privacy_op(), 1..60),
        hide_chats in any::<bool>(),
    ) {
        let mut prefs = Preferences::default();
        if hide_chats {
            prefs.hidden_chats.insert("contact-ECHOECHO".to_string());
            prefs.hidden_chats.insert("group-2".to_string());
        } else {
            prefs.show_message_preview = false;
        }
        let h = Harness::with_prefs(prefs);

        let secrets = run_privacy_ops(&h, &ops);

        prop_assert_eq!(leaked(&h, &secrets), None);
    }
}

#[test]
fn test_round_trip_in_same_group_keeps_sibling_visible() {
    let h = Harness::new();
    let g1 = contact("ECHOECHO", 11, "Echo");
    h.coordinator.ingest(message("a", &g1, "Echo", "first"), false);
    let shown_before = shown_texts(&h);

    h.coordinator.ingest(message("b", &g1, "Echo", "second"), false);
    h.coordinator.cancel_by_uid(["b"]);

    assert_eq!(h.coordinator.pending_uids(), vec!["a"]);
    assert_eq!(shown_texts(&h), shown_before);
    assert_eq!(h.platform.badge(), Some(1));
}
