//! 通知文案
//!
//! 所有用户可见的固定文本集中在这里，便于本地化替换。

// Summaries
pub const CONTENTS_HIDDEN: &str = "Contents hidden";
pub const NEW_MESSAGES_LOCKED: &str = "New messages";
pub const LOCKED_DESCRIPTION: &str = "Unlock the app to read them";
pub const MASTER_KEY_LOCKED: &str = "Messenger is locked";
pub const MASTER_KEY_LOCKED_DESCRIPTION: &str = "Enter your passphrase to receive messages";
pub const ME: &str = "Me";
pub const PRIVATE_CHAT: &str = "Private chat";

// Actions
pub const REPLY: &str = "Reply";
pub const ACKNOWLEDGE: &str = "Agree";
pub const DECLINE: &str = "Disagree";
pub const MARK_READ: &str = "Mark as read";
pub const RETURN_CALL: &str = "Call back";
pub const JOIN_CALL: &str = "Join";
pub const TRY_AGAIN: &str = "Try again";

/// 穿戴设备快捷回复
pub const WEARABLE_REPLY_CHOICES: [&str; 4] = ["OK", "Yes", "No", "On my way"];

// Auxiliary notices
pub const UNSENT_TITLE: &str = "Sending failed";
pub const SAFE_BACKUP_FAILED_TITLE: &str = "Backup failed";
pub const GROUP_CALL_TITLE: &str = "Group call";

/// "1 new message" / "N new messages"
pub fn new_messages(count: usize) -> String {
    if count == 1 {
        "1 new message".to_string()
    } else {
        format!("{} new messages", count)
    }
}

/// "N new messages in K chats"，只有一个会话时退化为 `new_messages`
pub fn new_messages_in_chats(count: usize, chats: usize) -> String {
    if chats <= 1 {
        new_messages(count)
    } else {
        format!("{} in {} chats", new_messages(count), chats)
    }
}

/// 回复动作的输入提示，随接收方类型变化
pub fn reply_label(name: &str, is_group: bool) -> String {
    if is_group {
        format!("Write to {}", name)
    } else {
        format!("Reply to {}", name)
    }
}

pub fn unsent_messages(count: usize) -> String {
    if count == 1 {
        "1 message could not be sent".to_string()
    } else {
        format!("{} messages could not be sent", count)
    }
}

pub fn safe_backup_failed(days: u32) -> String {
    format!("The last successful backup was {} days ago", days)
}

pub fn group_call_started(caller: &str) -> String {
    format!("{} started a group call", caller)
}
