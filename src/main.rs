//! Message Notifier CLI
//!
//! 回放事件脚本、查看与初始化偏好设置

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use message_notifier::notification::parse_priority;
use message_notifier::{load_script, PlatformOp, Preferences, ReplayReport, Replayer};

#[derive(Parser)]
#[command(name = "mnotify")]
#[command(about = "Message Notifier - 会话通知协调器")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 回放 JSONL 事件脚本并输出平台调用
    Replay {
        /// 脚本路径
        script: PathBuf,
        /// 偏好设置文件（默认 ~/.config/message-notifier/preferences.json）
        #[arg(long)]
        prefs: Option<PathBuf>,
        /// 覆盖通知优先级 (min/low/default/high/max)
        #[arg(long)]
        priority: Option<String>,
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 打印当前生效的偏好设置
    Prefs {
        /// 偏好设置文件
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// 写入默认偏好设置文件
    InitPrefs {
        /// 偏好设置文件
        #[arg(long)]
        path: Option<PathBuf>,
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },
}

fn resolve_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => Preferences::default_path(),
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("MNOTIFY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("message_notifier=info,mnotify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            script,
            prefs,
            priority,
            json,
        } => {
            let mut preferences = Preferences::load(&resolve_path(prefs)?)?;
            if let Some(value) = priority {
                preferences.notification_priority = parse_priority(&value)
                    .ok_or_else(|| anyhow!("未知的优先级: {}", value))?;
            }

            let events = load_script(&script)?;
            debug!(events = events.len(), "Script loaded");

            let replayer = Replayer::new(preferences)?;
            let report = replayer.run(events);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Prefs { path } => {
            let path = resolve_path(path)?;
            let prefs = Preferences::load(&path)?;
            eprintln!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
        Commands::InitPrefs { path, force } => {
            let path = resolve_path(path)?;
            if path.exists() && !force {
                bail!("配置文件已存在: {} (使用 --force 覆盖)", path.display());
            }
            Preferences::default().save(&path)?;
            info!(path = %path.display(), "Default preferences written");
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn print_report(report: &ReplayReport) {
    println!("Replayed {} events", report.events);
    println!();
    println!("Platform operations:");
    for op in &report.ops {
        match op {
            PlatformOp::Post { id, notification } => println!(
                "  post    #{:<6} {} | {}{}",
                id,
                notification.title,
                notification.text,
                if notification.alert_once { " (quiet)" } else { "" }
            ),
            PlatformOp::Rejected { id, error } => println!("  reject  #{:<6} {}", id, error),
            PlatformOp::Cancel { id } => println!("  cancel  #{}", id),
            PlatformOp::Badge { count } => println!("  badge   {}", count),
        }
    }

    println!();
    if report.active.is_empty() {
        println!("No active notifications");
    } else {
        println!("Active notifications:");
        for active in &report.active {
            println!(
                "  #{:<6} [{}] {} | {}",
                active.id,
                active.notification.channel.as_str(),
                active.notification.title,
                active.notification.text
            );
        }
    }

    println!();
    println!("Pending: {:?}", report.pending_uids);
    if let Some(badge) = report.badge {
        println!("Badge: {}", badge);
    }
}
