//! Ops Monitor CLI
//!
//! 加载配置，构建监控器与通知器，然后把进程交给调度循环。

use anyhow::{Context, Result};
use clap::Parser;
use ops_monitor::{
    Config, JournalMonitor, LarkConfig, LarkNotifier, Scheduler, SystemdMonitor,
};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "opsmon")]
#[command(about = "周期性检查 systemd 服务健康状态并发送聚合告警")]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(long, short, default_value = "config.yaml")]
    config: String,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ops_monitor=info,opsmon=info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    // 配置不可读或格式错误在这里直接失败，进程以非零退出
    let config = Config::load(&cli.config)?;
    info!(
        config = %cli.config,
        interval_secs = config.effective_interval().as_secs(),
        "configuration loaded"
    );

    let notifier = LarkNotifier::new(LarkConfig {
        webhook_urls: config.lark.webhook_urls.clone(),
        ..LarkConfig::default()
    })
    .context("failed to create lark notifier")?;

    let mut scheduler = Scheduler::new(config.effective_interval(), Box::new(notifier));

    for unit in &config.systemd.services {
        scheduler.register(Box::new(SystemdMonitor::new(unit.clone())));
    }

    for target in &config.journal {
        info!(
            unit = %target.service_name,
            keywords = ?target.keywords,
            "setting up journal keyword monitor"
        );
        scheduler.register(Box::new(JournalMonitor::new(
            target.service_name.clone(),
            &target.keywords,
        )));
    }

    if scheduler.monitor_count() == 0 {
        warn!("no monitors configured, nothing will be checked");
    }

    // SIGINT/SIGTERM 只置位标志，当前周期（含通知）跑完后优雅退出
    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&shutdown))
        .context("failed to register SIGINT handler")?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&shutdown))
        .context("failed to register SIGTERM handler")?;

    scheduler.run(&shutdown);

    Ok(())
}
