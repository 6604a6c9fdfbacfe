//! Ops Monitor - 周期性服务健康检查与聚合告警
//!
//! 监控引擎分四块：监控器抽象（systemd 状态 + journal 关键字两种变体）、
//! 基于 cursor 的增量日志消费、通知扇出与失败聚合、单线程轮询调度器。

pub mod config;
pub mod monitor;
pub mod notification;
pub mod scheduler;

pub use config::{Config, JournalTarget};
pub use monitor::{
    CheckResult, JournalMonitor, JournalctlSource, LogEntry, LogSource, Monitor, ServiceManager,
    SystemctlManager, SystemdMonitor, UnitState,
};
pub use notification::{EndpointFailure, LarkConfig, LarkNotifier, Notifier, NotifyError};
pub use scheduler::{Scheduler, DEFAULT_INTERVAL};
