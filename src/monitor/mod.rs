//! 监控器抽象 - 所有监控器变体的通用接口

pub mod journal;
pub mod systemd;

pub use journal::{JournalMonitor, JournalctlSource, LogEntry, LogSource};
pub use systemd::{ServiceManager, SystemctlManager, SystemdMonitor, UnitState};

/// 单次检查的结果
///
/// 每次 `check()` 都会产生一个新的结果，由调度器立即消费，不做持久化。
#[derive(Debug)]
pub struct CheckResult {
    /// 检查是否通过
    pub success: bool,
    /// 附带信息（失败时作为告警内容）
    pub message: String,
    /// 底层错误（保留用于诊断）
    pub cause: Option<anyhow::Error>,
}

impl CheckResult {
    /// 创建成功结果
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            cause: None,
        }
    }

    /// 创建失败结果
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            cause: None,
        }
    }

    /// 创建带底层错误的失败结果
    pub fn failed_with(message: impl Into<String>, cause: anyhow::Error) -> Self {
        Self {
            success: false,
            message: message.into(),
            cause: Some(cause),
        }
    }
}

/// 监控器 trait
///
/// `check()` 不允许 panic，也不允许无限阻塞；所有失败都转换为
/// `success = false` 的结果返回。
pub trait Monitor: Send {
    /// 监控器名称（稳定、可读，包含变体类型与目标，如 `systemd-service(foo)`）
    fn name(&self) -> String;

    /// 执行一次检查
    fn check(&mut self) -> CheckResult;
}
