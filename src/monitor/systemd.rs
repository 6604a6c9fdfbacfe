//! Systemd 服务状态监控器 - 通过 `systemctl is-active` 检查服务运行状态

use super::{CheckResult, Monitor};
use anyhow::anyhow;
use std::process::Command;
use tracing::debug;

/// 服务管理器返回的运行状态（三态）
#[derive(Debug)]
pub enum UnitState {
    /// 服务处于 active/running 状态
    Active,
    /// 服务存在但未运行（inactive、failed 等）
    Inactive(String),
    /// 无法查询（服务不存在、管理器不可达等）
    Unknown(anyhow::Error),
}

/// 进程管理器查询接口
///
/// 生产实现通过 systemctl 查询，测试中可以用固定状态替换。
pub trait ServiceManager: Send {
    /// 查询指定 unit 的当前运行状态
    fn query_state(&self, unit: &str) -> UnitState;
}

/// 基于 `systemctl is-active` 的服务管理器
pub struct SystemctlManager;

impl SystemctlManager {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemctlManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManager for SystemctlManager {
    fn query_state(&self, unit: &str) -> UnitState {
        // `is-active` 服务不活跃时返回非零退出码，stdout 是状态字符串
        let output = match Command::new("systemctl")
            .args(["is-active", unit])
            .output()
        {
            Ok(output) => output,
            Err(e) => return UnitState::Unknown(anyhow!(e).context("failed to run systemctl")),
        };

        let state = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(unit = %unit, state = %state, "systemctl is-active");

        if output.status.success() {
            UnitState::Active
        } else if state.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            UnitState::Unknown(anyhow!(
                "systemctl is-active exited with {}: {}",
                output.status,
                stderr
            ))
        } else {
            UnitState::Inactive(state)
        }
    }
}

/// 监控一个具体 systemd 服务的运行状态
///
/// 构造时不做任何 I/O，自身没有可变状态，连续两次检查结果结构相同。
pub struct SystemdMonitor {
    unit: String,
    manager: Box<dyn ServiceManager>,
}

impl SystemdMonitor {
    /// 创建使用 systemctl 的监控器
    pub fn new(unit: impl Into<String>) -> Self {
        Self::with_manager(unit, Box::new(SystemctlManager::new()))
    }

    /// 创建使用指定服务管理器的监控器
    pub fn with_manager(unit: impl Into<String>, manager: Box<dyn ServiceManager>) -> Self {
        Self {
            unit: unit.into(),
            manager,
        }
    }
}

impl Monitor for SystemdMonitor {
    fn name(&self) -> String {
        format!("systemd-service({})", self.unit)
    }

    fn check(&mut self) -> CheckResult {
        match self.manager.query_state(&self.unit) {
            UnitState::Active => CheckResult::ok(format!("服务 {} 运行正常", self.unit)),
            UnitState::Inactive(state) => CheckResult::failed_with(
                format!("服务 {} 状态异常: {}", self.unit, state),
                anyhow!("unit is {}", state),
            ),
            UnitState::Unknown(e) => CheckResult::failed_with(
                format!("服务 {} 状态未知或不存在", self.unit),
                e,
            ),
        }
    }
}
