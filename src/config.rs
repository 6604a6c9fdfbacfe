//! 配置模块 - 启动时从 YAML 文件加载一次，显式传入各组件

use crate::scheduler::DEFAULT_INTERVAL;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 应用配置
///
/// 启动时构造一次，按引用传给各组件构造函数，没有任何进程级的
/// 全局配置查找。配置文件不可读或格式错误在启动阶段直接失败。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// 检查间隔（秒）；非正数时生效值退回 60
    #[serde(default)]
    pub check_interval: i64,
    /// systemd 服务状态监控
    #[serde(default)]
    pub systemd: SystemdConfig,
    /// journal 日志关键字监控目标
    #[serde(default)]
    pub journal: Vec<JournalTarget>,
    /// 飞书通知
    #[serde(default)]
    pub lark: LarkSection,
}

/// systemd 监控配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemdConfig {
    /// 要检查运行状态的 unit 列表
    #[serde(default)]
    pub services: Vec<String>,
}

/// 单个 journal 监控目标
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JournalTarget {
    /// unit 名称
    pub service_name: String,
    /// 要匹配的关键字（不区分大小写的正则）
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// 飞书通知配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LarkSection {
    /// webhook 地址列表
    #[serde(default)]
    pub webhook_urls: Vec<String>,
}

impl Config {
    /// 从 YAML 文件加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// 实际生效的检查间隔（非正数退回默认值）
    pub fn effective_interval(&self) -> Duration {
        if self.check_interval > 0 {
            Duration::from_secs(self.check_interval as u64)
        } else {
            DEFAULT_INTERVAL
        }
    }
}
