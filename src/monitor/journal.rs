//! Journal 日志监控器 - 基于 cursor 增量读取 systemd journal 并做关键字匹配
//!
//! 通过执行 journalctl 命令并管理 cursor 实现，不依赖 CGO 式的原生绑定。

use super::{CheckResult, Monitor};
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::process::Command;
use tracing::{debug, warn};

/// journalctl -o json 输出的单条日志
///
/// 只关心 `__CURSOR` 和 `MESSAGE` 两个字段。
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    /// 日志位置标记（不透明、单调递增）
    #[serde(rename = "__CURSOR")]
    pub cursor: String,
    /// 日志正文
    #[serde(rename = "MESSAGE", default)]
    pub message: String,
}

/// 日志来源接口
///
/// 把 journalctl 子进程和原生 API 两种实现方式抽象在同一个契约后面，
/// 监控逻辑不感知差异。每次 `entries_after` 返回"当前可读到的全部新日志"，
/// 是一个有限序列，不是持续跟随的 tail。
pub trait LogSource: Send {
    /// 查询指定服务最新的一条日志（用于初始化 cursor）
    fn latest(&self, unit: &str) -> Result<Option<LogEntry>>;

    /// 读取严格位于 cursor 之后的日志；cursor 为 None 时从最早可用处读取
    fn entries_after(&self, unit: &str, cursor: Option<&str>) -> Result<Vec<LogEntry>>;
}

/// 基于 journalctl 子进程的日志来源
pub struct JournalctlSource;

impl JournalctlSource {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, args: &[&str]) -> Result<Vec<LogEntry>> {
        let output = Command::new("journalctl")
            .args(args)
            .output()
            .context("failed to run journalctl")?;

        // journalctl 在没有新日志等情况下可能以非零状态退出，
        // 只要 stdout 可读就照常解析，仅记录日志。
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(
                status = %output.status,
                stderr = %stderr.trim(),
                "journalctl exited non-zero"
            );
        }

        let mut entries = Vec::new();
        for line in output.stdout.split(|b| *b == b'\n') {
            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<LogEntry>(line) {
                Ok(entry) => entries.push(entry),
                // 无法解析的行直接跳过，不参与 cursor 推进
                Err(e) => debug!(error = %e, "skipping unparseable journal line"),
            }
        }

        Ok(entries)
    }
}

impl Default for JournalctlSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSource for JournalctlSource {
    fn latest(&self, unit: &str) -> Result<Option<LogEntry>> {
        let entries = self.run(&["-u", unit, "-n", "1", "-o", "json", "--no-pager"])?;
        Ok(entries.into_iter().last())
    }

    fn entries_after(&self, unit: &str, cursor: Option<&str>) -> Result<Vec<LogEntry>> {
        let mut args = vec!["-u", unit, "-o", "json", "--no-pager"];
        if let Some(cursor) = cursor {
            args.push("--after-cursor");
            args.push(cursor);
        }
        self.run(&args)
    }
}

/// 监控一个服务的 journal 日志中是否出现配置的关键字
///
/// cursor 记录上次读到的位置，保证每条日志在监控器生命周期内只被检查一次。
pub struct JournalMonitor {
    unit: String,
    /// 关键字与编译后的不区分大小写正则，按配置顺序
    keywords: Vec<(String, Regex)>,
    source: Box<dyn LogSource>,
    cursor: Option<String>,
}

impl JournalMonitor {
    /// 创建使用 journalctl 的监控器
    pub fn new(unit: impl Into<String>, keywords: &[String]) -> Self {
        Self::with_source(unit, keywords, Box::new(JournalctlSource::new()))
    }

    /// 创建使用指定日志来源的监控器
    ///
    /// 构造时把 cursor 初始化为服务当前最新一条日志的位置，启动前的
    /// 历史日志不会被匹配。服务还没有任何日志时初始化会软性失败：
    /// cursor 保持为空，第一次检查从最早可用处读取。
    pub fn with_source(
        unit: impl Into<String>,
        keywords: &[String],
        source: Box<dyn LogSource>,
    ) -> Self {
        let unit = unit.into();

        let mut compiled = Vec::new();
        for keyword in keywords {
            match RegexBuilder::new(keyword).case_insensitive(true).build() {
                Ok(re) => compiled.push((keyword.clone(), re)),
                Err(e) => {
                    warn!(unit = %unit, keyword = %keyword, error = %e, "invalid keyword pattern, skipping");
                }
            }
        }

        let cursor = match source.latest(&unit) {
            Ok(Some(entry)) => Some(entry.cursor),
            Ok(None) => {
                debug!(unit = %unit, "no log history yet, cursor unseeded");
                None
            }
            Err(e) => {
                warn!(unit = %unit, error = %e, "failed to seed journal cursor, will read from earliest");
                None
            }
        };

        Self {
            unit,
            keywords: compiled,
            source,
            cursor,
        }
    }

    #[cfg(test)]
    fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

impl Monitor for JournalMonitor {
    fn name(&self) -> String {
        format!("journal({})", self.unit)
    }

    fn check(&mut self) -> CheckResult {
        let entries = match self.source.entries_after(&self.unit, self.cursor.as_deref()) {
            Ok(entries) => entries,
            // 读取失败不推进 cursor，下个周期重试同一窗口
            Err(e) => {
                return CheckResult::failed_with(
                    format!("服务 {} journal 读取失败", self.unit),
                    e,
                )
            }
        };

        let mut matched = Vec::new();
        let mut last_cursor = None;

        for entry in entries {
            // 无论是否命中关键字，都记录本次读到的最后一个位置
            last_cursor = Some(entry.cursor);

            for (keyword, re) in &self.keywords {
                if re.is_match(&entry.message) {
                    matched.push(format!(
                        "服务 [{}] journal 日志发现关键字 '{}': {}",
                        self.unit, keyword, entry.message
                    ));
                    // 一条日志只归属第一个命中的关键字
                    break;
                }
            }
        }

        if let Some(cursor) = last_cursor {
            self.cursor = Some(cursor);
        }

        if matched.is_empty() {
            CheckResult::ok(format!("服务 {} 日志无异常", self.unit))
        } else {
            CheckResult::failed(matched.join("\n"))
        }
    }
}
