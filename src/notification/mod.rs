//! 通知模块 - 通知器接口与多端点失败聚合

pub mod lark;

pub use lark::{LarkConfig, LarkNotifier};

use thiserror::Error;

/// 单个端点的发送失败详情
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointFailure {
    /// 端点标识（webhook URL）
    pub endpoint: String,
    /// 失败原因（请求错误或非 2xx 的状态码与响应体）
    pub reason: String,
}

/// 一次 notify 调用的失败
///
/// 发送会尝试所有端点，部分失败不会被吞掉：`Delivery` 按尝试顺序
/// 枚举每一个失败的端点。
#[derive(Debug, Error)]
pub enum NotifyError {
    /// 没有配置任何通知端点
    #[error("no notification endpoints configured")]
    NoEndpoints,
    /// 部分或全部端点发送失败
    #[error("{}", render_failures(.failures))]
    Delivery {
        /// 每个失败端点的详情，按尝试顺序
        failures: Vec<EndpointFailure>,
    },
}

impl NotifyError {
    /// 失败端点列表（`NoEndpoints` 时为空）
    pub fn failures(&self) -> &[EndpointFailure] {
        match self {
            NotifyError::NoEndpoints => &[],
            NotifyError::Delivery { failures } => failures,
        }
    }
}

fn render_failures(failures: &[EndpointFailure]) -> String {
    let details: Vec<String> = failures
        .iter()
        .map(|f| format!("{}: {}", f.endpoint, f.reason))
        .collect();
    format!(
        "delivery failed for {} endpoint(s): [{}]",
        failures.len(),
        details.join("; ")
    )
}

/// 通知器 trait
///
/// 实现负责把同一条消息发到它的所有端点并聚合结果，调用方每个
/// 检查周期最多调用一次。
pub trait Notifier: Send {
    /// 发送一条通知
    fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_enumerates_all_failures() {
        let err = NotifyError::Delivery {
            failures: vec![
                EndpointFailure {
                    endpoint: "http://a".to_string(),
                    reason: "status 500".to_string(),
                },
                EndpointFailure {
                    endpoint: "http://b".to_string(),
                    reason: "connection refused".to_string(),
                },
            ],
        };

        assert_eq!(err.failures().len(), 2);
        let text = err.to_string();
        assert!(text.contains("2 endpoint(s)"));
        assert!(text.contains("http://a: status 500"));
        assert!(text.contains("http://b: connection refused"));
    }

    #[test]
    fn test_no_endpoints_error() {
        let err = NotifyError::NoEndpoints;
        assert!(err.failures().is_empty());
        assert!(err.to_string().contains("no notification endpoints"));
    }
}
