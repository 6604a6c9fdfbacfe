//! 飞书（Lark）webhook 通知器 - 富文本卡片 + 多 webhook 扇出

use super::{EndpointFailure, Notifier, NotifyError};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// 飞书通知器配置
#[derive(Debug, Clone)]
pub struct LarkConfig {
    /// webhook 地址列表，每条通知发往全部地址
    pub webhook_urls: Vec<String>,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for LarkConfig {
    fn default() -> Self {
        Self {
            webhook_urls: Vec::new(),
            timeout_secs: 10,
        }
    }
}

/// 飞书消息载荷
#[derive(Debug, Serialize)]
struct LarkPayload {
    msg_type: &'static str,
    content: PostContent,
}

#[derive(Debug, Serialize)]
struct PostContent {
    post: Post,
}

#[derive(Debug, Serialize)]
struct Post {
    zh_cn: PostBody,
}

#[derive(Debug, Serialize)]
struct PostBody {
    /// 卡片标题（notify 的 subject）
    title: String,
    /// 富文本内容，二维数组：每个内层数组是一行
    content: Vec<Vec<PostElement>>,
}

#[derive(Debug, Serialize)]
struct PostElement {
    tag: &'static str,
    text: String,
}

/// 飞书 webhook 通知器
///
/// 对每个配置的 webhook 地址各发一次 POST，不因前面的失败短路；
/// 全部尝试完后聚合所有失败返回。
pub struct LarkNotifier {
    config: LarkConfig,
    client: Client,
}

impl LarkNotifier {
    /// 创建通知器（带超时的 HTTP 客户端）
    pub fn new(config: LarkConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    fn build_payload(subject: &str, body: &str) -> LarkPayload {
        LarkPayload {
            msg_type: "post",
            content: PostContent {
                post: Post {
                    zh_cn: PostBody {
                        title: subject.to_string(),
                        content: vec![vec![PostElement {
                            tag: "text",
                            text: body.to_string(),
                        }]],
                    },
                },
            },
        }
    }

    fn post_to(&self, url: &str, payload: &LarkPayload) -> std::result::Result<(), String> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if status.is_success() {
            debug!(endpoint = %url, "lark notification sent");
            Ok(())
        } else {
            // 响应体带进失败详情，方便排查 webhook 配置问题
            let body = response.text().unwrap_or_default();
            Err(format!("status {}: {}", status, body))
        }
    }
}

impl Notifier for LarkNotifier {
    fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.config.webhook_urls.is_empty() {
            return Err(NotifyError::NoEndpoints);
        }

        let payload = Self::build_payload(subject, body);
        let mut failures = Vec::new();

        for url in &self.config.webhook_urls {
            if let Err(reason) = self.post_to(url, &payload) {
                warn!(endpoint = %url, reason = %reason, "lark webhook send failed");
                failures.push(EndpointFailure {
                    endpoint: url.clone(),
                    reason,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Delivery { failures })
        }
    }
}
