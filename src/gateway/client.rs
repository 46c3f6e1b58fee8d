use super::{Endpoint, GatewayApi, check_api_response};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

/// 基于 reqwest 的网关客户端
///
/// 不保留空闲连接，每次调用都是一条新连接。
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| GatewayError::InvalidRequest {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !self.config.token.is_empty() {
            let value = HeaderValue::from_str(&self.config.token).map_err(|e| {
                GatewayError::InvalidRequest {
                    message: format!("token 不能作为请求头: {}", e),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

/// 调试输出用，隐藏 token
fn describe_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            if *name == AUTHORIZATION {
                format!("{}: ***", name)
            } else {
                format!("{}: {}", name, value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl GatewayApi for HttpGateway {
    async fn call_api(&self, endpoint: Endpoint, payload: Value) -> GatewayResult<Value> {
        let headers = self.headers()?;
        let url = format!("{}{}", self.base_url, endpoint.path());
        let body = payload.to_string();

        if self.config.debug {
            debug!(
                target: "Gateway",
                "-> POST {} 请求头: {{{}}} 载荷: {}",
                url,
                describe_headers(&headers),
                body
            );
        }

        let resp = self
            .client
            .post(&url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(GatewayError::from_reqwest)?;

        let http_status = resp.status();
        let bytes = resp.bytes().await.map_err(GatewayError::from_reqwest)?;
        let raw = String::from_utf8(bytes.to_vec()).map_err(|e| GatewayError::Parse {
            message: e.to_string(),
            raw: String::from_utf8_lossy(&bytes).into_owned(),
        })?;

        if self.config.debug {
            debug!(target: "Gateway", "<- {} [{}] 响应: {}", endpoint, http_status, raw);
        }

        let json: Value = serde_json::from_str(&raw).map_err(|e| GatewayError::Parse {
            message: e.to_string(),
            raw: raw.clone(),
        })?;

        check_api_response(json, &raw)
    }
}
