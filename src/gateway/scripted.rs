//! 测试用网关：按接口预置响应，并记录每一次调用

use super::{Endpoint, GatewayApi, check_api_response};
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct ScriptedGateway {
    replies: HashMap<Endpoint, GatewayResult<Value>>,
    calls: Mutex<Vec<(Endpoint, Value)>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 预置响应体，按真实网关的 status 规则判定成败
    pub(crate) fn reply(mut self, endpoint: Endpoint, body: Value) -> Self {
        let raw = body.to_string();
        self.replies
            .insert(endpoint, check_api_response(body, &raw));
        self
    }

    pub(crate) fn fail(mut self, endpoint: Endpoint, err: GatewayError) -> Self {
        self.replies.insert(endpoint, Err(err));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Endpoint> {
        self.calls.lock().unwrap().iter().map(|(e, _)| *e).collect()
    }

    /// 该接口最近一次收到的载荷
    pub(crate) fn payload(&self, endpoint: Endpoint) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| *e == endpoint)
            .map(|(_, p)| p.clone())
    }
}

#[async_trait]
impl GatewayApi for ScriptedGateway {
    async fn call_api(&self, endpoint: Endpoint, payload: Value) -> GatewayResult<Value> {
        self.calls.lock().unwrap().push((endpoint, payload));
        // 未预置的接口按连接失败处理
        self.replies.get(&endpoint).cloned().unwrap_or_else(|| {
            Err(GatewayError::Network {
                kind: "ConnectError",
                message: "connection refused".into(),
            })
        })
    }
}
