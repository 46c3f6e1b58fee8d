//! NapCat HTTP 网关客户端
//!
//! 所有接口都是 `POST /<action>`，请求与响应均为 JSON，
//! 响应体中 `status == "ok"` 视为成功。

use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;

mod client;
mod models;
#[cfg(test)]
pub(crate) mod scripted;

pub use client::HttpGateway;
pub use models::{Candidate, Friend, GroupInfo, GroupMember, HistoryMessage, Sender};
pub(crate) use models::{de_opt_id, de_opt_text};

pub type UserId = i64;
pub type GroupId = i64;

/// 插件用到的网关接口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetGroupMemberList,
    GetFriendList,
    GetGroupList,
    GetGroupMsgHistory,
    SendPoke,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::GetGroupMemberList => "/get_group_member_list",
            Endpoint::GetFriendList => "/get_friend_list",
            Endpoint::GetGroupList => "/get_group_list",
            Endpoint::GetGroupMsgHistory => "/get_group_msg_history",
            Endpoint::SendPoke => "/send_poke",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// 发起一次调用，成功时返回完整的响应体
    async fn call_api(&self, endpoint: Endpoint, payload: Value) -> GatewayResult<Value>;

    /// 获取群成员列表
    /// 返回的每个成员至少包含 user_id / nickname / card
    async fn get_group_member_list(
        &self,
        group_id: GroupId,
        no_cache: bool,
    ) -> GatewayResult<Vec<GroupMember>> {
        let resp = self
            .call_api(
                Endpoint::GetGroupMemberList,
                json!({ "group_id": group_id, "no_cache": no_cache }),
            )
            .await?;
        Ok(decode_list(&resp["data"]))
    }

    /// 获取好友列表
    async fn get_friend_list(&self, no_cache: bool) -> GatewayResult<Vec<Friend>> {
        let resp = self
            .call_api(Endpoint::GetFriendList, json!({ "no_cache": no_cache }))
            .await?;
        Ok(decode_list(&resp["data"]))
    }

    /// 获取群列表
    async fn get_group_list(&self, no_cache: bool) -> GatewayResult<Vec<GroupInfo>> {
        let resp = self
            .call_api(Endpoint::GetGroupList, json!({ "no_cache": no_cache }))
            .await?;
        Ok(decode_list(&resp["data"]))
    }

    /// 获取群历史消息
    /// message_seq: 起始消息序号，0 为最新
    /// reverse_order: 是否倒序
    async fn get_group_msg_history(
        &self,
        group_id: GroupId,
        message_seq: i64,
        count: u32,
        reverse_order: bool,
    ) -> GatewayResult<Vec<HistoryMessage>> {
        let resp = self
            .call_api(
                Endpoint::GetGroupMsgHistory,
                json!({
                    "group_id": group_id,
                    "message_seq": message_seq,
                    "count": count,
                    "reverseOrder": reverse_order,
                }),
            )
            .await?;
        Ok(decode_list(&resp["data"]["messages"]))
    }

    /// 发送戳一戳
    /// group_id 为空时为私聊戳；user_id 为空时照常发送 null，由网关拒绝
    async fn send_poke(
        &self,
        user_id: Option<UserId>,
        group_id: Option<GroupId>,
    ) -> GatewayResult<Value> {
        let mut params = json!({ "user_id": user_id });
        if let Some(gid) = group_id {
            params["group_id"] = json!(gid);
        }
        self.call_api(Endpoint::SendPoke, params).await
    }
}

/// 逐条解析列表，非数组视为空列表，无法解析的条目直接跳过
fn decode_list<T: DeserializeOwned>(data: &Value) -> Vec<T> {
    data.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| T::deserialize(item).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// 按 status 字段判定调用结果
pub(crate) fn check_api_response(body: Value, raw: &str) -> GatewayResult<Value> {
    match body.get("status").and_then(Value::as_str) {
        Some("ok") => Ok(body),
        status => {
            let message = ["message", "wording", "msg"]
                .iter()
                .filter_map(|key| body.get(*key).and_then(Value::as_str))
                .find(|s| !s.is_empty())
                .unwrap_or_default()
                .to_string();
            Err(GatewayError::Status {
                status: status.unwrap_or("missing").to_string(),
                retcode: body.get("retcode").and_then(Value::as_i64),
                message,
                raw: raw.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::scripted::ScriptedGateway;
    use super::*;

    #[test]
    fn only_ok_status_is_success() {
        let ok = json!({ "status": "ok", "retcode": 0, "data": null });
        assert!(check_api_response(ok.clone(), &ok.to_string()).is_ok());

        let failed = json!({ "status": "failed", "retcode": 1200, "message": "", "wording": "用户不存在" });
        match check_api_response(failed.clone(), &failed.to_string()) {
            Err(GatewayError::Status {
                status,
                retcode,
                message,
                ..
            }) => {
                assert_eq!(status, "failed");
                assert_eq!(retcode, Some(1200));
                assert_eq!(message, "用户不存在");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let no_status = json!({ "data": [] });
        assert!(matches!(
            check_api_response(no_status, "{}"),
            Err(GatewayError::Status { status, .. }) if status == "missing"
        ));
    }

    #[tokio::test]
    async fn list_endpoints_tolerate_odd_data() {
        let gateway = ScriptedGateway::new()
            .reply(
                Endpoint::GetGroupMemberList,
                json!({
                    "status": "ok",
                    "data": [
                        { "user_id": 10001, "nickname": "阿九", "card": null },
                        "garbage",
                        { "user_id": "10002", "nickname": "Restim", "card": "群主", "remark": "老板" }
                    ]
                }),
            )
            .reply(Endpoint::GetFriendList, json!({ "status": "ok", "data": {} }));

        let members = gateway.get_group_member_list(42, false).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].user_id, Some(10001));
        assert_eq!(members[0].card, "");
        assert_eq!(members[1].user_id, Some(10002));
        assert_eq!(members[1].remark, "老板");

        assert!(gateway.get_friend_list(false).await.unwrap().is_empty());
        assert_eq!(
            gateway.payload(Endpoint::GetGroupMemberList),
            Some(json!({ "group_id": 42, "no_cache": false }))
        );
    }

    #[tokio::test]
    async fn history_request_uses_forward_order() {
        let gateway = ScriptedGateway::new().reply(
            Endpoint::GetGroupMsgHistory,
            json!({
                "status": "ok",
                "data": { "messages": [
                    { "raw_message": "早上好", "sender": { "user_id": 7, "nickname": "七" } },
                    { "raw_message": "无人认领" }
                ] }
            }),
        );

        let messages = gateway.get_group_msg_history(42, 0, 20, false).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender_id(), Some(7));
        assert_eq!(messages[1].sender_id(), None);
        assert_eq!(
            gateway.payload(Endpoint::GetGroupMsgHistory),
            Some(json!({ "group_id": 42, "message_seq": 0, "count": 20, "reverseOrder": false }))
        );
    }

    #[tokio::test]
    async fn send_poke_payload_shape() {
        let gateway =
            ScriptedGateway::new().reply(Endpoint::SendPoke, json!({ "status": "ok" }));

        gateway.send_poke(Some(12345), Some(42)).await.unwrap();
        assert_eq!(
            gateway.payload(Endpoint::SendPoke),
            Some(json!({ "user_id": 12345, "group_id": 42 }))
        );

        gateway.send_poke(None, None).await.unwrap();
        assert_eq!(
            gateway.payload(Endpoint::SendPoke),
            Some(json!({ "user_id": null }))
        );
    }
}
