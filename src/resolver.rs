//! 戳一戳目标解析
//!
//! 把决策层给出的关键词解析成 (QQ 号, 群号)。查找顺序：
//!
//! 1. 已知群：先在最近 20 条群消息的原文里找关键词，取发送者；
//!    找不到再在群成员的昵称 / 群名片 / 备注里找。
//! 2. 未知群：在好友的昵称 / 备注里找。
//! 3. 未知群：在群名 / 群备注里找，命中即作为戳一戳所在群。
//! 4. 仍没有 QQ 号时，退回调用方已知的身份（如触发消息的发送者）。
//!
//! 每一步都取列表中第一个命中项；网关失败只记日志，视为未命中。

use crate::error::GatewayResult;
use crate::gateway::{Candidate, GatewayApi, GroupId, UserId};
use regex::Regex;
use std::sync::OnceLock;

/// 群历史消息的回看条数
pub const HISTORY_COUNT: u32 = 20;

/// 按优先级排列的身份来源，每一项都可能缺失
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySources {
    groups: Vec<Option<GroupId>>,
    users: Vec<Option<UserId>>,
}

impl IdentitySources {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个群号来源，越早追加优先级越高
    pub fn group(mut self, group_id: Option<GroupId>) -> Self {
        self.groups.push(group_id);
        self
    }

    /// 追加一个兜底 QQ 号来源
    pub fn user(mut self, user_id: Option<UserId>) -> Self {
        self.users.push(user_id);
        self
    }

    pub fn context_group(&self) -> Option<GroupId> {
        first_present(&self.groups)
    }

    pub fn ambient_user(&self) -> Option<UserId> {
        first_present(&self.users)
    }
}

fn first_present(ids: &[Option<i64>]) -> Option<i64> {
    ids.iter().flatten().copied().find(|id| *id != 0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    pub user_id: Option<UserId>,
    pub group_id: Option<GroupId>,
}

pub async fn resolve<G>(gateway: &G, keyword: &str, sources: &IdentitySources) -> Resolution
where
    G: GatewayApi + ?Sized,
{
    let mut group_id = sources.context_group();

    if keyword.is_empty() {
        return Resolution {
            user_id: None,
            group_id,
        };
    }

    let mut user_id = match group_id {
        Some(gid) => {
            let history = gateway
                .get_group_msg_history(gid, 0, HISTORY_COUNT, false)
                .await;
            match pick("群历史消息", history, keyword) {
                Some(uid) => Some(uid),
                None => pick(
                    "群成员列表",
                    gateway.get_group_member_list(gid, false).await,
                    keyword,
                ),
            }
        }
        None => pick("好友列表", gateway.get_friend_list(false).await, keyword),
    };

    if group_id.is_none() {
        group_id = pick("群列表", gateway.get_group_list(false).await, keyword);
    }

    if user_id.is_none() {
        user_id = sources.ambient_user();
        if let Some(uid) = user_id {
            info!(target: "Resolver", "关键词 [{}] 未匹配到用户，使用上下文身份 {}", keyword, uid);
        }
    }

    Resolution { user_id, group_id }
}

fn pick<C: Candidate>(stage: &str, result: GatewayResult<Vec<C>>, keyword: &str) -> Option<i64> {
    match result {
        Ok(items) => items
            .iter()
            .find(|c| c.matches(keyword))
            .and_then(|c| c.id()),
        Err(e) => {
            warn!(target: "Resolver", "查询{}失败: {}", stage, e);
            None
        }
    }
}

fn poke_keyword_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [r"(?i)戳我"]
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// 检测消息里是否有人直接要求被戳，返回命中的关键词（忽略大小写）
///
/// 插件自身不调用，留给宿主做关键词激活时使用。
pub fn match_poke_keyword(text: &str) -> Option<&str> {
    poke_keyword_patterns()
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str())
}
