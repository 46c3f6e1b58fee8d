use super::{GroupId, UserId};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 可按关键词匹配的候选记录（群成员、好友、群）
pub trait Candidate {
    /// 参与匹配的名称字段
    fn names(&self) -> Vec<&str>;

    /// 命中后取出的 ID
    fn id(&self) -> Option<i64>;

    /// 任一名称包含关键词即命中（区分大小写，不做任何归一化）
    fn matches(&self, keyword: &str) -> bool {
        self.names().iter().any(|name| name.contains(keyword))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GroupMember {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "de_text")]
    pub nickname: String,
    /// 群名片
    #[serde(default, deserialize_with = "de_text")]
    pub card: String,
    #[serde(default, deserialize_with = "de_text")]
    pub remark: String,
}

impl Candidate for GroupMember {
    fn names(&self) -> Vec<&str> {
        vec![self.nickname.as_str(), self.card.as_str(), self.remark.as_str()]
    }

    fn id(&self) -> Option<i64> {
        self.user_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Friend {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "de_text")]
    pub nickname: String,
    #[serde(default, deserialize_with = "de_text")]
    pub remark: String,
}

impl Candidate for Friend {
    fn names(&self) -> Vec<&str> {
        vec![self.nickname.as_str(), self.remark.as_str()]
    }

    fn id(&self) -> Option<i64> {
        self.user_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GroupInfo {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub group_id: Option<GroupId>,
    #[serde(default, deserialize_with = "de_text")]
    pub group_name: String,
    #[serde(default, deserialize_with = "de_text")]
    pub group_remark: String,
}

impl Candidate for GroupInfo {
    fn names(&self) -> Vec<&str> {
        vec![self.group_name.as_str(), self.group_remark.as_str()]
    }

    fn id(&self) -> Option<i64> {
        self.group_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Sender {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "de_text")]
    pub nickname: String,
    #[serde(default, deserialize_with = "de_text")]
    pub card: String,
}

/// 群历史消息中的一条
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryMessage {
    #[serde(default, deserialize_with = "de_text")]
    pub raw_message: String,
    #[serde(default)]
    pub sender: Option<Sender>,
}

impl HistoryMessage {
    pub fn sender_id(&self) -> Option<UserId> {
        self.sender.as_ref().and_then(|s| s.user_id)
    }
}

impl Candidate for HistoryMessage {
    // 历史消息只按消息原文匹配，不看发送者昵称
    fn names(&self) -> Vec<&str> {
        vec![self.raw_message.as_str()]
    }

    fn id(&self) -> Option<i64> {
        self.sender_id()
    }
}

/// QQ 号 / 群号：兼容数字与数字字符串，0 视为缺失
pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let id = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(id.filter(|id| *id != 0))
}

fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_text(deserializer)?.unwrap_or_default())
}

/// 文本字段：数字转成字符串，其余类型视为缺失
pub(crate) fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
