//! 主动戳一戳动作
//!
//! 单次执行依次经过：重读配置 -> 解析目标 -> 自戳检查 -> 发送 -> 汇报。
//! 不重试，任何失败都折算成 `(false, 说明)`。

use crate::config::PokeConfig;
use crate::gateway::{GatewayApi, GroupId, HttpGateway, UserId, de_opt_id, de_opt_text};
use crate::host::{Action, ActionInfo, ActionOutcome, ActivationType, MessageContext};
use crate::resolver::{self, IdentitySources, Resolution};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

pub const ACTION_NAME: &str = "active_poke";

/// 决策层与宿主给出的动作参数
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActionData {
    /// 想戳的人发过的消息内容（或其昵称片段）
    #[serde(default, deserialize_with = "de_opt_text")]
    pub poke_keywords: Option<String>,
    /// Bot 自己的 QQ 号
    #[serde(default, deserialize_with = "de_opt_id")]
    pub self_id: Option<UserId>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub group_id: Option<GroupId>,
}

impl ActionData {
    pub fn from_value(value: &Value) -> Self {
        ActionData::deserialize(value).unwrap_or_else(|e| {
            warn!("动作参数无法解析: {}，按空参数处理", e);
            ActionData::default()
        })
    }
}

pub struct PokeAction {
    config: PokeConfig,
    config_path: Option<PathBuf>,
    pub action_data: ActionData,
    context: MessageContext,
}

impl PokeAction {
    pub fn new(config: PokeConfig, action_data: ActionData, context: MessageContext) -> Self {
        Self {
            config,
            config_path: None,
            action_data,
            context,
        }
    }

    /// 每次执行前都从该路径重读配置
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn config(&self) -> &PokeConfig {
        &self.config
    }

    pub fn action_info(config: &PokeConfig) -> ActionInfo {
        ActionInfo {
            name: ACTION_NAME,
            description: "主动戳一戳群聊或好友",
            parameters: vec![(
                "poke_keywords",
                "请在这里输入你想戳的人所发送的信息内容。",
            )],
            requirements: vec![
                "当你想要戳一戳某人时可选择调用",
                "当你想要和某人人友好互动时可选择调用",
                "当你想要提醒某人时可选择调用",
                "提示：戳一戳的Active不视为回复消息。无论什么时候，若与reply同时出现在选择中，应优先选择reply的action。keywords的内容应该全字匹配。",
                "比如，当你收到一条消息是“Restim：笨蛋小九揉揉揉揉”时，你想戳Restim，就在poke_keywords里输入“笨蛋小九揉揉揉揉”。错误的输入会导致active执行失败，所以需要严格按照格式来。",
            ],
            associated_types: vec!["text"],
            focus_activation: ActivationType::Always,
            normal_activation: if config.poke.allow_normal_active_poke {
                ActivationType::Always
            } else {
                ActivationType::Never
            },
        }
    }

    fn reload_config(&mut self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if !path.exists() {
            return;
        }
        match PokeConfig::load(path) {
            Ok(cfg) => self.config = cfg,
            Err(e) => warn!(target: "Config", "重读配置失败，沿用上一次的配置: {}", e),
        }
    }

    /// 群号来源：消息 > 会话流 > 动作参数；兜底 QQ 号：发言者 > 动作参数
    fn identity_sources(&self) -> IdentitySources {
        IdentitySources::new()
            .group(self.context.group_id)
            .group(self.context.stream_group_id)
            .group(self.action_data.group_id)
            .user(self.context.user_id)
            .user(self.action_data.user_id)
    }

    /// 用给定网关走完一次执行（不重读配置）
    pub async fn execute_with<G>(&mut self, gateway: &G) -> ActionOutcome
    where
        G: GatewayApi + ?Sized,
    {
        let keyword = self.action_data.poke_keywords.clone().unwrap_or_default();
        let target = resolver::resolve(gateway, &keyword, &self.identity_sources()).await;

        let outcome = self.poke(gateway, target).await;

        // 防止残留的 user_id 带进下一次无关的执行
        self.action_data.user_id = None;
        outcome
    }

    async fn poke<G>(&self, gateway: &G, target: Resolution) -> ActionOutcome
    where
        G: GatewayApi + ?Sized,
    {
        if let (Some(self_id), Some(user_id)) = (self.action_data.self_id, target.user_id)
            && self_id == user_id
        {
            info!("戳一戳目标为自己，忽略。");
            return ActionOutcome::failed("不能戳自己");
        }

        if self.config.poke.debug {
            debug!(
                "戳一戳目标: user_id={:?}, group_id={:?}",
                target.user_id, target.group_id
            );
        }

        match gateway.send_poke(target.user_id, target.group_id).await {
            Ok(resp) => {
                info!("戳一戳操作成功: {}", resp);
                ActionOutcome::succeeded("戳一戳操作成功")
            }
            Err(e) => {
                error!("戳一戳操作失败: {}", e);
                ActionOutcome::failed(format!("戳一戳操作失败: {}", e.detail()))
            }
        }
    }
}

#[async_trait]
impl Action for PokeAction {
    fn info(&self) -> ActionInfo {
        Self::action_info(&self.config)
    }

    async fn execute(&mut self) -> ActionOutcome {
        self.reload_config();

        match HttpGateway::new(self.config.poke.gateway()) {
            Ok(gateway) => self.execute_with(&gateway).await,
            Err(e) => {
                error!("无法创建网关客户端: {}", e);
                self.action_data.user_id = None;
                ActionOutcome::failed(format!("戳一戳操作异常: {}", e))
            }
        }
    }
}
