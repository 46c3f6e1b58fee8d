//! 宿主框架接口
//!
//! 插件不掌控进程生命周期：宿主通过 [`ComponentRegistry`] 收下组件，
//! 在决策层选中动作时用 [`ActionFactory`] 构造 [`Action`] 并执行。

use crate::config::ConfigSection;
use crate::gateway::{GroupId, UserId};
use async_trait::async_trait;
use serde_json::Value;

/// 动作激活方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationType {
    #[default]
    Always,
    Never,
}

/// 交给决策层的动作描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInfo {
    pub name: &'static str,
    pub description: &'static str,
    /// 参数名 -> 给决策层的填写说明
    pub parameters: Vec<(&'static str, &'static str)>,
    /// 何时选用本动作
    pub requirements: Vec<&'static str>,
    pub associated_types: Vec<&'static str>,
    pub focus_activation: ActivationType,
    pub normal_activation: ActivationType,
}

/// 触发动作的那条消息的上下文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContext {
    /// 消息本身携带的群号
    pub group_id: Option<GroupId>,
    /// 所在会话流的群号
    pub stream_group_id: Option<GroupId>,
    /// 发言者
    pub user_id: Option<UserId>,
}

/// 宿主构造动作时传入的全部材料
#[derive(Debug, Clone, Default)]
pub struct ActionRequest {
    /// 决策层填写的参数，外加宿主补充的 self_id / user_id / group_id
    pub action_data: Value,
    pub context: MessageContext,
}

/// 动作执行结果：成功标记 + 给人看的说明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<ActionOutcome> for (bool, String) {
    fn from(outcome: ActionOutcome) -> Self {
        (outcome.success, outcome.message)
    }
}

#[async_trait]
pub trait Action: Send {
    fn info(&self) -> ActionInfo;

    /// 执行一次；任何失败都体现在返回值里，不会向宿主抛出
    async fn execute(&mut self) -> ActionOutcome;
}

pub type ActionFactory = Box<dyn Fn(ActionRequest) -> Box<dyn Action> + Send + Sync>;

pub struct ActionComponent {
    pub info: ActionInfo,
    pub factory: ActionFactory,
}

/// 插件元信息与组件清单
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn author(&self) -> &str {
        ""
    }

    /// 依赖的其他插件
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    fn enabled(&self) -> bool {
        true
    }

    fn config_schema(&self) -> Vec<ConfigSection> {
        Vec::new()
    }

    fn components(&self) -> Vec<ActionComponent>;
}

/// 宿主侧的组件登记处
pub trait ComponentRegistry {
    fn register_action(&mut self, plugin: &str, component: ActionComponent);
}

/// 把插件的全部组件交给宿主，返回登记的数量
pub fn register_plugin(registry: &mut dyn ComponentRegistry, plugin: &dyn Plugin) -> usize {
    if !plugin.enabled() {
        info!(target: "Plugin", "[{}] 已禁用，跳过注册", plugin.name());
        return 0;
    }

    let components = plugin.components();
    let count = components.len();
    for component in components {
        info!(
            target: "Plugin",
            "[{}] 注册动作 {} ({})",
            plugin.name(),
            component.info.name,
            component.info.description
        );
        registry.register_action(plugin.name(), component);
    }

    info!(target: "Plugin", "✅ [{}] v{} 就绪", plugin.name(), plugin.version());
    count
}
