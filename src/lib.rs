// lib.rs
//
// ================================================================================
// Ayjx Poke - QQ 戳一戳插件
//
// 作为宿主 Bot 框架的插件运行，通过 NapCat HTTP 接口：
//   关键词 -> 目标解析（群历史 / 群成员 / 好友 / 群列表）-> send_poke
// ================================================================================

#[macro_use]
pub mod log;

pub mod action;
pub mod config;
pub mod error;
pub mod gateway;
pub mod host;
pub mod plugin;
pub mod resolver;

pub mod prelude {
    //! 宿主接入时常用的类型
    //!
    //! ```rust
    //! use ayjx_poke::prelude::*;
    //! ```

    pub use crate::action::{ActionData, PokeAction};
    pub use crate::config::{ConfigField, ConfigSection, FieldType, GatewayConfig, PokeConfig};
    pub use crate::error::{GatewayError, GatewayResult, PluginError};
    pub use crate::gateway::{Endpoint, GatewayApi, GroupId, HttpGateway, UserId};
    pub use crate::host::{
        Action, ActionComponent, ActionFactory, ActionInfo, ActionOutcome, ActionRequest,
        ActivationType, ComponentRegistry, MessageContext, Plugin, register_plugin,
    };
    pub use crate::plugin::PokePlugin;
    pub use crate::resolver::{IdentitySources, Resolution, match_poke_keyword, resolve};
}
