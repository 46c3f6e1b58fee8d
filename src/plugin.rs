use crate::action::{ActionData, PokeAction};
use crate::config::{self, CONFIG_FILE_NAME, ConfigSection, PokeConfig};
use crate::host::{Action, ActionComponent, ActionRequest, Plugin};
use std::path::{Path, PathBuf};

pub const PLUGIN_NAME: &str = "poke_plugin";

/// QQ 戳一戳插件，支持群聊和好友戳一戳
pub struct PokePlugin {
    plugin_dir: PathBuf,
    config: PokeConfig,
}

impl PokePlugin {
    /// 从插件目录加载 config.toml
    ///
    /// 文件不存在时按默认值生成；读取或解析失败时记录错误并使用默认配置。
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        let plugin_dir = plugin_dir.into();
        let config = load_or_default(&plugin_dir.join(CONFIG_FILE_NAME));
        Self { plugin_dir, config }
    }

    pub fn config_path(&self) -> PathBuf {
        self.plugin_dir.join(CONFIG_FILE_NAME)
    }

    pub fn config(&self) -> &PokeConfig {
        &self.config
    }
}

fn load_or_default(path: &Path) -> PokeConfig {
    if !path.exists() {
        match config::write_default_config(path) {
            Ok(()) => info!(target: "Config", "已生成默认配置: {}", path.display()),
            Err(e) => error!(target: "Config", "写入默认配置失败: {}", e),
        }
        return PokeConfig::default();
    }

    match PokeConfig::load(path) {
        Ok(cfg) => {
            info!(target: "Config", "config.toml已加载");
            cfg
        }
        Err(e) => {
            error!(target: "Config", "读取config.toml失败: {}，使用空配置。", e);
            PokeConfig::default()
        }
    }
}

impl Plugin for PokePlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn description(&self) -> &str {
        "QQ戳一戳功能插件，支持群聊和好友戳一戳"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn author(&self) -> &str {
        "Neorestim"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["core_actions"]
    }

    fn enabled(&self) -> bool {
        self.config.plugin.enabled
    }

    fn config_schema(&self) -> Vec<ConfigSection> {
        config::config_schema()
    }

    fn components(&self) -> Vec<ActionComponent> {
        let config = self.config.clone();
        let config_path = self.config_path();

        vec![ActionComponent {
            info: PokeAction::action_info(&self.config),
            factory: Box::new(move |req: ActionRequest| -> Box<dyn Action> {
                let action_data = ActionData::from_value(&req.action_data);
                Box::new(
                    PokeAction::new(config.clone(), action_data, req.context)
                        .with_config_path(config_path.clone()),
                )
            }),
        }]
    }
}
