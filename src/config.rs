use crate::error::PluginError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use toml::Value;

pub const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "4999";
const DEFAULT_REACTION_PROBABILITY: f64 = 0.3;

/// 插件配置快照
///
/// 对应 config.toml 中的 `[plugin]` 与 `[poke]` 两节。
/// 缺失或类型不符的字段取默认值，不会让整份配置失效。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PokeConfig {
    #[serde(default, deserialize_with = "de_section")]
    pub plugin: PluginSection,
    #[serde(default, deserialize_with = "de_section")]
    pub poke: PokeSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSection {
    #[serde(default = "default_true", deserialize_with = "de_lenient_bool")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokeSection {
    // 戳戳反击概率，目前只做声明，没有代码路径使用
    #[serde(
        default = "default_reaction_probability",
        deserialize_with = "de_probability"
    )]
    pub reaction_probability: f64,
    #[serde(default = "default_host", deserialize_with = "de_host")]
    pub host: String,
    #[serde(default = "default_port", deserialize_with = "de_port")]
    pub port: String,
    #[serde(default, deserialize_with = "de_token")]
    pub token: String,
    #[serde(default = "default_true", deserialize_with = "de_lenient_bool")]
    pub debug: bool,
    #[serde(default = "default_true", deserialize_with = "de_lenient_bool")]
    pub allow_normal_active_poke: bool,
}

fn default_true() -> bool {
    true
}

fn default_reaction_probability() -> f64 {
    DEFAULT_REACTION_PROBABILITY
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

impl Default for PluginSection {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

impl Default for PokeSection {
    fn default() -> Self {
        Self {
            reaction_probability: default_reaction_probability(),
            host: default_host(),
            port: default_port(),
            token: String::new(),
            debug: default_true(),
            allow_normal_active_poke: default_true(),
        }
    }
}

/// 单次执行所需的网关连接参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub host: String,
    pub port: String,
    pub token: String,
    pub debug: bool,
}

impl GatewayConfig {
    pub fn base_url(&self) -> String {
        // IPv6 字面量需要方括号
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("http://[{}]:{}", self.host, self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

impl PokeSection {
    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            host: self.host.clone(),
            port: self.port.clone(),
            token: self.token.clone(),
            debug: self.debug,
        }
    }
}

impl PokeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, PluginError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, PluginError> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("读取 {} 失败: {}", path.display(), e))?;
        Self::from_toml_str(&content)
    }

    /// 原子写入配置（写临时文件 -> rename 覆盖）
    pub fn save(&self, path: &Path) -> Result<(), PluginError> {
        write_atomic(path, &toml::to_string_pretty(self)?)
    }
}

/// 缺失配置文件时写入的默认内容
pub fn default_config() -> Value {
    Value::try_from(PokeConfig::default()).unwrap_or(Value::Table(Default::default()))
}

/// 按 [`default_config`] 生成配置文件
pub fn write_default_config(path: &Path) -> Result<(), PluginError> {
    write_atomic(path, &toml::to_string_pretty(&default_config())?)
}

fn write_atomic(path: &Path, content: &str) -> Result<(), PluginError> {
    let tmp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

// ================= 宽松解析 =================

/// 整节不是表（如 `poke = 1`）时按空表处理
fn de_section<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + for<'a> Deserialize<'a>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Table(_) => T::deserialize(value).unwrap_or_default(),
        _ => T::default(),
    })
}

fn de_lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Boolean(b) => b,
        Value::Integer(i) => i != 0,
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => true,
    })
}

/// 概率值，限制在 0~1
fn de_probability<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Float(f) => f,
        Value::Integer(i) => i as f64,
        Value::String(s) => s.trim().parse().unwrap_or(DEFAULT_REACTION_PROBABILITY),
        _ => DEFAULT_REACTION_PROBABILITY,
    };
    Ok(if value.is_nan() {
        DEFAULT_REACTION_PROBABILITY
    } else {
        value.clamp(0.0, 1.0)
    })
}

fn de_host<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => default_host(),
    })
}

fn de_token<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn de_port<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let port = match &value {
        Value::Integer(i) => u16::try_from(*i).ok(),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    Ok(match port {
        Some(p) if p != 0 => p.to_string(),
        _ => {
            warn!(target: "Config", "poke.port 无效: {}，使用默认端口 {}", value, DEFAULT_PORT);
            default_port()
        }
    })
}

// ================= 配置描述 =================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Float,
    Str,
}

/// 暴露给宿主的单个配置项描述
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigField {
    pub key: &'static str,
    pub field_type: FieldType,
    pub default: Value,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSection {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: Vec<ConfigField>,
}

fn field(
    key: &'static str,
    field_type: FieldType,
    default: impl Into<Value>,
    description: &'static str,
) -> ConfigField {
    ConfigField {
        key,
        field_type,
        default: default.into(),
        description,
    }
}

pub fn config_schema() -> Vec<ConfigSection> {
    vec![
        ConfigSection {
            name: "plugin",
            description: "插件启用配置",
            fields: vec![field("enabled", FieldType::Bool, true, "是否启用插件")],
        },
        ConfigSection {
            name: "poke",
            description: "戳戳功能配置",
            fields: vec![
                field(
                    "reaction_probability",
                    FieldType::Float,
                    DEFAULT_REACTION_PROBABILITY,
                    "戳戳反击概率，0~1之间",
                ),
                field("host", FieldType::Str, DEFAULT_HOST, "Napcat服务主机地址"),
                field("port", FieldType::Str, DEFAULT_PORT, "Napcat服务端口"),
                field("token", FieldType::Str, "", "Napcat接口鉴权token，可选"),
                field(
                    "debug",
                    FieldType::Bool,
                    true,
                    "是否开启调试模式（显示请求头和执行情况）",
                ),
                field(
                    "allow_normal_active_poke",
                    FieldType::Bool,
                    true,
                    "允许normal模式下主动戳戳",
                ),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_defaults_match_empty_config() {
        assert_eq!(PokeConfig::from_toml_str("").unwrap(), PokeConfig::default());

        // 配置描述里的默认值与生成的默认配置一致
        let defaults = default_config();
        for section in config_schema() {
            for f in section.fields {
                assert_eq!(defaults[section.name][f.key], f.default, "{}.{}", section.name, f.key);
            }
        }

        let cfg = PokeConfig::default();
        assert!(cfg.plugin.enabled);
        assert_eq!(cfg.poke.host, "127.0.0.1");
        assert_eq!(cfg.poke.port, "4999");
        assert_eq!(cfg.poke.token, "");
        assert!(cfg.poke.debug);
        assert!(cfg.poke.allow_normal_active_poke);
        assert_eq!(cfg.poke.reaction_probability, 0.3);
    }

    #[test]
    fn values_are_coerced_leniently() {
        let cfg = PokeConfig::from_toml_str(
            r#"
            [plugin]
            enabled = "off"

            [poke]
            reaction_probability = "0.75"
            host = " 10.0.0.2 "
            port = 3000
            token = "secret"
            debug = 0
            allow_normal_active_poke = "Yes"
            "#,
        )
        .unwrap();

        assert!(!cfg.plugin.enabled);
        assert_eq!(cfg.poke.reaction_probability, 0.75);
        assert_eq!(cfg.poke.host, "10.0.0.2");
        assert_eq!(cfg.poke.port, "3000");
        assert_eq!(cfg.poke.token, "secret");
        assert!(!cfg.poke.debug);
        assert!(cfg.poke.allow_normal_active_poke);
        assert_eq!(cfg.poke.gateway().base_url(), "http://10.0.0.2:3000");
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let cfg = PokeConfig::from_toml_str(
            r#"
            [poke]
            reaction_probability = 4.0
            port = "not-a-port"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.poke.reaction_probability, 1.0);
        assert_eq!(cfg.poke.port, "4999");

        // 类型错乱的字段只影响自己
        let cfg = PokeConfig::from_toml_str(
            r#"
            plugin = 5

            [poke]
            host = ["a"]
            token = 123
            port = 70000
            debug = "off"
            "#,
        )
        .unwrap();
        assert!(cfg.plugin.enabled);
        assert_eq!(cfg.poke.host, "127.0.0.1");
        assert_eq!(cfg.poke.token, "");
        assert_eq!(cfg.poke.port, "4999");
        assert!(!cfg.poke.debug);
    }

    #[test]
    fn ipv6_host_is_bracketed() {
        let mut cfg = PokeConfig::default();
        cfg.poke.host = "::1".into();
        assert_eq!(cfg.poke.gateway().base_url(), "http://[::1]:4999");

        cfg.poke.host = "[::1]".into();
        assert_eq!(cfg.poke.gateway().base_url(), "http://[::1]:4999");

        cfg.poke.host = "localhost".into();
        assert_eq!(cfg.poke.gateway().base_url(), "http://localhost:4999");
    }

    #[test]
    fn generated_default_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        write_default_config(&path).unwrap();
        assert_eq!(PokeConfig::load(&path).unwrap(), PokeConfig::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut cfg = PokeConfig::default();
        cfg.poke.token = "abc".into();
        cfg.poke.debug = false;
        cfg.save(&path).unwrap();

        assert_eq!(PokeConfig::load(&path).unwrap(), cfg);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[poke\nhost = ").unwrap();
        assert!(PokeConfig::load(&path).is_err());
        assert!(PokeConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
