use std::fmt;

/// 插件外壳层使用的通用错误类型（配置读写等）
pub type PluginError = Box<dyn std::error::Error + Send + Sync>;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// NapCat 网关调用失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// 连接失败、超时、读取响应体失败等
    Network { kind: &'static str, message: String },
    /// 响应不是合法的 UTF-8 / JSON，或 data 结构不符合预期
    Parse { message: String, raw: String },
    /// 网关返回了 status != "ok"
    Status {
        status: String,
        retcode: Option<i64>,
        message: String,
        raw: String,
    },
    /// 请求还没发出就失败了（地址、请求头非法）
    InvalidRequest { message: String },
}

impl GatewayError {
    pub fn kind(&self) -> &str {
        match self {
            GatewayError::Network { kind, .. } => kind,
            GatewayError::Parse { .. } => "ParseError",
            GatewayError::Status { .. } => "StatusError",
            GatewayError::InvalidRequest { .. } => "InvalidRequest",
        }
    }

    /// 面向用户的错误详情
    ///
    /// 结构化的网关响应优先取其中的错误信息，否则退回原始响应文本。
    pub fn detail(&self) -> String {
        match self {
            GatewayError::Status { message, raw, .. } if message.is_empty() => raw.clone(),
            GatewayError::Status { message, .. } => message.clone(),
            GatewayError::Parse { raw, .. } if !raw.is_empty() => raw.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            "TimeoutError"
        } else if e.is_connect() {
            "ConnectError"
        } else if e.is_body() {
            "BodyError"
        } else if e.is_builder() {
            "BuilderError"
        } else {
            "RequestError"
        };
        GatewayError::Network {
            kind,
            message: e.to_string(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Network { kind, message } => write!(f, "{}: {}", kind, message),
            GatewayError::Parse { message, .. } => write!(f, "ParseError: {}", message),
            GatewayError::Status {
                status,
                retcode,
                message,
                ..
            } => {
                write!(f, "StatusError: status={}", status)?;
                if let Some(code) = retcode {
                    write!(f, " (retcode: {})", code)?;
                }
                if !message.is_empty() {
                    write!(f, " {}", message)?;
                }
                Ok(())
            }
            GatewayError::InvalidRequest { message } => write!(f, "InvalidRequest: {}", message),
        }
    }
}

impl std::error::Error for GatewayError {}
