use thiserror::Error;

use crate::infrastructure::HandleRole;

/// 应用程序错误类型
///
/// 只在二进制入口和批量驱动层使用，流程层内部使用下面更细的错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 本地校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 提交失败
    #[error("提交失败: {0}")]
    Submit(#[from] SubmitError),
    /// 审计日志同步失败
    #[error("审计日志同步失败: {0}")]
    LogSync(#[from] LogSyncError),
    /// 预览句柄错误
    #[error("句柄错误: {0}")]
    Handle(#[from] HandleError),
    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// 创建文件操作错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }
}

/// 本地校验错误（不会发出任何网络请求）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 提交时没有选择文档
    #[error("no document selected")]
    NoDocument,
    /// 上一次提交仍在进行中
    #[error("a submission is already in flight")]
    Busy,
    /// 文档不是 PDF
    #[error("only PDF files are supported (got {media_type} for {name})")]
    UnsupportedMediaType { name: String, media_type: String },
    /// 文档内容为空
    #[error("document {name} is empty")]
    EmptyDocument { name: String },
}

/// 远端转换调用失败
///
/// `Display` 的输出就是直接展示给用户的错误文本
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// 服务返回非 2xx，错误信息来自响应体的 `error` 字段
    #[error("{message}")]
    Service { status: u16, message: String },
    /// 网络层失败（连接被拒绝、超时、DNS、响应体无法解析）
    #[error("Network error: {detail}")]
    Transport { detail: String },
}

impl SubmitError {
    /// 从 reqwest 错误构造网络错误
    pub fn transport(err: impl std::fmt::Display) -> Self {
        SubmitError::Transport {
            detail: err.to_string(),
        }
    }

    /// 展示给用户的错误文本
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// 审计日志同步失败，只进入诊断通道
#[derive(Debug, Error)]
pub enum LogSyncError {
    /// 请求失败
    #[error("请求审计日志失败: {0}")]
    Request(#[source] reqwest::Error),
    /// 服务返回非 2xx
    #[error("审计日志接口返回 HTTP {status}: {body}")]
    BadStatus { status: u16, body: String },
    /// JSON 解析失败
    #[error("审计日志解析失败: {0}")]
    Decode(#[from] serde_json::Error),
    /// 其他来源（测试替身等）
    #[error("审计日志不可用: {0}")]
    Unavailable(String),
}

/// 预览句柄错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    /// 句柄已被回收，不能再读取内容
    #[error("display handle {url} has been revoked")]
    Revoked { url: String },
    /// 该角色当前没有存活的句柄
    #[error("no live {0} handle")]
    Missing(HandleRole),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 服务地址无效
    #[error("服务地址无效: {0}")]
    InvalidBaseUrl(String),
    /// 没有指定输入文件
    #[error("没有指定输入文件或目录 (SIGSECURE_INPUT)")]
    MissingInput,
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 构建 HTTP 客户端失败
    #[error("构建 HTTP 客户端失败: {0}")]
    HttpClient(#[source] reqwest::Error),
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
