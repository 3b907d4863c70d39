use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::models::{PrivacyMode, RedactionStyle, TransformParameters};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 转换服务地址
    pub api_base_url: String,
    /// 待处理的 PDF 文件或目录
    pub input_path: Option<String>,
    /// 结果输出目录
    pub output_dir: String,
    /// 默认隐私模式
    pub privacy_mode: PrivacyMode,
    /// 默认遮盖样式
    pub redaction_style: RedactionStyle,
    /// 只高亮不遮盖
    pub highlight_only: bool,
    /// 客户端请求超时（秒），不设置则一直等待
    pub request_timeout_secs: Option<u64>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            input_path: None,
            output_dir: "redacted_output".to_string(),
            privacy_mode: PrivacyMode::default(),
            redaction_style: RedactionStyle::default(),
            highlight_only: false,
            request_timeout_secs: None,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 设置了 `SIGSECURE_CONFIG` 时先读取该 TOML 文件，再用环境变量覆盖
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var("SIGSECURE_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.overlay_env(|name| std::env::var(name).ok()))
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 用变量查找函数覆盖配置项
    ///
    /// 无法解析的值保留原配置并输出警告
    pub fn overlay_env(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_base_url: lookup("SIGSECURE_API_BASE_URL").unwrap_or(self.api_base_url),
            input_path: lookup("SIGSECURE_INPUT").or(self.input_path),
            output_dir: lookup("SIGSECURE_OUTPUT_DIR").unwrap_or(self.output_dir),
            privacy_mode: parse_or("PRIVACY_MODE", lookup("PRIVACY_MODE"), self.privacy_mode),
            redaction_style: parse_or(
                "REDACTION_STYLE",
                lookup("REDACTION_STYLE"),
                self.redaction_style,
            ),
            highlight_only: parse_or("HIGHLIGHT_ONLY", lookup("HIGHLIGHT_ONLY"), self.highlight_only),
            request_timeout_secs: match lookup("REQUEST_TIMEOUT_SECS") {
                Some(raw) => match raw.parse::<u64>() {
                    Ok(0) => None,
                    Ok(secs) => Some(secs),
                    Err(_) => {
                        warn!("⚠️ REQUEST_TIMEOUT_SECS 无法解析: {}，不设置超时", raw);
                        self.request_timeout_secs
                    }
                },
                None => self.request_timeout_secs,
            },
            verbose_logging: parse_or("VERBOSE_LOGGING", lookup("VERBOSE_LOGGING"), self.verbose_logging),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.api_base_url.clone()));
        }
        if self.input_path.as_deref().map_or(true, |p| p.trim().is_empty()) {
            return Err(ConfigError::MissingInput);
        }
        Ok(())
    }

    /// 默认的转换参数
    pub fn default_parameters(&self) -> TransformParameters {
        TransformParameters {
            privacy_mode: self.privacy_mode,
            redaction_style: self.redaction_style,
            highlight_only: self.highlight_only,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_or<T: FromStr>(var_name: &str, raw: Option<String>, fallback: T) -> T {
    match raw {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("⚠️ 环境变量 {} 的值 '{}' 无效，使用默认值", var_name, value);
                fallback
            }
        },
        None => fallback,
    }
}
