//! 转换参数
//!
//! 隐私模式、遮盖样式和"只高亮"开关，提交时作为快照交给流程层

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 隐私模式：决定保护哪一类签名/实体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyMode {
    #[default]
    None,
    Signer,
    Witness,
    Medical,
}

impl PrivacyMode {
    pub const ALL: [PrivacyMode; 4] = [
        PrivacyMode::None,
        PrivacyMode::Signer,
        PrivacyMode::Witness,
        PrivacyMode::Medical,
    ];

    /// 表单字段中的取值
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyMode::None => "none",
            PrivacyMode::Signer => "signer",
            PrivacyMode::Witness => "witness",
            PrivacyMode::Medical => "medical",
        }
    }

    /// 界面上的显示名称
    pub fn label(&self) -> &'static str {
        match self {
            PrivacyMode::None => "No Privacy",
            PrivacyMode::Signer => "Signer Privacy",
            PrivacyMode::Witness => "Witness Privacy",
            PrivacyMode::Medical => "Medical Mode",
        }
    }
}

impl fmt::Display for PrivacyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrivacyMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("未知的隐私模式: {}", s))
    }
}

/// 遮盖样式：黑框、模糊或水印
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactionStyle {
    #[default]
    Black,
    Blur,
    Watermark,
}

impl RedactionStyle {
    pub const ALL: [RedactionStyle; 3] = [
        RedactionStyle::Black,
        RedactionStyle::Blur,
        RedactionStyle::Watermark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RedactionStyle::Black => "black",
            RedactionStyle::Blur => "blur",
            RedactionStyle::Watermark => "watermark",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RedactionStyle::Black => "Black Box",
            RedactionStyle::Blur => "Blur",
            RedactionStyle::Watermark => "Watermark",
        }
    }
}

impl fmt::Display for RedactionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedactionStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RedactionStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("未知的遮盖样式: {}", s))
    }
}

/// 一次提交使用的转换参数
///
/// `Copy` 值对象：提交时复制一份，之后界面上的修改不会影响进行中的请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformParameters {
    pub privacy_mode: PrivacyMode,
    pub redaction_style: RedactionStyle,
    pub highlight_only: bool,
}

impl TransformParameters {
    /// 编码为表单字段（布尔值使用字符串形式）
    pub fn form_fields(&self) -> [(&'static str, String); 3] {
        [
            ("privacy_mode", self.privacy_mode.as_str().to_string()),
            ("redaction_style", self.redaction_style.as_str().to_string()),
            ("highlight_only", self.highlight_only.to_string()),
        ]
    }

    /// 提交按钮上的动作名
    pub fn action_label(&self) -> &'static str {
        if self.highlight_only {
            "Highlight"
        } else {
            "Redact"
        }
    }
}

impl fmt::Display for TransformParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mode={} style={} highlight_only={}",
            self.privacy_mode, self.redaction_style, self.highlight_only
        )
    }
}
