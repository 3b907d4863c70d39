//! 审计日志条目
//!
//! 服务端写入的条目并不完全规整：`entities_redacted` 可能只是一个整数总数
//! （失败记录里是 0），旧记录没有 `highlight_only` 字段，`error` 可能是 null。
//! 解析时全部兼容。

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// 服务端只给出总数时使用的统计键
pub const TOTAL_ENTITIES_KEY: &str = "TOTAL";

/// 一条审计记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: String,
    pub file: String,
    /// 服务端原样记录，失败时可能是 "unknown"
    #[serde(default)]
    pub privacy_mode: String,
    #[serde(default)]
    pub redaction_style: String,
    #[serde(default)]
    pub signatures_detected: u64,
    #[serde(default, deserialize_with = "deserialize_entity_counts")]
    pub entities_redacted: BTreeMap<String, u64>,
    #[serde(default)]
    pub highlight_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditLogEntry {
    /// 解析 ISO-8601 时间戳（服务端不带时区）
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }

    /// 实体统计，格式如 `SIGNER: 1, DATE: 2`
    pub fn entities_summary(&self) -> String {
        if self.entities_redacted.is_empty() {
            return "None".to_string();
        }
        self.entities_redacted
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn total_entities(&self) -> u64 {
        self.entities_redacted.values().sum()
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

impl fmt::Display for AuditLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = self
            .parsed_timestamp()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.timestamp.clone());
        write!(
            f,
            "{} - {} | Mode: {} | Style: {} | Signatures: {} | Entities: {} | Highlight: {}",
            when,
            self.file,
            self.privacy_mode,
            self.redaction_style,
            self.signatures_detected,
            self.entities_summary(),
            if self.highlight_only { "Yes" } else { "No" }
        )?;
        if let Some(err) = &self.error {
            // 服务端会附带完整堆栈，只取第一行
            write!(f, " | Error: {}", err.lines().next().unwrap_or_default())?;
        }
        Ok(())
    }
}

// 实体统计既可能是对象也可能是整数总数，非零总数记在 TOTAL 下
fn deserialize_entity_counts<'de, D>(deserializer: D) -> Result<BTreeMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{MapAccess, Visitor};

    struct EntityCountsVisitor;

    impl<'de> Visitor<'de> for EntityCountsVisitor {
        type Value = BTreeMap<String, u64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of entity type to count, or an integer")
        }

        fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut counts = BTreeMap::new();
            while let Some((kind, count)) = access.next_entry::<String, u64>()? {
                counts.insert(kind, count);
            }
            Ok(counts)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let mut counts = BTreeMap::new();
            if value > 0 {
                counts.insert(TOTAL_ENTITIES_KEY.to_string(), value);
            }
            Ok(counts)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            // 负数没有意义，按没有统计处理
            self.visit_u64(u64::try_from(value).unwrap_or(0))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(BTreeMap::new())
        }
    }

    deserializer.deserialize_any(EntityCountsVisitor)
}
