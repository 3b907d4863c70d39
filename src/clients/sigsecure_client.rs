/// 转换服务 API 客户端
///
/// 封装所有与远端转换服务相关的 HTTP 调用
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::clients::TransformService;
use crate::config::Config;
use crate::error::{ConfigError, LogSyncError, SubmitError};
use crate::models::{AuditLogEntry, Document, TransformParameters, PDF_MEDIA_TYPE};

const UPLOAD_ENDPOINT: &str = "api/upload";
const AUDIT_LOG_ENDPOINT: &str = "api/audit_log";
const HEALTH_ENDPOINT: &str = "api/health";

/// 服务端错误响应体
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// 转换服务客户端
pub struct SigSecureClient {
    http: Client,
    base_url: String,
}

impl SigSecureClient {
    /// 创建新的客户端
    ///
    /// 配置了超时才会设置超时，默认一直等待服务返回
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            debug!("请求超时设置为 {:?}", timeout);
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ConfigError::HttpClient)?;
        Ok(Self::with_client(http, &config.api_base_url))
    }

    /// 使用现成的 reqwest 客户端
    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// 检查服务是否在线，返回服务端的状态描述
    pub async fn health(&self) -> anyhow::Result<String> {
        let response = self
            .http
            .get(self.endpoint(HEALTH_ENDPOINT))
            .send()
            .await?
            .error_for_status()?;
        let body: HealthBody = response.json().await?;
        Ok(body.status)
    }

    fn build_form(
        document: &Document,
        params: &TransformParameters,
    ) -> Result<Form, SubmitError> {
        let file_part = Part::bytes(document.bytes().to_vec())
            .file_name(document.name().to_string())
            .mime_str(PDF_MEDIA_TYPE)
            .map_err(SubmitError::transport)?;

        let mut form = Form::new().part("file", file_part);
        for (name, value) in params.form_fields() {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

/// 把非 2xx 响应体转换成提交错误
///
/// 能解析出 `error` 字段就原样展示，解析失败按网络错误处理
pub(crate) fn classify_failure(status: StatusCode, body: &[u8]) -> SubmitError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(message),
        }) if !message.trim().is_empty() => SubmitError::Service {
            status: status.as_u16(),
            message,
        },
        // 没有 error 字段或内容为空
        Ok(_) => SubmitError::Service {
            status: status.as_u16(),
            message: "Upload failed".to_string(),
        },
        Err(e) => SubmitError::transport(e),
    }
}

#[async_trait]
impl TransformService for SigSecureClient {
    async fn upload(
        &self,
        document: &Document,
        params: &TransformParameters,
    ) -> Result<Vec<u8>, SubmitError> {
        let form = Self::build_form(document, params)?;
        debug!(
            "POST {} file={} ({} bytes) {}",
            UPLOAD_ENDPOINT,
            document.name(),
            document.len(),
            params
        );

        let response = self
            .http
            .post(self.endpoint(UPLOAD_ENDPOINT))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("上传请求失败: {}", e);
                SubmitError::transport(e)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(SubmitError::transport)?;

        if status.is_success() {
            debug!("上传成功，返回 {} bytes", body.len());
            Ok(body.to_vec())
        } else {
            let err = classify_failure(status, &body);
            warn!("上传被服务拒绝 (HTTP {}): {}", status.as_u16(), err);
            Err(err)
        }
    }

    async fn fetch_audit_log(&self) -> Result<Vec<AuditLogEntry>, LogSyncError> {
        let response = self
            .http
            .get(self.endpoint(AUDIT_LOG_ENDPOINT))
            .send()
            .await
            .map_err(LogSyncError::Request)?;

        let status = response.status();
        let body = response.bytes().await.map_err(LogSyncError::Request)?;
        if !status.is_success() {
            return Err(LogSyncError::BadStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let entries: Vec<AuditLogEntry> = serde_json::from_slice(&body)?;
        debug!("审计日志共 {} 条", entries.len());
        Ok(entries)
    }
}
