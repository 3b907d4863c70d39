//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是命令行程序的入口，负责把一个或多个 PDF 依次交给工作流。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、初始化报告文件、创建客户端、检查服务
//! 2. **收集输入**：单个文件，或目录下所有 `.pdf`（按文件名排序）
//! 3. **串行提交**：上一个提交结束后才开始下一个
//! 4. **保存结果**：通过成功通知的下载动作写入输出目录
//! 5. **全局统计**：汇总结果并打印审计日志

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{error, info, warn};

use crate::clients::SigSecureClient;
use crate::config::Config;
use crate::models::Document;
use crate::orchestrator::WorkflowShell;
use crate::utils::logging::{
    append_log_line, init_log_file, log_documents_loaded, log_startup, print_final_stats,
    truncate_text,
};
use crate::workflow::{Notification, SubmitOutcome};

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

/// 应用主结构
pub struct App {
    config: Config,
    client: Arc<SigSecureClient>,
    shell: WorkflowShell<SigSecureClient>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        // 初始化报告文件
        init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", config.output_log_file))?;

        log_startup(&config);

        let client = Arc::new(SigSecureClient::new(&config)?);
        match client.health().await {
            Ok(status) => info!("✓ 服务在线: {}", status),
            Err(e) => warn!("⚠️ 健康检查失败，继续尝试提交: {}", e),
        }

        let shell = WorkflowShell::new(client.clone(), config.default_parameters());

        Ok(Self {
            config,
            client,
            shell,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        self.shell.mount().await;

        let input = self.config.input_path.clone().unwrap_or_default();
        let documents = collect_inputs(Path::new(&input)).await?;

        if documents.is_empty() {
            warn!("⚠️ 没有找到待处理的 PDF 文件，程序结束");
            return Ok(());
        }

        log_documents_loaded(documents.len());

        let mut stats = ProcessingStats {
            total: documents.len(),
            ..Default::default()
        };

        for (idx, path) in documents.iter().enumerate() {
            let index = idx + 1;
            match self.process_document(index, path).await {
                Ok(true) => stats.success += 1,
                Ok(false) => stats.failed += 1,
                Err(e) => {
                    error!("[文档 {}] ❌ 处理过程中发生错误: {}", index, e);
                    self.report(&format!("{} ❌ {}", path.display(), e));
                    stats.failed += 1;
                }
            }
        }

        self.print_audit_log();
        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );

        self.shell.reset();
        self.shell.teardown();
        info!("🔌 已断开 {}", self.client.base_url());
        Ok(())
    }

    /// 处理单个文档
    ///
    /// # 返回
    /// 返回是否转换成功
    async fn process_document(&mut self, index: usize, path: &Path) -> Result<bool> {
        info!("\n{}", "─".repeat(60));
        info!("[文档 {}] {}", index, path.display());

        let document = Document::load(path).await?;
        if !document.has_pdf_signature() {
            warn!("[文档 {}] ⚠️ 文件头不是 %PDF，仍然提交", index);
        }
        let original = self.shell.select_document(document);
        info!(
            "[文档 {}] {}: {}",
            index,
            self.shell.preview().original_title(),
            original.url()
        );

        let params = self.shell.params();
        info!(
            "[文档 {}] {} ({} / {})",
            index,
            params.action_label(),
            params.privacy_mode.label(),
            params.redaction_style.label()
        );
        let outcome = self.shell.submit().await;
        let succeeded = match outcome {
            SubmitOutcome::Succeeded(_) => {
                self.save_result(index, path).await?;
                true
            }
            SubmitOutcome::Failed(err) => {
                let message = truncate_text(&err.user_message(), 200);
                error!("[文档 {}] ❌ {}", index, message);
                self.report(&format!("{} ❌ {}", path.display(), message));
                false
            }
            SubmitOutcome::Rejected(reason) => {
                warn!("[文档 {}] ⚠️ 提交被拒绝: {}", index, reason);
                false
            }
        };

        Ok(succeeded)
    }

    /// 展示成功摘要并保存结果
    async fn save_result(&mut self, index: usize, path: &Path) -> Result<()> {
        let Notification::Success(notice) = self.shell.notifications().current().clone() else {
            warn!("[文档 {}] ⚠️ 没有成功通知，跳过保存", index);
            return Ok(());
        };

        match &notice.summary {
            Some(summary) => {
                for line in summary.lines() {
                    info!("[文档 {}]   {}", index, line);
                }
            }
            None => info!("[文档 {}]   (审计摘要不可用)", index),
        }

        info!(
            "[文档 {}] {}: {}",
            index,
            self.shell
                .preview()
                .result_title(self.shell.params().highlight_only),
            notice.download.handle().url()
        );

        let output_dir = PathBuf::from(&self.config.output_dir);
        let saved = notice
            .download
            .save_to(self.shell.registry(), &output_dir)
            .await?;
        self.shell.notifications_mut().dismiss();

        let signatures = notice
            .summary
            .as_ref()
            .map(|s| s.signatures_detected.to_string())
            .unwrap_or_else(|| "?".to_string());
        self.report(&format!(
            "{} ✅ -> {} (signatures: {})",
            path.display(),
            saved.display(),
            signatures
        ));
        Ok(())
    }

    /// 打印审计日志（最新的在前）
    fn print_audit_log(&self) {
        let entries = self.shell.audit_log().newest_first();
        let failures = entries.iter().filter(|e| e.is_failure()).count();
        let redacted: u64 = entries.iter().map(|e| e.total_entities()).sum();
        info!("\n{}", "=".repeat(60));
        info!(
            "📋 审计日志 ({} 条，失败 {} 条，累计处理实体 {} 个)",
            entries.len(),
            failures,
            redacted
        );
        info!("{}", "=".repeat(60));
        for entry in entries {
            info!("{}", entry);
        }
    }

    fn report(&self, line: &str) {
        if let Err(e) = append_log_line(&self.config.output_log_file, line) {
            warn!("⚠️ 写入日志文件失败: {}", e);
        }
    }
}

/// 收集待处理的 PDF
///
/// 单个文件直接返回；目录返回其中所有 `.pdf`，按文件名排序
pub async fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(input)
        .await
        .with_context(|| format!("输入路径不存在: {}", input.display()))?;

    if metadata.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut documents = Vec::new();
    let mut entries = fs::read_dir(input)
        .await
        .with_context(|| format!("无法读取文件夹: {}", input.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}
