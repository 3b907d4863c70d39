//! 预览句柄登记表 - 基础设施层
//!
//! 持有唯一的二进制预览资源，只暴露"创建 / 回收 / 读取"能力

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::HandleError;

/// 句柄角色：原始文档或转换结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleRole {
    Original,
    Result,
}

impl HandleRole {
    pub const ALL: [HandleRole; 2] = [HandleRole::Original, HandleRole::Result];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandleRole::Original => "original",
            HandleRole::Result => "result",
        }
    }

    fn slot(&self) -> usize {
        match self {
            HandleRole::Original => 0,
            HandleRole::Result => 1,
        }
    }
}

impl fmt::Display for HandleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 本地可回收的预览句柄
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayHandle {
    id: u64,
    role: HandleRole,
}

impl DisplayHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn role(&self) -> HandleRole {
        self.role
    }

    /// 类似 object URL 的字符串形式
    pub fn url(&self) -> String {
        format!("blob:sigsecure/{}/{}", self.role, self.id)
    }
}

/// 资源计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    pub created: u64,
    pub revoked: u64,
}

impl HandleStats {
    pub fn live(&self) -> u64 {
        self.created - self.revoked
    }
}

#[derive(Debug, Default)]
struct HandleTable {
    next_id: u64,
    blobs: HashMap<u64, Arc<[u8]>>,
    slots: [Option<DisplayHandle>; 2],
    stats: HandleStats,
}

impl HandleTable {
    fn drop_blob(&mut self, id: u64) -> bool {
        if self.blobs.remove(&id).is_some() {
            self.stats.revoked += 1;
            true
        } else {
            false
        }
    }
}

/// 预览句柄登记表
///
/// 职责：
/// - 每个角色同时最多一个存活句柄
/// - 安装新句柄时在同一临界区内回收旧句柄
/// - 读取已回收的句柄直接报错，不返回空内容
/// - 被丢弃时回收全部句柄
#[derive(Debug, Default)]
pub struct HandleRegistry {
    table: Mutex<HandleTable>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HandleTable> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 为角色安装新内容，旧句柄同时被回收
    pub fn install(&self, role: HandleRole, bytes: impl Into<Arc<[u8]>>) -> DisplayHandle {
        let mut table = self.table();
        table.next_id += 1;
        let handle = DisplayHandle {
            id: table.next_id,
            role,
        };
        table.blobs.insert(handle.id, bytes.into());
        table.stats.created += 1;

        if let Some(previous) = table.slots[role.slot()].replace(handle.clone()) {
            table.drop_blob(previous.id);
            debug!("回收旧句柄 {} -> 新句柄 {}", previous.url(), handle.url());
        } else {
            debug!("创建句柄 {}", handle.url());
        }
        handle
    }

    /// 回收指定句柄，已回收的句柄忽略
    pub fn revoke(&self, handle: &DisplayHandle) {
        let mut table = self.table();
        let slot = &mut table.slots[handle.role.slot()];
        if slot.as_ref() == Some(handle) {
            *slot = None;
        }
        if !table.drop_blob(handle.id) {
            debug!("句柄 {} 已经被回收", handle.url());
        }
    }

    /// 回收某个角色当前的句柄
    pub fn release(&self, role: HandleRole) -> Option<DisplayHandle> {
        let mut table = self.table();
        let previous = table.slots[role.slot()].take()?;
        table.drop_blob(previous.id);
        debug!("回收句柄 {}", previous.url());
        Some(previous)
    }

    /// 回收所有句柄
    pub fn release_all(&self) {
        for role in HandleRole::ALL {
            self.release(role);
        }
        // 正常情况下不会有游离的 blob，这里兜底清空
        let mut table = self.table();
        let orphans: Vec<u64> = table.blobs.keys().copied().collect();
        for id in orphans {
            table.drop_blob(id);
        }
    }

    /// 读取句柄内容
    pub fn resolve(&self, handle: &DisplayHandle) -> Result<Arc<[u8]>, HandleError> {
        self.table()
            .blobs
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| HandleError::Revoked { url: handle.url() })
    }

    /// 某个角色当前存活的句柄
    pub fn current(&self, role: HandleRole) -> Option<DisplayHandle> {
        self.table().slots[role.slot()].clone()
    }

    pub fn is_live(&self, handle: &DisplayHandle) -> bool {
        self.table().blobs.contains_key(&handle.id)
    }

    pub fn live_count(&self) -> usize {
        self.table().blobs.len()
    }

    pub fn stats(&self) -> HandleStats {
        self.table().stats
    }
}

impl Drop for HandleRegistry {
    fn drop(&mut self) {
        let live = self.live_count();
        if live > 0 {
            debug!("登记表销毁，回收 {} 个句柄", live);
            self.release_all();
        }
    }
}
