// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了字典解析与缓存过程中可能出现的各类错误。
//!
//! ## 设计意图
//! - **错误分类**：区分配置缺失、传输失败以及字典类型名非法三类情况。
//! - **可共享**：同一个 Pending 槽位的所有等待者必须收到完全相同的错误，因此错误类型实现了 `Clone`。
//! - **字段缺失不是错误**：原始记录缺少标签/键值字段时只记录警告并跳过，见 [`NormalizationWarning`]。

use std::fmt;

/// 字典解析过程中发生的错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictError {
    /// 既没有为该字典类型注册精确规则，也没有注册 `"*"` 默认规则。
    /// 对本次调用而言不可恢复。
    Configuration { dict_type: String },
    /// 底层拉取失败（网络错误、HTTP 状态码异常、后端返回非 200 业务码等）。
    /// 缓存槽位会被重置为 Empty，下一次调用会自动重试。
    Transport(String),
    /// 字典类型名无法用于后端路由（例如包含 `/` 或空白字符）。
    InvalidDictType(String),
}

use DictError::*;

impl DictError {
    pub fn transport(message: impl Into<String>) -> Self {
        Transport(message.into())
    }

    /// 只有传输错误值得重试，配置错误重试多少次结果都一样。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Transport(_))
    }
}

impl fmt::Display for DictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Configuration { dict_type } => write!(
                f,
                "No dictionary meta registered for type '{}' and no '*' default",
                dict_type
            ),
            Transport(msg) => write!(f, "Failed to fetch dictionary data: {}", msg),
            InvalidDictType(t) => write!(f, "Invalid dictionary type name: '{}'", t),
        }
    }
}

impl std::error::Error for DictError {}

impl From<reqwest::Error> for DictError {
    fn from(e: reqwest::Error) -> Self {
        Transport(e.to_string())
    }
}

/// 规范化原始记录时产生的非致命警告。
///
/// 对应的记录会被跳过，整体解析依旧成功。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizationWarning {
    /// 记录缺少配置的字段（或字段值不是标量）。
    MissingField { index: usize, field: String },
    /// 记录的键值与前面某条记录重复，保留先出现的那条。
    DuplicateValue { index: usize, value: String },
}

impl fmt::Display for NormalizationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationWarning::MissingField { index, field } => {
                write!(f, "record #{} has no usable field '{}'", index, field)
            }
            NormalizationWarning::DuplicateValue { index, value } => {
                write!(f, "record #{} repeats value '{}'", index, value)
            }
        }
    }
}
