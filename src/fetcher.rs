// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 字典数据拉取模块
//!
//! `DictFetcher` 是缓存层唯一的 I/O 边界：给定字典类型名，异步返回后端记录列表。
//! 本模块不做任何缓存，也不做重试。
//!
//! 提供两种实现：
//! - [`FnFetcher`]：把任意异步闭包包装成拉取器，便于按类型定制请求方式。
//! - [`HttpDictFetcher`]：请求后端 `GET /system/dict/data/type/{dict_type}/` 并解开响应信封。

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use reqwest::{header::ACCEPT, Client};
use serde_derive::Deserialize;
use serde_json::Value;

use crate::exception::DictError;
use crate::param::{is_valid_dict_type, DICT_DATA_BY_TYPE_PATH, SUCCESS_CODE};

/// 后端返回的一条原始记录，字段形态由后端决定，在缓存层统一规范化。
pub type RawRecord = serde_json::Map<String, Value>;

/// 按字典类型拉取原始记录。
///
/// 失败时返回 [`DictError::Transport`]。调用方（缓存层）不会自动重试。
#[async_trait]
pub trait DictFetcher: Send + Sync {
    async fn fetch(&self, dict_type: &str) -> Result<Vec<RawRecord>, DictError>;
}

/// 以异步闭包实现的拉取器。
pub struct FnFetcher<F> {
    f: F,
}

impl<F, Fut> FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<RawRecord>, DictError>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> DictFetcher for FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<RawRecord>, DictError>> + Send + 'static,
{
    async fn fetch(&self, dict_type: &str) -> Result<Vec<RawRecord>, DictError> {
        (self.f)(dict_type.to_string()).await
    }
}

/// 通过 HTTP 向管理后台请求字典数据。
pub struct HttpDictFetcher {
    client: Client,
    base_url: String,
}

impl HttpDictFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DictError> {
        let client = Client::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, dict_type: &str) -> String {
        format!("{}{}{}/", self.base_url, DICT_DATA_BY_TYPE_PATH, dict_type)
    }
}

#[async_trait]
impl DictFetcher for HttpDictFetcher {
    async fn fetch(&self, dict_type: &str) -> Result<Vec<RawRecord>, DictError> {
        if !is_valid_dict_type(dict_type) {
            return Err(DictError::InvalidDictType(dict_type.to_string()));
        }
        let url = self.url_for(dict_type);
        debug!("请求字典数据：{}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DictError::transport(format!(
                "GET {} returned HTTP {}",
                url, status
            )));
        }
        let body: Bytes = response.bytes().await?;
        debug!("字典{}响应体长度：{}", dict_type, body.len());
        parse_envelope(&body)
    }
}

/// 后端统一响应信封：`{"code": 200, "msg": "ok", "data": [...]}`
#[derive(Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<Value>,
}

/// 解开响应信封，取出 `data` 数组中的记录。
///
/// 业务码不是 200（例如字典类型不存在）或 `data` 不是数组时返回传输错误；
/// 数组中不是对象的元素会被跳过。
pub fn parse_envelope(body: &[u8]) -> Result<Vec<RawRecord>, DictError> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| DictError::transport(format!("malformed response body: {}", e)))?;
    if envelope.code != SUCCESS_CODE {
        return Err(DictError::transport(format!(
            "backend answered code {}: {}",
            envelope.code, envelope.msg
        )));
    }
    let items = match envelope.data {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(DictError::transport(
                "response has no 'data' array".to_string(),
            ))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(record) => records.push(record),
            other => warn!("响应中第{}项不是对象，已跳过：{}", index, other),
        }
    }
    Ok(records)
}
