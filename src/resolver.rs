// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 字典解析门面
//!
//! UI 组件和业务封装只通过 [`DictResolver`] 访问字典：
//!
//! ```no_run
//! # use std::collections::HashMap;
//! # use std::sync::Arc;
//! # use dictcache::{DictMeta, DictResolver, HttpDictFetcher};
//! # async fn demo() -> Result<(), dictcache::DictError> {
//! let fetcher = HttpDictFetcher::new("http://127.0.0.1:8000", std::time::Duration::from_secs(5))?;
//! let resolver = DictResolver::new();
//! let mut metas = HashMap::new();
//! metas.insert("*".to_string(), DictMeta::with_default_fields(Arc::new(fetcher)));
//! resolver.configure(metas);
//!
//! let sexes = resolver.resolve("sys_user_sex").await?;
//! let label = resolver.label_for("sys_user_sex", "1").await?;
//! # Ok(())
//! # }
//! ```
//!
//! 进程级的单例通过 [`install`] / [`installed`] 管理。

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::future::try_join_all;
use lazy_static::lazy_static;
use log::{debug, info};

use crate::cache::{normalize, DictCache, DictEntry};
use crate::config::Config;
use crate::exception::DictError;
use crate::fetcher::HttpDictFetcher;
use crate::meta::{DictMeta, DictMetaRegistry};
use crate::param::{DEFAULT_CACHE_SIZE, WILDCARD};

pub struct DictResolver {
    registry: Arc<DictMetaRegistry>,
    cache: DictCache,
}

impl Default for DictResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DictResolver {
    pub fn new() -> Self {
        Self::with_cache_options(DEFAULT_CACHE_SIZE, None)
    }

    pub fn with_cache_options(capacity: usize, ttl: Option<Duration>) -> Self {
        let registry = Arc::new(DictMetaRegistry::new());
        let cache = DictCache::new(Arc::clone(&registry), capacity, ttl);
        Self { registry, cache }
    }

    /// 根据配置文件构造：`"*"` 默认规则指向后台的 HTTP 接口。
    pub fn from_config(config: &Config) -> Result<Self, DictError> {
        let fetcher = HttpDictFetcher::new(config.base_url(), config.request_timeout())?;
        let resolver = Self::with_cache_options(config.cache_size(), config.ttl());
        resolver.register(
            WILDCARD,
            DictMeta::new(config.label_field(), config.value_field(), Arc::new(fetcher)),
        );
        Ok(resolver)
    }

    /// 一次性安装多条规则。
    pub fn configure(&self, metas: HashMap<String, DictMeta>) {
        for (pattern, meta) in metas {
            self.register(&pattern, meta);
        }
    }

    /// 注册规则并让受影响的缓存失效；`"*"` 会影响所有类型。
    pub fn register(&self, pattern: &str, meta: DictMeta) {
        info!(
            "注册字典规则 {} -> label: {}, value: {}",
            pattern, meta.label_field, meta.value_field
        );
        self.registry.register(pattern, meta);
        self.cache.invalidate(pattern);
    }

    pub fn unregister(&self, pattern: &str) -> Option<DictMeta> {
        let removed = self.registry.unregister(pattern);
        self.cache.invalidate(pattern);
        removed
    }

    pub async fn resolve(&self, dict_type: &str) -> Result<Arc<Vec<DictEntry>>, DictError> {
        self.cache.get(dict_type).await
    }

    /// 用调用方指定的字段重新投影已缓存的原始记录，不会额外发起拉取。
    pub async fn resolve_with(
        &self,
        dict_type: &str,
        label_field: &str,
        value_field: &str,
    ) -> Result<Vec<DictEntry>, DictError> {
        let records = self.cache.get_records(dict_type).await?;
        let (entries, warnings) = normalize(&records, label_field, value_field);
        if !warnings.is_empty() {
            debug!(
                "字典{}按 {}/{} 投影时跳过{}条记录",
                dict_type,
                label_field,
                value_field,
                warnings.len()
            );
        }
        Ok(entries)
    }

    /// 并发解析多个类型，结果与输入顺序一致；任一失败则整体失败。
    pub async fn resolve_many(
        &self,
        dict_types: &[&str],
    ) -> Result<Vec<Arc<Vec<DictEntry>>>, DictError> {
        try_join_all(dict_types.iter().map(|t| self.resolve(t))).await
    }

    /// 找不到对应键值时返回 `None`，这不是错误。
    pub async fn label_for(&self, dict_type: &str, value: &str) -> Result<Option<String>, DictError> {
        let entries = self.resolve(dict_type).await?;
        Ok(entries
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.label.clone()))
    }

    /// 翻译以分隔符连接的多个键值，例如 `"0,1"` → `"男,女"`。未知键值原样保留。
    pub async fn labels_for(
        &self,
        dict_type: &str,
        values: &str,
        separator: &str,
    ) -> Result<String, DictError> {
        if values.is_empty() {
            return Ok(String::new());
        }
        let entries = self.resolve(dict_type).await?;
        let labels: Vec<&str> = values
            .split(separator)
            .map(|value| {
                entries
                    .iter()
                    .find(|e| e.value == value)
                    .map_or(value, |e| e.label.as_str())
            })
            .collect();
        Ok(labels.join(separator))
    }

    pub async fn label_map(&self, dict_type: &str) -> Result<HashMap<String, String>, DictError> {
        let entries = self.resolve(dict_type).await?;
        Ok(entries
            .iter()
            .map(|e| (e.value.clone(), e.label.clone()))
            .collect())
    }

    /// 重置一个类型，或用 `"*"` 重置全部类型。
    pub fn invalidate(&self, dict_type: &str) {
        self.cache.invalidate(dict_type);
    }

    pub fn cache(&self) -> &DictCache {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<DictMetaRegistry> {
        &self.registry
    }
}

lazy_static! {
    static ref INSTALLED: RwLock<Option<Arc<DictResolver>>> = RwLock::new(None);
}

/// 设置进程级解析器，返回其共享句柄。再次调用会替换之前的实例。
pub fn install(resolver: DictResolver) -> Arc<DictResolver> {
    let resolver = Arc::new(resolver);
    let mut slot = INSTALLED.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(Arc::clone(&resolver));
    info!("字典解析器已安装");
    resolver
}

pub fn installed() -> Option<Arc<DictResolver>> {
    let slot = INSTALLED.read().unwrap_or_else(|e| e.into_inner());
    slot.clone()
}

/// 卸载进程级解析器并清空它的缓存。
pub fn uninstall() -> Option<Arc<DictResolver>> {
    let mut slot = INSTALLED.write().unwrap_or_else(|e| e.into_inner());
    let previous = slot.take();
    if let Some(resolver) = &previous {
        resolver.invalidate(WILDCARD);
    }
    previous
}
