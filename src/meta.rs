// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 字典元数据注册表
//!
//! 记录每个字典类型（或 `"*"` 默认规则）的字段映射：原始记录中哪个字段作为标签、
//! 哪个字段作为键值，以及用哪个拉取器获取数据。这里只是一张查找表，不涉及网络和缓存。

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::exception::DictError;
use crate::fetcher::DictFetcher;
use crate::param::{DEFAULT_LABEL_FIELD, DEFAULT_VALUE_FIELD, WILDCARD};

/// 一条映射规则。
#[derive(Clone)]
pub struct DictMeta {
    pub label_field: String,
    pub value_field: String,
    pub fetcher: Arc<dyn DictFetcher>,
}

impl DictMeta {
    pub fn new(label_field: &str, value_field: &str, fetcher: Arc<dyn DictFetcher>) -> Self {
        Self {
            label_field: label_field.to_string(),
            value_field: value_field.to_string(),
            fetcher,
        }
    }

    /// 使用 `dict_label` / `dict_value` 字段的规则
    pub fn with_default_fields(fetcher: Arc<dyn DictFetcher>) -> Self {
        Self::new(DEFAULT_LABEL_FIELD, DEFAULT_VALUE_FIELD, fetcher)
    }
}

impl fmt::Debug for DictMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictMeta")
            .field("label_field", &self.label_field)
            .field("value_field", &self.value_field)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct DictMetaRegistry {
    metas: RwLock<HashMap<String, DictMeta>>,
}

impl DictMetaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 安装规则，重复注册同一个键时后写入者生效。
    pub fn register(&self, pattern: &str, meta: DictMeta) {
        let mut metas = self.metas.write().unwrap_or_else(|e| e.into_inner());
        metas.insert(pattern.to_string(), meta);
    }

    pub fn unregister(&self, pattern: &str) -> Option<DictMeta> {
        let mut metas = self.metas.write().unwrap_or_else(|e| e.into_inner());
        metas.remove(pattern)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        let metas = self.metas.read().unwrap_or_else(|e| e.into_inner());
        metas.contains_key(pattern)
    }

    pub fn len(&self) -> usize {
        let metas = self.metas.read().unwrap_or_else(|e| e.into_inner());
        metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 先找精确规则，再退回 `"*"`；都没有时返回配置错误。
    pub fn resolve_meta(&self, dict_type: &str) -> Result<DictMeta, DictError> {
        let metas = self.metas.read().unwrap_or_else(|e| e.into_inner());
        metas
            .get(dict_type)
            .or_else(|| metas.get(WILDCARD))
            .cloned()
            .ok_or_else(|| DictError::Configuration {
                dict_type: dict_type.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FnFetcher, RawRecord};

    fn empty_fetcher() -> Arc<dyn DictFetcher> {
        Arc::new(FnFetcher::new(|_t: String| async { Ok(Vec::<RawRecord>::new()) }))
    }

    #[test]
    fn test_exact_match_wins_over_wildcard() {
        let registry = DictMetaRegistry::new();
        registry.register(WILDCARD, DictMeta::with_default_fields(empty_fetcher()));
        registry.register("sys_user_sex", DictMeta::new("name", "code", empty_fetcher()));

        let exact = registry.resolve_meta("sys_user_sex").unwrap();
        assert_eq!(exact.label_field, "name");
        assert_eq!(exact.value_field, "code");

        let fallback = registry.resolve_meta("sys_normal_disable").unwrap();
        assert_eq!(fallback.label_field, DEFAULT_LABEL_FIELD);
        assert_eq!(fallback.value_field, DEFAULT_VALUE_FIELD);
    }

    #[test]
    fn test_missing_rule_is_configuration_error() {
        let registry = DictMetaRegistry::new();
        registry.register("a", DictMeta::with_default_fields(empty_fetcher()));
        let err = registry.resolve_meta("b").unwrap_err();
        assert_eq!(
            err,
            DictError::Configuration {
                dict_type: "b".to_string()
            }
        );
    }

    #[test]
    fn test_last_write_wins() {
        let registry = DictMetaRegistry::new();
        registry.register(WILDCARD, DictMeta::new("l1", "v1", empty_fetcher()));
        registry.register(WILDCARD, DictMeta::new("l2", "v2", empty_fetcher()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve_meta("x").unwrap().label_field, "l2");
    }

    #[test]
    fn test_unregister_default() {
        let registry = DictMetaRegistry::new();
        registry.register(WILDCARD, DictMeta::with_default_fields(empty_fetcher()));
        assert!(registry.unregister(WILDCARD).is_some());
        assert!(registry.is_empty());
        assert!(registry.resolve_meta("x").is_err());
    }
}
