// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 字典缓存
//!
//! 以字典类型为键，缓存规范化后的 `{label, value}` 列表。每个类型对应一个槽位：
//! Empty → Pending → Ready。
//!
//! - Ready：直接返回，不产生 I/O。
//! - Pending：所有并发调用者等待同一个共享 future，保证同一类型同一时刻只有一次拉取。
//! - Empty：解析元数据、发起拉取、规范化、写入 Ready。
//!
//! 拉取失败时槽位回到 Empty，所有等待者收到同一个错误。`invalidate` 总是优先：
//! 失效之前发起、失效之后才完成的拉取结果会被丢弃。
//!
//! Ready 槽位放在 LRU 中，超过容量时最久未使用的类型被淘汰；可选的 TTL 让过期槽位视同 Empty。

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local};
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, error, info, warn};
use lru::LruCache;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use crate::exception::{DictError, NormalizationWarning};
use crate::fetcher::RawRecord;
use crate::meta::{DictMeta, DictMetaRegistry};
use crate::param::{DEFAULT_CACHE_SIZE, WILDCARD};

/// 一个可枚举选项。`value` 是机器值，`label` 是展示文本。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub label: String,
    pub value: String,
}

impl DictEntry {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// 槽位状态的只读视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSlot {
    Empty,
    Pending,
    Ready {
        entries: usize,
        fetched_at: DateTime<Local>,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// 命中 Ready 槽位的次数
    pub hits: u64,
    /// 未命中次数，包括加入已有 Pending 的调用
    pub misses: u64,
    /// 实际发起的拉取次数
    pub fetches: u64,
    pub failures: u64,
    pub ready: usize,
    pub pending: usize,
}

/// 一次拉取的完整结果。原始记录随之保留，用于按调用覆盖字段时重新投影。
#[derive(Clone)]
struct Resolved {
    entries: Arc<Vec<DictEntry>>,
    records: Arc<Vec<RawRecord>>,
}

type SharedFetch = Shared<BoxFuture<'static, Result<Resolved, DictError>>>;

struct ReadySlot {
    resolved: Resolved,
    fetched_at: DateTime<Local>,
}

struct PendingSlot {
    generation: u64,
    future: SharedFetch,
}

struct CacheState {
    ready: LruCache<String, ReadySlot>,
    pending: HashMap<String, PendingSlot>,
    next_generation: u64,
}

impl CacheState {
    // 取出未过期的 Ready 结果；过期的顺手移除
    fn take_fresh(&mut self, dict_type: &str, ttl: Option<chrono::Duration>) -> Option<Resolved> {
        let expired = match self.ready.get(dict_type) {
            None => return None,
            Some(slot) => match ttl {
                Some(ttl) => Local::now().signed_duration_since(slot.fetched_at) > ttl,
                None => false,
            },
        };
        if expired {
            debug!("字典{}已超过有效期，重新拉取", dict_type);
            self.ready.pop(dict_type);
            return None;
        }
        self.ready.get(dict_type).map(|slot| slot.resolved.clone())
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
}

pub struct DictCache {
    registry: Arc<DictMetaRegistry>,
    state: Arc<Mutex<CacheState>>,
    counters: Arc<Counters>,
    ttl: Option<chrono::Duration>,
}

impl DictCache {
    /// `capacity` 是 Ready 槽位的上限，为 0 时使用默认值；`ttl` 为 `None` 时永不过期。
    pub fn new(registry: Arc<DictMetaRegistry>, capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = match NonZeroUsize::new(capacity) {
            Some(c) => c,
            None => {
                warn!("字典缓存容量被设置为0，改用默认值{}", DEFAULT_CACHE_SIZE);
                NonZeroUsize::new(DEFAULT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN)
            }
        };
        let ttl = ttl.and_then(|t| chrono::Duration::from_std(t).ok());
        Self {
            registry,
            state: Arc::new(Mutex::new(CacheState {
                ready: LruCache::new(capacity),
                pending: HashMap::new(),
                next_generation: 0,
            })),
            counters: Arc::new(Counters::default()),
            ttl,
        }
    }

    pub fn with_registry(registry: Arc<DictMetaRegistry>) -> Self {
        Self::new(registry, DEFAULT_CACHE_SIZE, None)
    }

    pub fn registry(&self) -> &Arc<DictMetaRegistry> {
        &self.registry
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 取得某个字典类型的条目列表，必要时触发一次拉取。
    pub async fn get(&self, dict_type: &str) -> Result<Arc<Vec<DictEntry>>, DictError> {
        self.get_resolved(dict_type).await.map(|r| r.entries)
    }

    /// 与 [`get`](Self::get) 相同，但返回原始记录。
    pub async fn get_records(&self, dict_type: &str) -> Result<Arc<Vec<RawRecord>>, DictError> {
        self.get_resolved(dict_type).await.map(|r| r.records)
    }

    async fn get_resolved(&self, dict_type: &str) -> Result<Resolved, DictError> {
        let future = {
            let mut state = self.lock();
            if let Some(resolved) = state.take_fresh(dict_type, self.ttl) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!("字典{}命中缓存", dict_type);
                return Ok(resolved);
            }
            self.counters.misses.fetch_add(1, Ordering::Relaxed);

            let in_flight = state.pending.get(dict_type).map(|p| p.future.clone());
            match in_flight {
                Some(future) => {
                    debug!("字典{}正在拉取，加入等待", dict_type);
                    future
                }
                None => {
                    let meta = self.registry.resolve_meta(dict_type)?;
                    let generation = state.next_generation;
                    state.next_generation += 1;
                    let future = self.start_fetch(dict_type, meta, generation);
                    state.pending.insert(
                        dict_type.to_string(),
                        PendingSlot {
                            generation,
                            future: future.clone(),
                        },
                    );
                    future
                }
            }
        };
        future.await
    }

    fn start_fetch(&self, dict_type: &str, meta: DictMeta, generation: u64) -> SharedFetch {
        let state = Arc::clone(&self.state);
        let counters = Arc::clone(&self.counters);
        let dict_type = dict_type.to_string();
        counters.fetches.fetch_add(1, Ordering::Relaxed);
        debug!("开始拉取字典{}（第{}代）", dict_type, generation);

        async move {
            // 拉取器 panic 视为传输错误，槽位照常回到 Empty
            let result = match AssertUnwindSafe(meta.fetcher.fetch(&dict_type))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(_) => Err(DictError::transport(format!(
                    "fetcher for '{}' panicked",
                    dict_type
                ))),
            };

            let outcome = match result {
                Ok(records) => {
                    let (entries, warnings) =
                        normalize(&records, &meta.label_field, &meta.value_field);
                    for warning in &warnings {
                        warn!("字典{}：{}，已跳过", dict_type, warning);
                    }
                    Ok(Resolved {
                        entries: Arc::new(entries),
                        records: Arc::new(records),
                    })
                }
                Err(e) => {
                    counters.failures.fetch_add(1, Ordering::Relaxed);
                    error!("拉取字典{}失败：{}", dict_type, e);
                    Err(e)
                }
            };

            {
                let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
                let current = state
                    .pending
                    .get(&dict_type)
                    .map_or(false, |p| p.generation == generation);
                if !current {
                    debug!("字典{}在拉取期间已失效，丢弃第{}代结果", dict_type, generation);
                } else {
                    state.pending.remove(&dict_type);
                    if let Ok(resolved) = &outcome {
                        info!(
                            "字典{}已缓存，共{}项",
                            dict_type,
                            resolved.entries.len()
                        );
                        state.ready.put(
                            dict_type.clone(),
                            ReadySlot {
                                resolved: resolved.clone(),
                                fetched_at: Local::now(),
                            },
                        );
                    }
                }
            }
            outcome
        }
        .boxed()
        .shared()
    }

    /// 将一个类型（或 `"*"` 表示全部类型）重置为 Empty。
    ///
    /// 不会取消进行中的拉取，但其结果不再写入缓存。
    pub fn invalidate(&self, dict_type: &str) {
        let mut state = self.lock();
        if dict_type == WILDCARD {
            let ready = state.ready.len();
            let pending = state.pending.len();
            state.ready.clear();
            state.pending.clear();
            info!("已清空全部字典缓存（Ready {}，Pending {}）", ready, pending);
        } else {
            let was_ready = state.ready.pop(dict_type).is_some();
            let was_pending = state.pending.remove(dict_type).is_some();
            if was_ready || was_pending {
                info!("字典{}的缓存已失效", dict_type);
            }
        }
    }

    pub fn slot(&self, dict_type: &str) -> CacheSlot {
        let state = self.lock();
        if let Some(ready) = state.ready.peek(dict_type) {
            return CacheSlot::Ready {
                entries: ready.resolved.entries.len(),
                fetched_at: ready.fetched_at,
            };
        }
        if state.pending.contains_key(dict_type) {
            CacheSlot::Pending
        } else {
            CacheSlot::Empty
        }
    }

    pub fn fetched_at(&self, dict_type: &str) -> Option<DateTime<Local>> {
        let state = self.lock();
        state.ready.peek(dict_type).map(|slot| slot.fetched_at)
    }

    /// 当前处于 Ready 的类型，按最近使用排序
    pub fn cached_types(&self) -> Vec<String> {
        let state = self.lock();
        state.ready.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            ready: state.ready.len(),
            pending: state.pending.len(),
        }
    }
}

// 标量字段一律转成字符串，null / 数组 / 对象视为缺失
fn field_as_string(record: &RawRecord, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 按字段名把原始记录转换成条目列表，保持后端顺序。
///
/// 缺少字段或键值重复的记录被跳过，并以警告形式返回。
pub fn normalize(
    records: &[RawRecord],
    label_field: &str,
    value_field: &str,
) -> (Vec<DictEntry>, Vec<NormalizationWarning>) {
    let mut entries = Vec::with_capacity(records.len());
    let mut warnings = Vec::new();
    let mut seen = HashSet::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let label = match field_as_string(record, label_field) {
            Some(l) => l,
            None => {
                warnings.push(NormalizationWarning::MissingField {
                    index,
                    field: label_field.to_string(),
                });
                continue;
            }
        };
        let value = match field_as_string(record, value_field) {
            Some(v) => v,
            None => {
                warnings.push(NormalizationWarning::MissingField {
                    index,
                    field: value_field.to_string(),
                });
                continue;
            }
        };
        if !seen.insert(value.clone()) {
            warnings.push(NormalizationWarning::DuplicateValue { index, value });
            continue;
        }
        entries.push(DictEntry { label, value });
    }
    (entries, warnings)
}
