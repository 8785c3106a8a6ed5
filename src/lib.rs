// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

pub mod cache;
pub mod config;
pub mod exception;
pub mod fetcher;
pub mod meta;
pub mod param;
pub mod resolver;

pub use cache::{normalize, CacheSlot, CacheStats, DictCache, DictEntry};
pub use config::Config;
pub use exception::{DictError, NormalizationWarning};
pub use fetcher::{parse_envelope, DictFetcher, FnFetcher, HttpDictFetcher, RawRecord};
pub use meta::{DictMeta, DictMetaRegistry};
pub use param::WILDCARD;
pub use resolver::{install, installed, uninstall, DictResolver};
