// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;
use std::time::Duration;

use crate::param::{DEFAULT_CACHE_SIZE, DEFAULT_LABEL_FIELD, DEFAULT_VALUE_FIELD};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    base_url: String,
    #[serde(default = "default_label_field")]
    label_field: String,
    #[serde(default = "default_value_field")]
    value_field: String,
    #[serde(default = "default_cache_size")]
    cache_size: usize,
    #[serde(default)]
    ttl_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default)]
    worker_threads: usize,
}

fn default_label_field() -> String {
    DEFAULT_LABEL_FIELD.to_string()
}

fn default_value_field() -> String {
    DEFAULT_VALUE_FIELD.to_string()
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            label_field: default_label_field(),
            value_field: default_value_field(),
            cache_size: default_cache_size(),
            ttl_secs: 0,
            request_timeout_secs: default_request_timeout_secs(),
            worker_threads: num_cpus::get(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    pub fn from_toml(filename: &str) -> Self {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => panic!("no such file {} exception:{}", filename, e),
        };
        let mut str_val = String::new();
        match file.read_to_string(&mut str_val) {
            Ok(s) => s,
            Err(e) => panic!("Error Reading file: {}", e),
        };

        match Config::from_toml_str(&str_val) {
            Ok(c) => c,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        }
    }

    fn normalize(&mut self) {
        if self.worker_threads == 0 {
            self.worker_threads = num_cpus::get();
        }
        if self.cache_size == 0 {
            warn!(
                "cache_size被设置为0，但不支持禁用字典缓存，因此该值将被改为{}。",
                DEFAULT_CACHE_SIZE
            );
            self.cache_size = DEFAULT_CACHE_SIZE;
        }
        if self.request_timeout_secs == 0 {
            warn!("request_timeout_secs被设置为0，将使用默认的10秒");
            self.request_timeout_secs = default_request_timeout_secs();
        }
    }
}

impl Config {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn label_field(&self) -> &str {
        &self.label_field
    }

    pub fn value_field(&self) -> &str {
        &self.value_field
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    /// `ttl_secs` 为 0 表示缓存永不过期
    pub fn ttl(&self) -> Option<Duration> {
        match self.ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }
}
