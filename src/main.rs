// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 字典缓存控制台
//!
//! 加载配置、初始化日志，并以后台 HTTP 接口作为默认数据源启动一个字典解析器。
//! 标准输入上提供运维指令：
//! - `get <type>`：解析并打印字典
//! - `label <type> <value>` / `labels <type> <v1,v2>`：翻译键值
//! - `refresh [type]`：让缓存失效，缺省为全部
//! - `status`：缓存统计
//! - `stop`：退出

use std::env;
use std::sync::Arc;

use dictcache::param::DEFAULT_SEPARATOR;
use dictcache::{install, uninstall, Config, DictResolver, WILDCARD};
use log::{error, info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::Builder,
};

const DEFAULT_CONFIG: &str = "config/development.toml";
const LOG_CONFIG: &str = "config/log4rs.yaml";

fn main() {
    // 1. 初始化日志系统：通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file(LOG_CONFIG, Default::default()) {
        eprintln!("无法加载日志配置{}：{}", LOG_CONFIG, e);
    }

    // 2. 环境配置加载
    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = Config::from_toml(&config_path);
    info!("配置文件{}已载入", config_path);
    info!("字典接口地址：{}", config.base_url());

    // 3. 异步运行时：工作线程数来自配置
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            return;
        }
    };

    let resolver = match DictResolver::from_config(&config) {
        Ok(r) => install(r),
        Err(e) => {
            error!("无法创建字典解析器：{}", e);
            return;
        }
    };

    runtime.block_on(console(resolver));
    uninstall();
    info!("控制台已退出");
}

async fn console(resolver: Arc<DictResolver>) {
    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!("读取标准输入失败：{}", e);
                break;
            }
        }
        let args: Vec<&str> = input.split_whitespace().collect();
        match args.as_slice() {
            [] => continue,
            ["stop"] => {
                println!("正在退出...");
                break;
            }
            ["help"] => print_help(),
            ["get", dict_type] => match resolver.resolve(dict_type).await {
                Ok(entries) => {
                    println!("== {} ({}项) ==", dict_type, entries.len());
                    for entry in entries.iter() {
                        println!("{:<12} {}", entry.value, entry.label);
                    }
                }
                Err(e) => println!("解析失败：{}", e),
            },
            ["label", dict_type, value] => match resolver.label_for(dict_type, value).await {
                Ok(Some(label)) => println!("{}", label),
                Ok(None) => println!("（字典{}中没有键值{}）", dict_type, value),
                Err(e) => println!("解析失败：{}", e),
            },
            ["labels", dict_type, values] => {
                match resolver.labels_for(dict_type, values, DEFAULT_SEPARATOR).await {
                    Ok(labels) => println!("{}", labels),
                    Err(e) => println!("解析失败：{}", e),
                }
            }
            ["refresh"] => {
                resolver.invalidate(WILDCARD);
                println!("已刷新全部字典缓存");
            }
            ["refresh", dict_type] => {
                resolver.invalidate(dict_type);
                println!("已刷新字典{}", dict_type);
            }
            ["status"] => print_status(&resolver),
            _ => {
                warn!("无效的命令：{}", input.trim());
                println!("无效的命令：{}，输入 help 查看帮助", input.trim());
            }
        }
    }
}

fn print_help() {
    println!("== dictcache Help ==");
    println!("get <type>            - 解析并打印字典");
    println!("label <type> <value>  - 查询单个键值的标签");
    println!("labels <type> <a,b>   - 翻译逗号分隔的多个键值");
    println!("refresh [type]        - 刷新缓存，缺省为全部");
    println!("status                - 查看缓存状态");
    println!("stop                  - 退出");
    println!("====================");
}

fn print_status(resolver: &DictResolver) {
    let cache = resolver.cache();
    let stats = cache.stats();
    println!("== dictcache 状态 ==");
    println!("命中: {}  未命中: {}", stats.hits, stats.misses);
    println!("拉取: {}  失败: {}", stats.fetches, stats.failures);
    println!("Ready: {}  Pending: {}", stats.ready, stats.pending);
    for dict_type in cache.cached_types() {
        if let Some(at) = cache.fetched_at(&dict_type) {
            println!("  {:<24} {}", dict_type, at.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    println!("====================");
}
