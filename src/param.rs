// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 字典参数与常量模块
//!
//! 该模块定义了字典缓存层使用的常量，包括：
//! - 通配规则的键。
//! - 后端字典数据表的默认字段名。
//! - 后端接口路径与响应信封的约定。

use lazy_static::lazy_static;
use regex::Regex;

/// 通配规则键。注册在该键下的元数据在没有精确规则时生效；
/// 作为 `invalidate` 的参数时表示清空全部字典类型。
pub const WILDCARD: &str = "*";

/// 后端 `sys_dict_data` 表中的标签字段
pub const DEFAULT_LABEL_FIELD: &str = "dict_label";

/// 后端 `sys_dict_data` 表中的键值字段
pub const DEFAULT_VALUE_FIELD: &str = "dict_value";

/// 按字典类型查询字典数据的接口路径前缀，后接 `{dict_type}/`
pub const DICT_DATA_BY_TYPE_PATH: &str = "/system/dict/data/type/";

/// 响应信封中表示成功的业务码
pub const SUCCESS_CODE: i64 = 200;

/// `labels_for` 的默认分隔符
pub const DEFAULT_SEPARATOR: &str = ",";

/// Ready 槽位数量上限的默认值
pub const DEFAULT_CACHE_SIZE: usize = 256;

lazy_static! {
    /// 后端路由只接受 `\w+` 形式的字典类型名。
    pub static ref DICT_TYPE_PATTERN: Regex = Regex::new(r"^\w+$").unwrap();
}

/// 判断字典类型名能否直接拼进后端路由。
pub fn is_valid_dict_type(dict_type: &str) -> bool {
    DICT_TYPE_PATTERN.is_match(dict_type)
}
