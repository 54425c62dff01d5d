//! 配置键路径工具。
//!
//! # 契约说明（What）
//! - 键由若干段（segment）组成，段之间以 [`KEY_DELIMITER`] 连接，例如 `Kestrel:Endpoints:Http:Url`；
//! - 段比较一律大小写不敏感，但存储与枚举时保留调用方的原始拼写；
//! - 所有前缀判断都以“段”为单位：`app` 是 `app:port` 的前缀，却不是 `application:port` 的前缀。

use core::cmp::Ordering;

/// 键路径分隔符。
pub const KEY_DELIMITER: &str = ":";

/// 以分隔符拼接多个段，空段会被跳过。
///
/// ```
/// use spark_configuration::path;
///
/// assert_eq!(path::combine(["secrets", "", "Testing:Blah"]), "secrets:Testing:Blah");
/// ```
pub fn combine<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut combined = String::new();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.is_empty() {
            continue;
        }
        if !combined.is_empty() {
            combined.push_str(KEY_DELIMITER);
        }
        combined.push_str(segment);
    }
    combined
}

/// 返回路径的最后一段；不含分隔符时返回整条路径。
pub fn section_key(path: &str) -> &str {
    match path.rfind(KEY_DELIMITER) {
        Some(index) => &path[index + KEY_DELIMITER.len()..],
        None => path,
    }
}

/// 返回父路径；顶层键没有父路径。
pub fn parent_path(path: &str) -> Option<&str> {
    path.rfind(KEY_DELIMITER).map(|index| &path[..index])
}

/// 大小写不敏感的字符串比较。
///
/// ASCII 输入走快速路径，其余情况按 Unicode 小写映射逐字符比较。
pub fn eq_ignore_case(left: &str, right: &str) -> bool {
    if left.is_ascii() && right.is_ascii() {
        return left.eq_ignore_ascii_case(right);
    }
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}

/// 生成大小写无关的查找键，供内部映射使用。
pub(crate) fn normalize(key: &str) -> String {
    if key.is_ascii() {
        key.to_ascii_lowercase()
    } else {
        key.to_lowercase()
    }
}

/// 以段为单位剥离前缀。
///
/// ### 契约说明（What）
/// - `key` 与 `prefix` 相等（忽略大小写）时返回 `Some("")`；
/// - `key` 以 `prefix:` 开头时返回分隔符之后的剩余部分，剩余部分可能为空（例如 `prefix:`）；
/// - 其余情况返回 `None`，包括 `prefixed:key` 这类仅在字符层面重叠的键。
///
/// ```
/// use spark_configuration::path::strip_segment_prefix;
///
/// assert_eq!(strip_segment_prefix("Secrets:Api:Key", "secrets"), Some("Api:Key"));
/// assert_eq!(strip_segment_prefix("secrets:", "secrets"), Some(""));
/// assert_eq!(strip_segment_prefix("secretsX:Key", "secrets"), None);
/// ```
pub fn strip_segment_prefix<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    // 按段数切分而非按字节长度切分：大小写变体的 UTF-8 长度可能不同（如 `K` 与 `k`）。
    let segments = prefix.split(KEY_DELIMITER).count();
    let (head, rest) = match key.match_indices(KEY_DELIMITER).nth(segments - 1) {
        Some((index, _)) => (&key[..index], &key[index + KEY_DELIMITER.len()..]),
        None if key.split(KEY_DELIMITER).count() == segments => (key, ""),
        None => return None,
    };
    eq_ignore_case(head, prefix).then_some(rest)
}

/// 配置键排序比较器。
///
/// ### 逻辑解析（How）
/// - 按段逐一比较，空段被忽略；
/// - 两段均为整数时按数值比较，整数段排在非整数段之前；
/// - 其余情况按大小写不敏感的字典序比较；
/// - 公共前缀相同时，段数少的路径在前。
///
/// 数组型配置（`servers:0`、`servers:1`、`servers:10`）因此能按下标自然排序。
pub fn compare_keys(left: &str, right: &str) -> Ordering {
    let mut left_segments = left.split(KEY_DELIMITER).filter(|s| !s.is_empty());
    let mut right_segments = right.split(KEY_DELIMITER).filter(|s| !s.is_empty());
    loop {
        match (left_segments.next(), right_segments.next()) {
            (Some(a), Some(b)) => {
                let ordering = compare_segment(a, b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
        }
    }
}

fn compare_segment(left: &str, right: &str) -> Ordering {
    match (left.parse::<i64>(), right.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => left
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(right.chars().flat_map(char::to_lowercase)),
    }
}
