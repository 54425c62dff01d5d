use std::borrow::Cow;

use crate::path;
use crate::reload::ReloadToken;
use crate::Result;

/// 配置提供者契约：配置根中按顺序排列的一层键值绑定。
///
/// ### 契约说明（What）
/// - `try_get`：只回答属于自身的键；不属于自身或不存在时返回 `None`，由链上的其他提供者继续回答；
/// - `set`：写入属于自身的键；对不属于自身的键保持静默并返回 `Ok(())`；键属于自身却无处存放时返回错误；
/// - `load`：重新加载底层数据，默认无操作；
/// - `reload_token`：底层数据变化的通知令牌，默认永不触发；
/// - `child_keys`：在 `earlier`（链上先前提供者的结果）基础上追加本层在 `parent_path` 下的直接子段。
///
/// ### 线程安全
/// - Trait 要求 `Send + Sync`：构建完成后，读取方可以并发调用 `try_get` 与 `child_keys`；
///   需要写入能力的实现自行提供内部可变性。
pub trait ConfigurationProvider: Send + Sync {
    /// 诊断用名称，出现在日志与 `Debug` 输出中。
    fn name(&self) -> Cow<'_, str>;

    /// 读取本层的键值；键不属于本层或不存在时返回 `None`。
    fn try_get(&self, key: &str) -> Option<String>;

    /// 写入本层的键值。
    ///
    /// # Errors
    /// 键属于本层但无法保存时返回错误，例如前缀挂载的内层配置根没有任何提供者。
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// 重新加载底层数据。
    fn load(&self) -> Result<()> {
        Ok(())
    }

    /// 底层数据变化的通知令牌。
    fn reload_token(&self) -> ReloadToken {
        ReloadToken::never()
    }

    /// 在 `earlier` 之上合并本层位于 `parent_path` 之下的直接子段；`None` 表示顶层。
    fn child_keys(&self, earlier: Vec<String>, parent_path: Option<&str>) -> Vec<String>;
}

/// 合并子段集合：大小写不敏感去重，并按 [`path::compare_keys`] 排序。
///
/// `earlier` 中已有的拼写优先保留。
pub fn merge_child_keys<I>(mut earlier: Vec<String>, contributed: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    earlier.extend(contributed);
    let mut merged: Vec<String> = Vec::with_capacity(earlier.len());
    for key in earlier {
        if !merged.iter().any(|seen| path::eq_ignore_case(seen, &key)) {
            merged.push(key);
        }
    }
    merged.sort_by(|a, b| path::compare_keys(a, b));
    merged
}
