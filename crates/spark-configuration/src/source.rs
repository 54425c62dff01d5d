use std::borrow::Cow;

use crate::path;
use crate::provider::ConfigurationProvider;
use crate::sealed::Sealed;
use crate::Result;

/// 配置源契约：在配置树构建时产出一个提供者。
///
/// ### 契约说明（What）
/// - `build` 消费数据源本身（`Box<Self>`），每个数据源在一次构建中恰好被使用一次；
/// - 构建阶段允许执行 I/O（取决于具体变体），失败时返回错误并由 Builder 原样向上传播；
/// - 变体集合是封闭的：内存源与前缀源，均以同一个 `build` 方法参与多态分派，Builder 不对任何变体做特殊处理。
pub trait ConfigurationSource: Send + Sealed {
    /// 诊断用描述。
    fn describe(&self) -> Cow<'_, str>;

    /// 构建提供者。
    fn build(self: Box<Self>, context: &BuildContext) -> Result<Box<dyn ConfigurationProvider>>;
}

/// 构建上下文：描述正在构建的 Builder 在整棵配置树中的挂载位置。
///
/// 仅用于诊断（日志 span 等）；提供者的键语义不依赖挂载位置。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildContext {
    mount_path: String,
    depth: usize,
}

impl BuildContext {
    /// 顶层构建上下文。
    pub fn root() -> Self {
        Self::default()
    }

    /// 派生挂载在 `prefix` 之下的内层上下文。
    pub fn nested(&self, prefix: &str) -> Self {
        Self {
            mount_path: path::combine([self.mount_path.as_str(), prefix]),
            depth: self.depth + 1,
        }
    }

    /// 挂载路径；顶层为空字符串。
    #[inline]
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// 嵌套深度；顶层为 `0`。
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }
}
