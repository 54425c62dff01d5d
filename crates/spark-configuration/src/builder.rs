use std::fmt;

use tracing::debug;

use crate::memory::MemoryConfigurationSource;
use crate::root::ConfigurationRoot;
use crate::source::{BuildContext, ConfigurationSource};
use crate::Result;

/// Builder 负责按注册顺序组织数据源，并生成最终的 [`ConfigurationRoot`]。
///
/// ### 契约说明（What）
/// - 数据源按注册顺序转换为提供者，后注册者在查找时优先；
/// - `build` 消费 Builder，每个数据源恰好被构建一次；
/// - 任一数据源构建失败时立即中止，错误原样返回。
///
/// ```
/// use spark_configuration::ConfigurationBuilder;
///
/// let mut builder = ConfigurationBuilder::new();
/// builder
///     .add_in_memory([("Testing:Blah", "BaseValue")])
///     .with_prefix("secrets", |inner| {
///         inner.add_in_memory([("Testing:Blah", "ShouldNotOverride")]);
///         Ok(())
///     })?;
/// let root = builder.build()?;
///
/// assert_eq!(root.get("Testing:Blah").as_deref(), Some("BaseValue"));
/// assert_eq!(root.get("secrets:Testing:Blah").as_deref(), Some("ShouldNotOverride"));
/// # Ok::<(), spark_configuration::ConfigurationError>(())
/// ```
#[derive(Default)]
pub struct ConfigurationBuilder {
    sources: Vec<Box<dyn ConfigurationSource>>,
}

impl ConfigurationBuilder {
    /// 创建不含任何数据源的 Builder。
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个数据源。
    pub fn add_source<S>(&mut self, source: S) -> &mut Self
    where
        S: ConfigurationSource + 'static,
    {
        self.sources.push(Box::new(source));
        self
    }

    /// 追加一个内存数据源。
    pub fn add_in_memory<I, K, V>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.add_source(MemoryConfigurationSource::new(entries))
    }

    /// 已注册的数据源数量。
    #[inline]
    pub fn sources_len(&self) -> usize {
        self.sources.len()
    }

    /// 构建顶层配置根。
    pub fn build(self) -> Result<ConfigurationRoot> {
        self.build_with(&BuildContext::root())
    }

    /// 在给定上下文中构建配置根，供嵌套数据源复用。
    pub(crate) fn build_with(self, context: &BuildContext) -> Result<ConfigurationRoot> {
        debug!(
            mount_path = context.mount_path(),
            depth = context.depth(),
            sources = self.sources.len(),
            "building configuration root"
        );
        let mut providers = Vec::with_capacity(self.sources.len());
        for source in self.sources {
            providers.push(source.build(context)?);
        }
        Ok(ConfigurationRoot::new(providers))
    }
}

impl fmt::Debug for ConfigurationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|source| source.describe()))
            .finish()
    }
}
