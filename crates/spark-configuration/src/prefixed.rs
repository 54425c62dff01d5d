//! 前缀命名空间挂载。
//!
//! # 设计目的（Why）
//! - 允许调用方把一组独立构建的数据源挂载到现有配置树的某个前缀之下，例如把密钥库挂在 `secrets:` 下；
//! - 挂载不会覆盖、也不会遮蔽外层树中同名的键：内层的 `Testing:Blah` 只能通过 `secrets:Testing:Blah` 访问。
//!
//! # 逻辑解析（How）
//! - [`PrefixedConfigurationSource`] 保存前缀与配置回调；外层 `build` 时新建一个空 Builder，执行回调后构建出内层配置根；
//! - [`PrefixedConfigurationProvider`] 独占内层配置根，读写与枚举时剥离恰好一层前缀后委托给内层；
//! - 嵌套挂载（`a` 内再挂 `c`）依靠普通的递归所有权实现：每层只认识自己的前缀，不关心上下还有几层。
//!
//! # 契约说明（What）
//! - 前缀不能为空，也不能以分隔符开头或结尾；违反时在注册阶段返回 [`ConfigurationError::InvalidArgument`]；
//! - 查询 `prefix` 或 `prefix:` 本身总是返回 `None`：前缀节点只有子节点，没有值；
//! - 命名空间之外的写入对本提供者是静默的无操作，由链上其他提供者负责；
//! - 命名空间之内的写入交给内层配置根；内层没有任何提供者时返回 [`ConfigurationError::NoProviders`]；
//! - 内层配置根构建失败时，错误原样传播给外层 `build` 的调用方。

use std::borrow::Cow;
use std::fmt;

use tracing::{debug, debug_span, trace};

use crate::builder::ConfigurationBuilder;
use crate::error::ConfigurationError;
use crate::path::{self, KEY_DELIMITER};
use crate::provider::{ConfigurationProvider, merge_child_keys};
use crate::reload::ReloadToken;
use crate::root::ConfigurationRoot;
use crate::sealed::Sealed;
use crate::source::{BuildContext, ConfigurationSource};
use crate::Result;

type Configure = Box<dyn FnOnce(&mut ConfigurationBuilder) -> Result<()> + Send>;

/// 前缀配置源：保存前缀与内层 Builder 的配置回调。
///
/// 回调在外层构建时恰好执行一次，接收一个全新的空 Builder，可在其中注册任意数据源，包括再次挂载前缀源。
pub struct PrefixedConfigurationSource {
    prefix: String,
    configure: Configure,
}

impl PrefixedConfigurationSource {
    /// 校验前缀并创建数据源。
    ///
    /// # Errors
    /// 前缀为空，或以 `:` 开头/结尾时返回 [`ConfigurationError::InvalidArgument`]。
    pub fn new<P, F>(prefix: P, configure: F) -> Result<Self>
    where
        P: Into<String>,
        F: FnOnce(&mut ConfigurationBuilder) -> Result<()> + Send + 'static,
    {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self {
            prefix,
            configure: Box::new(configure),
        })
    }

    /// 挂载前缀，保留调用方的原始拼写。
    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(ConfigurationError::invalid_argument(
            "prefix",
            "must not be empty",
        ));
    }
    if prefix.starts_with(KEY_DELIMITER) || prefix.ends_with(KEY_DELIMITER) {
        return Err(ConfigurationError::invalid_argument(
            "prefix",
            format!("`{prefix}` must not start or end with the key delimiter"),
        ));
    }
    Ok(())
}

impl Sealed for PrefixedConfigurationSource {}

impl ConfigurationSource for PrefixedConfigurationSource {
    fn describe(&self) -> Cow<'_, str> {
        Cow::Owned(format!("prefixed({})", self.prefix))
    }

    fn build(self: Box<Self>, context: &BuildContext) -> Result<Box<dyn ConfigurationProvider>> {
        let Self { prefix, configure } = *self;
        let nested = context.nested(&prefix);
        let span = debug_span!("prefixed_source", mount_path = nested.mount_path());
        let _entered = span.enter();

        let mut builder = ConfigurationBuilder::new();
        configure(&mut builder)?;
        let inner = builder.build_with(&nested)?;
        debug!(
            prefix = %prefix,
            providers = inner.providers().len(),
            "mounted prefixed configuration"
        );
        Ok(Box::new(PrefixedConfigurationProvider { prefix, inner }))
    }
}

impl fmt::Debug for PrefixedConfigurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixedConfigurationSource")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// 前缀配置提供者：把内层配置根的全部键呈现在 `prefix:` 之下。
pub struct PrefixedConfigurationProvider {
    prefix: String,
    inner: ConfigurationRoot,
}

impl PrefixedConfigurationProvider {
    /// 挂载前缀。
    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// 被挂载的内层配置根。
    #[inline]
    pub fn inner(&self) -> &ConfigurationRoot {
        &self.inner
    }

    /// 剥离前缀得到内层键；不在命名空间内或剩余部分为空时返回 `None`。
    fn inner_key<'k>(&self, key: &'k str) -> Option<&'k str> {
        path::strip_segment_prefix(key, &self.prefix).filter(|remainder| !remainder.is_empty())
    }
}

fn first_segment(path: &str) -> &str {
    path.split(KEY_DELIMITER).next().unwrap_or(path)
}

impl ConfigurationProvider for PrefixedConfigurationProvider {
    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("prefixed({})", self.prefix))
    }

    fn try_get(&self, key: &str) -> Option<String> {
        self.inner_key(key).and_then(|inner_key| self.inner.get(inner_key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let Some(inner_key) = self.inner_key(key) else {
            trace!(key, prefix = %self.prefix, "ignoring write outside prefix namespace");
            return Ok(());
        };
        self.inner.set(inner_key, value)
    }

    fn load(&self) -> Result<()> {
        self.inner.reload()
    }

    fn reload_token(&self) -> ReloadToken {
        self.inner.reload_token()
    }

    fn child_keys(&self, earlier: Vec<String>, parent_path: Option<&str>) -> Vec<String> {
        let Some(parent) = parent_path.filter(|parent| !parent.is_empty()) else {
            return merge_child_keys(earlier, [first_segment(&self.prefix).to_owned()]);
        };

        // 多段前缀（`a:b`）在其祖先路径（`a`）下贡献下一段。
        if let Some(remainder) = path::strip_segment_prefix(&self.prefix, parent) {
            if !remainder.is_empty() {
                return merge_child_keys(earlier, [first_segment(remainder).to_owned()]);
            }
        }

        match path::strip_segment_prefix(parent, &self.prefix) {
            Some(remainder) => {
                let inner_parent = (!remainder.is_empty()).then_some(remainder);
                merge_child_keys(earlier, self.inner.child_keys(inner_parent))
            }
            None => earlier,
        }
    }
}

impl fmt::Debug for PrefixedConfigurationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixedConfigurationProvider")
            .field("prefix", &self.prefix)
            .field("inner", &self.inner)
            .finish()
    }
}

impl ConfigurationBuilder {
    /// 挂载一组位于 `prefix` 命名空间下的数据源。
    ///
    /// ### 契约说明（What）
    /// - 立即校验前缀，失败时返回 [`ConfigurationError::InvalidArgument`] 且不修改 Builder；
    /// - `configure` 在外层 [`ConfigurationBuilder::build`] 时执行，接收独立的内层 Builder；
    /// - 返回同一个 Builder 以便链式调用。
    pub fn with_prefix<P, F>(&mut self, prefix: P, configure: F) -> Result<&mut Self>
    where
        P: Into<String>,
        F: FnOnce(&mut ConfigurationBuilder) -> Result<()> + Send + 'static,
    {
        let source = PrefixedConfigurationSource::new(prefix, configure)?;
        Ok(self.add_source(source))
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::ConfigurationErrorKind;

    fn mounted(prefix: &str, entries: &'static [(&'static str, &'static str)]) -> ConfigurationRoot {
        let mut builder = ConfigurationBuilder::new();
        builder
            .with_prefix(prefix, move |inner| {
                inner.add_in_memory(entries.iter().copied());
                Ok(())
            })
            .expect("valid prefix");
        builder.build().expect("build")
    }

    #[test]
    fn invalid_prefixes_are_rejected_at_registration() {
        for prefix in ["", ":secrets", "secrets:", ":"] {
            let mut builder = ConfigurationBuilder::new();
            let error = builder
                .with_prefix(prefix, |_| Ok(()))
                .expect_err("prefix must be rejected");
            assert_eq!(error.kind(), ConfigurationErrorKind::InvalidArgument);
            assert_eq!(builder.sources_len(), 0);
        }
    }

    #[test]
    fn inner_prefix_delimiters_are_allowed() {
        let root = mounted("a:b", &[("Key", "Value")]);
        assert_eq!(root.get("a:b:Key").as_deref(), Some("Value"));
        assert_eq!(root.child_keys(None), vec!["a"]);
        assert_eq!(root.child_keys(Some("a")), vec!["b"]);
        assert_eq!(root.child_keys(Some("a:b")), vec!["Key"]);
    }

    #[test]
    fn prefix_node_has_no_value() {
        let root = mounted("test", &[("", "empty key"), ("Key", "Value")]);
        assert_eq!(root.get("test"), None);
        assert_eq!(root.get("test:"), None);
        assert_eq!(root.get("TEST:key").as_deref(), Some("Value"));
    }

    #[test]
    fn keys_sharing_characters_but_not_segments_are_not_found() {
        let root = mounted("test", &[("Key", "Value")]);
        assert_eq!(root.get("testKey"), None);
        assert_eq!(root.get("testing:Key"), None);
    }

    #[test]
    fn child_keys_outside_namespace_are_untouched() {
        let root = mounted("secrets", &[("Api:Key", "k")]);
        let provider = root.providers().next().expect("one provider");
        let earlier = vec!["Z".to_owned(), "a".to_owned()];
        assert_eq!(provider.child_keys(earlier.clone(), Some("other")), earlier);
        assert_eq!(provider.child_keys(Vec::new(), Some("secrets")), vec!["Api"]);
        assert_eq!(provider.child_keys(Vec::new(), Some("secrets:api")), vec!["Key"]);
    }

    #[test]
    fn configurator_errors_propagate_from_build() {
        let mut builder = ConfigurationBuilder::new();
        builder
            .with_prefix("outer", |inner| {
                inner.with_prefix("", |_| Ok(()))?;
                Ok(())
            })
            .expect("outer prefix is valid");
        let error = builder.build().expect_err("nested prefix is invalid");
        assert_eq!(error.kind(), ConfigurationErrorKind::InvalidArgument);
    }

    #[test]
    fn reload_reaches_inner_root() {
        let root = mounted("test", &[("Key", "Value")]);
        let provider = root.providers().next().expect("one provider");
        let token = provider.reload_token();
        assert!(!token.has_changed());

        root.reload().expect("reload");
        assert!(token.has_changed());
    }

    #[test]
    #[traced_test]
    fn writes_outside_namespace_are_ignored_and_traced() {
        let root = mounted("prefix", &[("Key", "Value")]);
        root.set("Key", "Other").expect("set");
        assert_eq!(root.get("Key"), None);
        assert_eq!(root.get("prefix:Key").as_deref(), Some("Value"));
        assert!(logs_contain("ignoring write outside prefix namespace"));
    }

    #[test]
    fn writes_into_an_empty_mount_are_reported() {
        let root = mounted("p", &[]);

        let error = root.set("p:NewKey", "v").expect_err("nothing can store the value");
        assert!(matches!(error, ConfigurationError::NoProviders { ref key } if key == "NewKey"));
        assert_eq!(root.get("p:NewKey"), None);

        root.set("Outer", "v").expect("writes outside the mount are not errors");
    }

    #[test]
    fn prefix_matching_folds_case_across_byte_lengths() {
        // `\u{212A}`（开尔文符号）占三个字节，小写后与 `k` 相同。
        let root = mounted("k", &[("X", "Value")]);
        assert_eq!(root.get("\u{212A}:X").as_deref(), Some("Value"));
        assert_eq!(root.get("\u{212A}:x").as_deref(), Some("Value"));
        assert_eq!(root.get("\u{212A}"), None);
    }

    #[test]
    fn debug_output_names_the_prefix() {
        let root = mounted("secrets", &[]);
        let rendered = format!("{root:?}");
        assert!(rendered.contains("prefixed(secrets)"));
    }
}
