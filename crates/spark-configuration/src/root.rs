use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigurationError;
use crate::path;
use crate::provider::{ConfigurationProvider, merge_child_keys};
use crate::reload::{ReloadToken, ReloadTrigger};
use crate::Result;

/// 构建完成、可查询的配置根。
///
/// ### 契约说明（What）
/// - 持有按注册顺序排列的提供者；读取时从后往前询问，第一个给出值的提供者胜出；
/// - 写入会交给每一个提供者，由提供者自行判断键是否属于自己；
/// - 配置根之间没有共享状态：每次 `build` 都得到一棵独立的树，前缀挂载的内层配置根由其提供者独占。
///
/// ### 线程安全
/// - `ConfigurationRoot` 为 `Send + Sync`；并发读取的安全性由各提供者保证，配置根本身不加锁。
pub struct ConfigurationRoot {
    providers: Vec<Box<dyn ConfigurationProvider>>,
    trigger: ReloadTrigger,
}

impl ConfigurationRoot {
    /// 以已构建的提供者列表创建配置根。
    pub fn new(providers: Vec<Box<dyn ConfigurationProvider>>) -> Self {
        Self {
            providers,
            trigger: ReloadTrigger::new(),
        }
    }

    /// 按注册顺序遍历提供者。
    pub fn providers(&self) -> impl ExactSizeIterator<Item = &dyn ConfigurationProvider> + '_ {
        self.providers.iter().map(|provider| &**provider)
    }

    /// 读取键值；不存在时返回 `None`。
    pub fn get(&self, key: &str) -> Option<String> {
        self.providers
            .iter()
            .rev()
            .find_map(|provider| provider.try_get(key))
    }

    /// 读取并解析键值。
    ///
    /// 键不存在时返回 `Ok(None)`；存在但无法解析时返回 [`ConfigurationError::Conversion`]。
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
    {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match value.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigurationError::Conversion {
                key: key.to_owned(),
                value,
                target: std::any::type_name::<T>(),
            }),
        }
    }

    /// 写入键值。
    ///
    /// ### 契约说明（What）
    /// - 每个提供者都会收到写入请求；前缀提供者只接受自身命名空间内的键；
    /// - 未注册任何提供者时返回 [`ConfigurationError::NoProviders`]；
    /// - 某个提供者写入失败时，其余提供者仍会收到写入，随后返回第一个错误；
    /// - 多次 `set` 之间不保证原子性。
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.providers.is_empty() {
            return Err(ConfigurationError::NoProviders {
                key: key.to_owned(),
            });
        }
        trace!(key, providers = self.providers.len(), "setting configuration key");
        let mut first_error = None;
        for provider in &self.providers {
            if let Err(error) = provider.set(key, value) {
                debug!(key, provider = %provider.name(), %error, "configuration write failed");
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// 列出 `parent_path` 之下的直接子段；`None` 表示顶层。
    pub fn child_keys(&self, parent_path: Option<&str>) -> Vec<String> {
        let collected = self
            .providers
            .iter()
            .fold(Vec::new(), |earlier, provider| {
                provider.child_keys(earlier, parent_path)
            });
        merge_child_keys(collected, std::iter::empty())
    }

    /// 获取指定路径的配置节视图。
    pub fn section(&self, path: &str) -> ConfigurationSection<'_> {
        ConfigurationSection {
            root: self,
            path: path.to_owned(),
        }
    }

    /// 顶层配置节。
    pub fn children(&self) -> Vec<ConfigurationSection<'_>> {
        self.child_keys(None)
            .into_iter()
            .map(|key| self.section(&key))
            .collect()
    }

    /// 重新加载全部提供者，并触发配置根的重载令牌。
    ///
    /// 某个提供者加载失败不会中断其余提供者；令牌总会触发，因为已成功的提供者可能已经改变了取值。
    /// 全部加载完成后返回第一个错误。
    pub fn reload(&self) -> Result<()> {
        let mut first_error = None;
        for provider in &self.providers {
            if let Err(error) = provider.load() {
                debug!(provider = %provider.name(), %error, "configuration provider failed to reload");
                first_error.get_or_insert(error);
            }
        }
        debug!(
            providers = self.providers.len(),
            failed = first_error.is_some(),
            "configuration root reloaded"
        );
        self.trigger.fire();
        first_error.map_or(Ok(()), Err)
    }

    /// 配置根的重载令牌：配置根自身重载或任一提供者的令牌触发时视为已变化。
    pub fn reload_token(&self) -> ReloadToken {
        ReloadToken::composite(
            std::iter::once(self.trigger.token())
                .chain(self.providers.iter().map(|provider| provider.reload_token())),
        )
    }
}

impl fmt::Debug for ConfigurationRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationRoot")
            .field(
                "providers",
                &self
                    .providers
                    .iter()
                    .map(|provider| provider.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// 配置根上某一路径的只读视图。
#[derive(Clone)]
pub struct ConfigurationSection<'a> {
    root: &'a ConfigurationRoot,
    path: String,
}

impl<'a> ConfigurationSection<'a> {
    /// 完整路径。
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 路径的最后一段。
    #[inline]
    pub fn key(&self) -> &str {
        path::section_key(&self.path)
    }

    /// 本节自身的值。
    pub fn value(&self) -> Option<String> {
        self.root.get(&self.path)
    }

    /// 读取相对路径的值。
    pub fn get(&self, relative: &str) -> Option<String> {
        self.root.get(&path::combine([self.path.as_str(), relative]))
    }

    /// 相对路径的子节。
    pub fn section(&self, relative: &str) -> ConfigurationSection<'a> {
        self.root.section(&path::combine([self.path.as_str(), relative]))
    }

    /// 直接子节。
    pub fn children(&self) -> Vec<ConfigurationSection<'a>> {
        self.root
            .child_keys(Some(&self.path))
            .into_iter()
            .map(|key| self.section(&key))
            .collect()
    }

    /// 本节存在值或子节时视为存在。
    pub fn exists(&self) -> bool {
        self.value().is_some() || !self.root.child_keys(Some(&self.path)).is_empty()
    }
}

impl fmt::Debug for ConfigurationSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationSection")
            .field("path", &self.path)
            .field("value", &self.value())
            .finish()
    }
}
