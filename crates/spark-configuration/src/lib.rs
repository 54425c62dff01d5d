#![deny(unsafe_code)]
#![allow(private_bounds)]
#![doc = r#"
# spark-configuration

## 设计动机（Why）
- **定位**：提供分层键值配置树（键以 `:` 分段，例如 `Kestrel:Endpoints:Http:Url`），
  并支持把一组独立构建的数据源挂载到某个前缀命名空间之下；
- **核心能力**：[`PrefixedConfigurationProvider`] 剥离/追加前缀，使内层数据源的键只在
  `prefix:<原始键>` 下可见，外层已有的同名键既不会被覆盖，也不会被遮蔽。

## 核心契约（What）
- [`ConfigurationBuilder`] 按顺序登记数据源，`build` 后得到 [`ConfigurationRoot`]；
- 查找时后注册的提供者优先，键比较大小写不敏感；
- 键不存在以 `None` 表达，不是错误；前缀挂载层唯一会主动产生的错误是
  [`ConfigurationError::InvalidArgument`]。

## 实现策略（How）
- 数据源是封闭的变体集合（内存源、前缀源），统一以 [`ConfigurationSource::build`] 产出提供者；
- 嵌套挂载依靠普通的递归所有权：前缀提供者独占一棵完整的内层配置根；
- 不存在进程级全局配置，每个调用方构建自己的配置根。

```
use spark_configuration::ConfigurationBuilder;

let mut builder = ConfigurationBuilder::new();
builder.with_prefix("test", |outer| {
    outer.with_prefix("nested", |inner| {
        inner.add_in_memory([("Key", "Value")]);
        Ok(())
    })?;
    Ok(())
})?;
let root = builder.build()?;

assert_eq!(root.get("test:nested:Key").as_deref(), Some("Value"));
assert_eq!(root.get("test:Key"), None);
# Ok::<(), spark_configuration::ConfigurationError>(())
```
"#]

mod builder;
mod error;
mod memory;
mod prefixed;
mod provider;
mod reload;
mod root;
mod sealed;
mod source;

pub mod path;

pub use builder::ConfigurationBuilder;
pub use error::{ConfigurationError, ConfigurationErrorKind, Result};
pub use memory::{MemoryConfigurationProvider, MemoryConfigurationSource};
pub use path::KEY_DELIMITER;
pub use prefixed::{PrefixedConfigurationProvider, PrefixedConfigurationSource};
pub use provider::{ConfigurationProvider, merge_child_keys};
pub use reload::{ReloadToken, ReloadTrigger};
pub use root::{ConfigurationRoot, ConfigurationSection};
pub use source::{BuildContext, ConfigurationSource};
