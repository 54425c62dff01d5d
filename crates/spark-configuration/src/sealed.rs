//! 封闭配置源实现集合的私有标记。
//!
//! [`ConfigurationSource`](crate::ConfigurationSource) 以本 Trait 为超 Trait，
//! 数据源的变体集合因此只能在本 crate 内扩展。

pub(crate) trait Sealed {}
