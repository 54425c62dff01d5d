use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// 配置体系的统一错误类型。
///
/// ### 逻辑解析（How）
/// - `InvalidArgument`：注册阶段的参数校验失败，例如前缀为空；这是前缀挂载层自身唯一会产生的错误；
/// - `NoProviders`：向未注册任何数据源的配置根写入；
/// - `Conversion`：读取到的字符串无法解析为目标类型；
/// - `Source`：数据源在构建阶段无法产出提供者。
///
/// ### 契约说明（What）
/// - 内层配置根构建失败时，错误原样向外层 `build` 的调用方传播，不做包装；
/// - 键不存在不是错误，统一以 `None` 表达。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("invalid argument `{parameter}`: {reason}")]
    InvalidArgument {
        parameter: &'static str,
        reason: Cow<'static, str>,
    },
    #[error("no configuration providers registered; cannot set `{key}`")]
    NoProviders { key: String },
    #[error("value `{value}` at `{key}` cannot be converted to {target}")]
    Conversion {
        key: String,
        value: String,
        target: &'static str,
    },
    #[error("configuration source `{source_name}` failed: {context}")]
    Source {
        source_name: Cow<'static, str>,
        context: Cow<'static, str>,
    },
}

impl ConfigurationError {
    /// 构造参数校验错误。
    pub fn invalid_argument<R>(parameter: &'static str, reason: R) -> Self
    where
        R: Into<Cow<'static, str>>,
    {
        Self::InvalidArgument {
            parameter,
            reason: reason.into(),
        }
    }

    /// 构造数据源错误。
    pub fn source_failure<N, C>(source_name: N, context: C) -> Self
    where
        N: Into<Cow<'static, str>>,
        C: Into<Cow<'static, str>>,
    {
        Self::Source {
            source_name: source_name.into(),
            context: context.into(),
        }
    }

    /// 返回错误类别。
    pub fn kind(&self) -> ConfigurationErrorKind {
        match self {
            Self::InvalidArgument { .. } => ConfigurationErrorKind::InvalidArgument,
            Self::NoProviders { .. } => ConfigurationErrorKind::NoProviders,
            Self::Conversion { .. } => ConfigurationErrorKind::Conversion,
            Self::Source { .. } => ConfigurationErrorKind::Source,
        }
    }
}

/// 错误类别，便于调用方在不解构字段的情况下分支处理。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ConfigurationErrorKind {
    InvalidArgument,
    NoProviders,
    Conversion,
    Source,
}

impl fmt::Display for ConfigurationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NoProviders => "no_providers",
            Self::Conversion => "conversion",
            Self::Source => "source",
        };
        f.write_str(name)
    }
}

/// 配置 crate 统一使用的结果类型。
pub type Result<T, E = ConfigurationError> = core::result::Result<T, E>;

const _: fn() = || {
    fn assert_error_traits<T: std::error::Error + Send + Sync + 'static>() {}

    assert_error_traits::<ConfigurationError>();
};
