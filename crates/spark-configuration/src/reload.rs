//! 配置重载通知。
//!
//! # 设计目的（Why）
//! - 配置根与提供者需要一种轻量句柄，告知读取方“底层数据已变化，应重新读取”；
//! - 前缀挂载层不自行产生通知，只把内层配置根的令牌原样转交给外层。
//!
//! # 契约说明（What）
//! - [`ReloadToken`] 是一次性信号：触发后 `has_changed` 永远为 `true`，之后注册的回调立即执行；
//! - [`ReloadTrigger`] 是可重复武装的生产端：每次 `fire` 都会先换入新令牌，再触发旧令牌；
//! - 组合令牌在任一子令牌触发时触发，且回调只执行一次。
//!
//! # 实现逻辑（How）
//! - `ReloadTrigger` 以 `ArcSwap` 保存当前信号，读取路径无锁，与 TLS 配置热更新容器的做法一致；
//! - 回调列表由 `parking_lot::Mutex` 保护，触发时先取出列表再在锁外执行，避免回调内重入死锁。

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

type ReloadCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Signal {
    fired: AtomicBool,
    callbacks: Mutex<Vec<ReloadCallback>>,
}

impl Signal {
    fn register(&self, callback: ReloadCallback) {
        {
            let mut callbacks = self.callbacks.lock();
            if !self.fired.load(Ordering::Acquire) {
                callbacks.push(callback);
                return;
            }
        }
        callback();
    }

    fn fire(&self) {
        let callbacks = {
            let mut callbacks = self.callbacks.lock();
            if self.fired.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }
}

#[derive(Clone)]
enum TokenKind {
    Never,
    Signal(Arc<Signal>),
    Composite(Arc<[ReloadToken]>),
}

/// 重载令牌：可克隆、可跨线程共享的一次性变更信号。
#[derive(Clone)]
pub struct ReloadToken {
    kind: TokenKind,
}

impl ReloadToken {
    /// 永不触发的令牌，供不支持变更通知的提供者使用。
    pub const fn never() -> Self {
        Self {
            kind: TokenKind::Never,
        }
    }

    /// 组合多个令牌。
    ///
    /// ### 契约说明（What）
    /// - 永不触发的子令牌会被剔除；剔除后为空时返回 [`ReloadToken::never`]，仅剩一个时直接返回该令牌；
    /// - 任一子令牌触发即视为组合令牌已变化。
    pub fn composite<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = ReloadToken>,
    {
        let mut active: Vec<ReloadToken> = tokens
            .into_iter()
            .filter(ReloadToken::is_active)
            .collect();
        match active.len() {
            0 => Self::never(),
            1 => active.pop().unwrap_or_else(Self::never),
            _ => Self {
                kind: TokenKind::Composite(active.into()),
            },
        }
    }

    /// 令牌是否可能触发。
    pub fn is_active(&self) -> bool {
        !matches!(self.kind, TokenKind::Never)
    }

    /// 底层数据是否已变化。
    pub fn has_changed(&self) -> bool {
        match &self.kind {
            TokenKind::Never => false,
            TokenKind::Signal(signal) => signal.fired.load(Ordering::Acquire),
            TokenKind::Composite(tokens) => tokens.iter().any(ReloadToken::has_changed),
        }
    }

    /// 注册变更回调。
    ///
    /// ### 契约说明（What）
    /// - 回调最多执行一次；令牌已触发时在当前线程立即执行；
    /// - 对 [`ReloadToken::never`] 注册的回调直接丢弃。
    pub fn register<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.register_boxed(Box::new(callback));
    }

    fn register_boxed(&self, callback: ReloadCallback) {
        match &self.kind {
            TokenKind::Never => {}
            TokenKind::Signal(signal) => signal.register(callback),
            TokenKind::Composite(tokens) => {
                let shared = Arc::new(Mutex::new(Some(callback)));
                for token in tokens.iter() {
                    let shared = Arc::clone(&shared);
                    token.register(move || {
                        let callback = shared.lock().take();
                        if let Some(callback) = callback {
                            callback();
                        }
                    });
                }
            }
        }
    }
}

impl Default for ReloadToken {
    fn default() -> Self {
        Self::never()
    }
}

impl fmt::Debug for ReloadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            TokenKind::Never => "never",
            TokenKind::Signal(_) => "signal",
            TokenKind::Composite(_) => "composite",
        };
        f.debug_struct("ReloadToken")
            .field("kind", &kind)
            .field("has_changed", &self.has_changed())
            .finish()
    }
}

/// 重载令牌的生产端。
pub struct ReloadTrigger {
    current: ArcSwap<Signal>,
}

impl ReloadTrigger {
    /// 创建处于武装状态的触发器。
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Signal::default()),
        }
    }

    /// 返回当前武装中的令牌。
    pub fn token(&self) -> ReloadToken {
        ReloadToken {
            kind: TokenKind::Signal(self.current.load_full()),
        }
    }

    /// 换入新令牌并触发旧令牌。
    ///
    /// 先换入再触发，回调中再次调用 [`ReloadTrigger::token`] 时拿到的是尚未触发的新令牌。
    pub fn fire(&self) {
        let previous = self.current.swap(Arc::new(Signal::default()));
        previous.fire();
    }
}

impl Default for ReloadTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReloadTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadTrigger").finish_non_exhaustive()
    }
}
