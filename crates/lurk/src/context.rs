//! The lifecycle context.
use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    config::Config,
    deferred::Deferred,
    error::Result,
    memo::MemoCache,
    platform::{NodeKey, Platform},
};

pub(crate) struct Inner<P: Platform> {
    pub(crate) platform: P,
    pub(crate) config: Config,
    pub(crate) memo: MemoCache,
    /// Frame load completions, keyed by an identity that does not hold the frame.
    pub(crate) frames: RefCell<HashMap<NodeKey, Deferred<Result<()>>>>,
}

/// Owns everything the lifecycle trackers share: the platform, the timing
/// config, the memoization cache and the frame table.
///
/// Cheap to clone; clones share all state. Most applications create one per
/// document and keep it for the life of the page (see `web::lifecycle` for the
/// browser's default context).
pub struct Lifecycle<P: Platform> {
    pub(crate) inner: Rc<Inner<P>>,
}

impl<P: Platform> Clone for Lifecycle<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: Platform> std::fmt::Debug for Lifecycle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("config", &self.inner.config)
            .field("memo", &self.inner.memo)
            .field("frames", &self.inner.frames.borrow().len())
            .finish()
    }
}

impl<P: Platform> Lifecycle<P> {
    pub fn new(platform: P) -> Self {
        Self::with_config(platform, Config::default())
    }

    pub fn with_config(platform: P, config: Config) -> Self {
        Lifecycle {
            inner: Rc::new(Inner {
                platform,
                config,
                memo: MemoCache::new(),
                frames: Default::default(),
            }),
        }
    }

    pub fn platform(&self) -> &P {
        &self.inner.platform
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn memo(&self) -> &MemoCache {
        &self.inner.memo
    }
}
