//! Parser pool
//!
//! Parsers keep their node arena and buffers between parses, so reusing
//! them avoids re-growing those allocations. A parser is checked out with
//! `acquire`, used by one thread, and handed back with `release`, which
//! resets it. Trees from a released parser are gone.

use crate::parser::Parser;
use log::debug;
use std::sync::{Mutex, OnceLock};

/// Default number of idle parsers kept by a pool
pub const DEFAULT_MAX_IDLE: usize = 64;

/// A pool of reusable parsers
#[derive(Debug)]
pub struct Pool {
    parsers: Mutex<Vec<Parser>>,
    max_idle: usize,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    /// Pool keeping at most `max_idle` parsers between uses
    pub fn with_max_idle(max_idle: usize) -> Self {
        Pool {
            parsers: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Take an idle parser, or create one
    pub fn acquire(&self) -> Parser {
        self.lock().pop().unwrap_or_default()
    }

    /// Reset a parser and keep it for reuse; dropped when the pool is full
    pub fn release(&self, mut parser: Parser) {
        parser.reset();
        let mut idle = self.lock();
        if idle.len() < self.max_idle {
            idle.push(parser);
        } else {
            debug!("parser pool full ({} idle), dropping parser", idle.len());
        }
    }

    /// Number of idle parsers
    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    /// A poisoned lock only means another thread panicked mid push/pop;
    /// the vector itself is still valid.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Parser>> {
        self.parsers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Process-wide pool used by the NIF layer and parallel formatting
pub fn default_pool() -> &'static Pool {
    static POOL: OnceLock<Pool> = OnceLock::new();
    POOL.get_or_init(Pool::new)
}
