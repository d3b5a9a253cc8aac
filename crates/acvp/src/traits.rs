//! The boundary between the harness and the module under test.

use alloc::{boxed::Box, vec::Vec};
use core::fmt;

use crate::record::{Cipher, TestCase};

/// A cryptographic module under test.
///
/// The harness calls [`handle`][Self::handle] once per test case
/// with a fully populated record. Generation and derivation
/// handlers write their results into the record's output
/// buffers; verification handlers set the record's verdict.
///
/// Any error aborts the whole vector set.
pub trait CryptoHandler {
    /// Runs one test case.
    fn handle(&mut self, tc: &mut TestCase) -> anyhow::Result<()>;
}

impl<F> CryptoHandler for F
where
    F: FnMut(&mut TestCase) -> anyhow::Result<()>,
{
    fn handle(&mut self, tc: &mut TestCase) -> anyhow::Result<()> {
        self(tc)
    }
}

/// The operations a module under test supports.
#[derive(Default)]
pub struct Capabilities {
    handlers: Vec<(Cipher, Box<dyn CryptoHandler>)>,
}

impl Capabilities {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Registers `handler` for `cipher`, replacing any previous
    /// handler.
    pub fn register<H>(&mut self, cipher: Cipher, handler: H) -> &mut Self
    where
        H: CryptoHandler + 'static,
    {
        let handler: Box<dyn CryptoHandler> = Box::new(handler);
        match self.handlers.iter_mut().find(|(c, _)| *c == cipher) {
            Some((_, h)) => *h = handler,
            None => self.handlers.push((cipher, handler)),
        }
        self
    }

    /// Reports whether a handler is registered for `cipher`.
    pub fn contains(&self, cipher: Cipher) -> bool {
        self.handlers.iter().any(|(c, _)| *c == cipher)
    }

    /// Returns the handler registered for `cipher`.
    pub fn get_mut(&mut self, cipher: Cipher) -> Option<&mut (dyn CryptoHandler + 'static)> {
        self.handlers
            .iter_mut()
            .find(|(c, _)| *c == cipher)
            .map(|(_, h)| &mut **h)
    }

    /// Returns the registered ciphers in registration order.
    pub fn ciphers(&self) -> impl Iterator<Item = Cipher> + '_ {
        self.handlers.iter().map(|&(c, _)| c)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ciphers()).finish()
    }
}
