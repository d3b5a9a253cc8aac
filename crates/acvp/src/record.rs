//! Test-case records.
//!
//! A [`TestCase`] holds one test case's decoded inputs and the
//! pre-allocated buffers the module under test writes its
//! outputs into. Each record is created, handed to the module,
//! serialized, and released within a single iteration of the
//! dispatch loop.

use core::fmt;

#[cfg(feature = "dsa")]
use crate::dsa::DsaTestCase;
#[cfg(feature = "kdf108")]
use crate::kdf108::Kdf108TestCase;

/// Identifies the operation a registered handler performs.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Cipher {
    /// DSA key pair generation.
    DsaKeyGen,
    /// DSA domain parameter generation.
    DsaPqgGen,
    /// DSA domain parameter verification.
    DsaPqgVer,
    /// DSA signature generation.
    DsaSigGen,
    /// DSA signature verification.
    DsaSigVer,
    /// SP 800-108 KDF in counter, feedback, or double pipeline
    /// iteration mode.
    Kdf108,
}

impl Cipher {
    /// Returns the cipher's name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DsaKeyGen => "DSA keyGen",
            Self::DsaPqgGen => "DSA pqgGen",
            Self::DsaPqgVer => "DSA pqgVer",
            Self::DsaSigGen => "DSA sigGen",
            Self::DsaSigVer => "DSA sigVer",
            Self::Kdf108 => "KDF-108",
        }
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// One test case, tagged by algorithm.
#[derive(Debug)]
#[non_exhaustive]
pub enum TestCase {
    /// A DSA test case.
    #[cfg(feature = "dsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "dsa")))]
    Dsa(DsaTestCase),
    /// A KDF-108 test case.
    #[cfg(feature = "kdf108")]
    #[cfg_attr(docsrs, doc(cfg(feature = "kdf108")))]
    Kdf108(Kdf108TestCase),
}

impl TestCase {
    /// Returns the test case identifier.
    pub fn tc_id(&self) -> u32 {
        match *self {
            #[cfg(feature = "dsa")]
            Self::Dsa(ref tc) => tc.tc_id,
            #[cfg(feature = "kdf108")]
            Self::Kdf108(ref tc) => tc.tc_id,
        }
    }

    /// Zeroes and frees every buffer the record owns.
    ///
    /// Releasing a record twice is harmless.
    pub fn release(&mut self) {
        match *self {
            #[cfg(feature = "dsa")]
            Self::Dsa(ref mut tc) => tc.release(),
            #[cfg(feature = "kdf108")]
            Self::Kdf108(ref mut tc) => tc.release(),
        }
    }

    /// Returns the DSA record, if this is one.
    #[cfg(feature = "dsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "dsa")))]
    pub fn as_dsa(&self) -> Option<&DsaTestCase> {
        match self {
            Self::Dsa(tc) => Some(tc),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// Returns the KDF-108 record, if this is one.
    #[cfg(feature = "kdf108")]
    #[cfg_attr(docsrs, doc(cfg(feature = "kdf108")))]
    pub fn as_kdf108(&self) -> Option<&Kdf108TestCase> {
        match self {
            Self::Kdf108(tc) => Some(tc),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}
