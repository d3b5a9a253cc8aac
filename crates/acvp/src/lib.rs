//! ACVP test-vector dispatch and marshalling.
//!
//! The harness takes a vector set issued by an [ACVP] server,
//! routes each test case through a module under test, and
//! builds the response document the server expects back.
//!
//! The module under test is registered per [`Cipher`] in a
//! [`Capabilities`] registry and is handed one populated
//! [`TestCase`] at a time.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "kdf108")]
//! # fn main() -> Result<(), acvp_harness::Error> {
//! use acvp_harness::{anyhow, Capabilities, Cipher, Config, Session, TestCase};
//!
//! let mut caps = Capabilities::new();
//! caps.register(Cipher::Kdf108, |tc: &mut TestCase| -> anyhow::Result<()> {
//!     let TestCase::Kdf108(kdf) = tc else {
//!         anyhow::bail!("unexpected test case");
//!     };
//!     let n = kdf.key_out.capacity();
//!     kdf.key_out.write(&vec![0xaa; n])?;
//!     kdf.fixed_data.write(b"label")?;
//!     Ok(())
//! });
//!
//! let mut session = Session::new(Config::default(), caps);
//! let response = session.process_str(
//!     r#"{
//!         "vsId": 42,
//!         "algorithm": "KDF",
//!         "testGroups": [{
//!             "tgId": 1,
//!             "kdfMode": "counter",
//!             "macMode": "HMAC-SHA2-256",
//!             "keyOutLength": 128,
//!             "counterLength": 8,
//!             "counterLocation": "after fixed data",
//!             "tests": [{ "tcId": 1, "keyIn": "00112233", "deferred": false }]
//!         }]
//!     }"#,
//! )?;
//! assert!(response.contains("keyOut"));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "kdf108"))]
//! # fn main() {}
//! ```
//!
//! [ACVP]: https://pages.nist.gov/ACVP/

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(any(test, doctest, feature = "std")), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod buffer;
pub mod config;
pub mod dispatch;
#[cfg(feature = "dsa")]
pub mod dsa;
pub mod error;
pub mod hex;
#[cfg(feature = "kdf108")]
pub mod kdf108;
pub mod record;
mod token;
pub mod traits;
mod util;
pub mod vectors;

pub use anyhow;
pub use buffer::Buffer;
pub use config::Config;
pub use dispatch::{Route, Session};
pub use error::{Error, ErrorKind, Result};
pub use record::{Cipher, TestCase};
pub use traits::{Capabilities, CryptoHandler};
pub use vectors::{Response, VectorSet, Verdict};
