//! KDF in counter, feedback, and double pipeline iteration
//! modes (SP 800-108) test vectors.
//!
//! KDF-108 vector sets answer with results nested under their
//! `testGroups`, each echoing the group's `tgId`.
//!
//! See [ACVP] for the protocol.
//!
//! [ACVP]: https://pages.nist.gov/ACVP/

#![cfg(feature = "kdf108")]
#![cfg_attr(docsrs, doc(cfg(feature = "kdf108")))]

use alloc::{collections::BTreeSet, format, string::String, vec::Vec};

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info};

use crate::{
    buffer::Buffer,
    dispatch::invoke,
    error::{invalid_arg, Error, Result},
    record::TestCase,
    token,
    traits::CryptoHandler,
    util::{decode, decode_opt, fail, nonzero, output, required},
    vectors::{parse_group, CaseOutput, Encoder, GroupResult, Results, TestResult},
};

/// The maximum size in bytes of `keyIn`.
pub const KDF108_KEYIN_MAX_BYTES: usize = 512;
/// The maximum size in bits of the derived key.
pub const KDF108_KEYOUT_MAX_BITS: u32 = 4096;
/// The maximum size in bytes of the derived key.
pub const KDF108_KEYOUT_MAX_BYTES: usize = 512;
/// The maximum size in bytes of the feedback mode `iv`.
pub const KDF108_IV_MAX_BYTES: usize = 128;
/// The maximum size in bytes of the fixed input data.
pub const KDF108_FIXED_DATA_MAX_BYTES: usize = 64;

/// The KDF construction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KdfMode {
    /// SP 800-108 section 5.1.
    Counter,
    /// SP 800-108 section 5.2.
    Feedback,
    /// SP 800-108 section 5.3.
    DoublePipeline,
}

const KDF_MODES: &[(&str, KdfMode)] = &[
    ("counter", KdfMode::Counter),
    ("feedback", KdfMode::Feedback),
    ("double pipeline iteration", KdfMode::DoublePipeline),
];

impl KdfMode {
    /// Resolves a group's `kdfMode`.
    pub fn resolve(name: &str) -> Result<Self> {
        match token::resolve(KDF_MODES, name) {
            Some(m) => Ok(m),
            None => fail!(invalid_arg("kdfMode", format!("unknown mode `{name}`"))),
        }
    }

    /// Returns the protocol name of the mode.
    pub fn name(self) -> &'static str {
        token::name(KDF_MODES, self)
    }
}

/// The PRF the KDF is built on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum MacMode {
    HmacSha1,
    HmacSha2_224,
    HmacSha2_256,
    HmacSha2_384,
    HmacSha2_512,
    CmacAes128,
    CmacAes192,
    CmacAes256,
    CmacTdes,
}

const MAC_MODES: &[(&str, MacMode)] = &[
    ("HMAC-SHA-1", MacMode::HmacSha1),
    ("HMAC-SHA2-224", MacMode::HmacSha2_224),
    ("HMAC-SHA2-256", MacMode::HmacSha2_256),
    ("HMAC-SHA2-384", MacMode::HmacSha2_384),
    ("HMAC-SHA2-512", MacMode::HmacSha2_512),
    ("CMAC-AES128", MacMode::CmacAes128),
    ("CMAC-AES192", MacMode::CmacAes192),
    ("CMAC-AES256", MacMode::CmacAes256),
    ("CMAC-TDES", MacMode::CmacTdes),
];

impl MacMode {
    /// Resolves a group's `macMode`.
    pub fn resolve(name: &str) -> Result<Self> {
        match token::resolve(MAC_MODES, name) {
            Some(m) => Ok(m),
            None => fail!(invalid_arg("macMode", format!("unknown PRF `{name}`"))),
        }
    }

    /// Returns the protocol name of the PRF.
    pub fn name(self) -> &'static str {
        token::name(MAC_MODES, self)
    }
}

/// Where the counter sits relative to the fixed input data.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CounterLocation {
    /// `after fixed data`
    AfterFixedData,
    /// `before fixed data`
    BeforeFixedData,
    /// `middle fixed data`
    MiddleFixedData,
    /// `none`
    NoCounter,
    /// `before iterator`
    BeforeIterator,
}

const COUNTER_LOCATIONS: &[(&str, CounterLocation)] = &[
    ("after fixed data", CounterLocation::AfterFixedData),
    ("before fixed data", CounterLocation::BeforeFixedData),
    ("middle fixed data", CounterLocation::MiddleFixedData),
    ("none", CounterLocation::NoCounter),
    ("before iterator", CounterLocation::BeforeIterator),
];

impl CounterLocation {
    /// Resolves a group's `counterLocation`.
    pub fn resolve(name: &str) -> Result<Self> {
        match token::resolve(COUNTER_LOCATIONS, name) {
            Some(l) => Ok(l),
            None => fail!(invalid_arg(
                "counterLocation",
                format!("unknown location `{name}`")
            )),
        }
    }

    /// Returns the protocol name of the location.
    pub fn name(self) -> &'static str {
        token::name(COUNTER_LOCATIONS, self)
    }
}

/// A KDF-108 test group.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestGroup {
    /// Identifies the group.
    pub tg_id: Option<u32>,
    /// The KDF construction.
    pub kdf_mode: Option<String>,
    /// The PRF.
    pub mac_mode: Option<String>,
    /// The size in bits of the derived key.
    pub key_out_length: Option<u32>,
    /// The size in bits of the counter.
    pub counter_length: Option<u32>,
    /// Where the counter goes.
    pub counter_location: Option<String>,
    /// The test cases.
    pub tests: Option<Vec<Test>>,
}

/// A KDF-108 test case.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    /// Identifies the test case.
    pub tc_id: Option<u32>,
    /// The key derivation key.
    pub key_in: Option<String>,
    /// The initial value. Feedback mode only.
    pub iv: Option<String>,
    /// Whether the module chooses the fixed input data.
    pub deferred: Option<bool>,
}

/// A test group's resolved parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Params {
    /// The KDF construction.
    pub kdf_mode: KdfMode,
    /// The PRF.
    pub mac_mode: MacMode,
    /// The size in bits of the derived key.
    pub key_out_bits: u32,
    /// The size in bytes of the derived key.
    pub key_out_len: usize,
    /// The size in bits of the counter, or zero.
    pub counter_len: u32,
    /// Where the counter goes.
    pub counter_location: CounterLocation,
}

impl Params {
    /// Resolves and validates a test group's parameters.
    ///
    /// Nothing is allocated.
    pub fn resolve(group: &TestGroup) -> Result<Self> {
        let kdf_mode = KdfMode::resolve(required(group.kdf_mode.as_deref(), "kdfMode")?)?;
        let mac_mode = MacMode::resolve(required(group.mac_mode.as_deref(), "macMode")?)?;

        let key_out_bits = required(group.key_out_length, "keyOutLength")?;
        if key_out_bits == 0 || key_out_bits > KDF108_KEYOUT_MAX_BITS {
            fail!(invalid_arg(
                "keyOutLength",
                format!("{key_out_bits} is not in 1..={KDF108_KEYOUT_MAX_BITS}")
            ));
        }
        let key_out_len = usize::try_from(key_out_bits.div_ceil(8)).unwrap_or(usize::MAX);

        let counter_len = match (kdf_mode, group.counter_length) {
            (KdfMode::Counter, Some(n @ (8 | 16 | 24 | 32))) => n,
            (KdfMode::Counter, n) => fail!(invalid_arg(
                "counterLength",
                format!("{n:?} is not one of 8, 16, 24, or 32")
            )),
            (_, None) => 0,
            (_, Some(n @ (0 | 8 | 16 | 24 | 32))) => n,
            (_, Some(n)) => fail!(invalid_arg(
                "counterLength",
                format!("{n} is not one of 0, 8, 16, 24, or 32")
            )),
        };

        let counter_location = CounterLocation::resolve(required(
            group.counter_location.as_deref(),
            "counterLocation",
        )?)?;
        if kdf_mode == KdfMode::Counter
            && matches!(
                counter_location,
                CounterLocation::NoCounter | CounterLocation::BeforeIterator
            )
        {
            fail!(invalid_arg(
                "counterLocation",
                format!("`{}` is not valid in counter mode", counter_location.name())
            ));
        }

        Ok(Self {
            kdf_mode,
            mac_mode,
            key_out_bits,
            key_out_len,
            counter_len,
            counter_location,
        })
    }
}

/// A KDF-108 test-case record.
///
/// `key_in` and `iv` are inputs. The module writes the derived
/// key into `key_out` and the fixed input data it used into
/// `fixed_data`.
#[derive(Debug)]
pub struct Kdf108TestCase {
    /// Identifies the test case.
    pub tc_id: u32,
    /// The KDF construction.
    pub kdf_mode: KdfMode,
    /// The PRF.
    pub mac_mode: MacMode,
    /// Where the counter goes.
    pub counter_location: CounterLocation,
    /// The size in bits of the counter, or zero.
    pub counter_len: u32,
    /// The size in bits of the derived key.
    pub key_out_bits: u32,
    /// Whether the module chooses the fixed input data.
    pub deferred: bool,
    /// The key derivation key.
    pub key_in: Buffer,
    /// The initial value. Unallocated outside of feedback mode.
    pub iv: Buffer,
    /// The derived key. Its capacity is exactly the size of the
    /// derived key.
    pub key_out: Buffer,
    /// The fixed input data.
    pub fixed_data: Buffer,
}

impl Kdf108TestCase {
    /// Allocates and populates the record for one test case.
    ///
    /// Every required field is checked before anything is
    /// allocated.
    pub fn init(params: &Params, test: &Test, tc_id: u32) -> Result<Self> {
        let key_in = required(test.key_in.as_deref(), "keyIn")?;
        let iv = match params.kdf_mode {
            KdfMode::Feedback => Some(required(test.iv.as_deref(), "iv")?),
            KdfMode::Counter | KdfMode::DoublePipeline => None,
        };
        let deferred = required(test.deferred, "deferred")?;
        Ok(Self {
            tc_id,
            kdf_mode: params.kdf_mode,
            mac_mode: params.mac_mode,
            counter_location: params.counter_location,
            counter_len: params.counter_len,
            key_out_bits: params.key_out_bits,
            deferred,
            key_in: decode("keyIn", key_in, KDF108_KEYIN_MAX_BYTES)?,
            iv: decode_opt("iv", iv, KDF108_IV_MAX_BYTES)?,
            key_out: output(params.key_out_len)?,
            fixed_data: output(KDF108_FIXED_DATA_MAX_BYTES)?,
        })
    }

    /// Zeroes and frees every buffer.
    pub fn release(&mut self) {
        for buf in [
            &mut self.key_in,
            &mut self.iv,
            &mut self.key_out,
            &mut self.fixed_data,
        ] {
            buf.release();
        }
    }

    /// Builds the response fields.
    pub(crate) fn output(&self) -> Result<CaseOutput> {
        let mut enc = Encoder::new(KDF108_KEYOUT_MAX_BYTES)?;
        Ok(CaseOutput::Kdf108 {
            key_out: enc.encode("keyOut", &self.key_out)?,
            fixed_data: enc.encode("fixedData", &self.fixed_data)?,
        })
    }
}

/// Runs every test group of a KDF-108 vector set through
/// `module`.
pub(crate) fn run(groups: &[serde_json::Value], module: &mut dyn CryptoHandler) -> Result<Results> {
    let mut results = Vec::with_capacity(groups.len());
    for (tg_index, group) in groups.iter().enumerate() {
        let span = debug_span!("group", tg_index);
        let _guard = span.enter();

        let group: TestGroup = parse_group(group)?;
        let tg_id = match group.tg_id {
            Some(id) if id != 0 => id,
            _ => fail!(Error::MalformedDocument(
                "test group is missing `tgId`".into()
            )),
        };
        let params = Params::resolve(&group)?;
        info!(
            tg_id,
            kdf_mode = params.kdf_mode.name(),
            mac_mode = params.mac_mode.name(),
            key_out_bits = params.key_out_bits,
            counter_len = params.counter_len,
            counter_location = params.counter_location.name(),
            "test group"
        );

        let tests = required(group.tests.as_deref(), "tests")?;
        if tests.is_empty() {
            fail!(Error::MissingArgument("tests"));
        }
        let mut seen = BTreeSet::new();
        let mut group_results = Vec::with_capacity(tests.len());
        for test in tests {
            let tc_id = nonzero(test.tc_id, "tcId")?;
            if !seen.insert(tc_id) {
                fail!(invalid_arg("tcId", format!("duplicate tcId {tc_id}")));
            }
            let span = debug_span!("case", tc_id);
            let _guard = span.enter();
            debug!(tc_id, "test case");

            let mut tc = TestCase::Kdf108(Kdf108TestCase::init(&params, test, tc_id)?);
            invoke(module, &mut tc)?;
            let output = match tc.as_kdf108() {
                Some(kdf) => kdf.output()?,
                None => fail!(Error::CryptoModuleFailure(
                    "module replaced the KDF-108 test case".into()
                )),
            };
            tc.release();
            group_results.push(TestResult { tc_id, output });
        }
        results.push(GroupResult {
            tg_id,
            tests: group_results,
        });
    }
    Ok(Results::TestGroups(results))
}
