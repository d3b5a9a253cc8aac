//! DSA (FIPS 186-4) test vectors.
//!
//! DSA vector sets carry a `mode`: `keyGen`, `pqgGen`, `pqgVer`,
//! `sigGen`, or `sigVer`. All five answer with a flat
//! `testResults` list.
//!
//! See [ACVP] for the protocol.
//!
//! [ACVP]: https://pages.nist.gov/ACVP/

#![cfg(feature = "dsa")]
#![cfg_attr(docsrs, doc(cfg(feature = "dsa")))]

use alloc::{collections::BTreeSet, format, string::String, vec::Vec};

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info};

use crate::{
    buffer::Buffer,
    dispatch::invoke,
    error::{invalid_arg, Error, Result},
    record::{Cipher, TestCase},
    token,
    traits::CryptoHandler,
    util::{decode, decode_opt, fail, nonzero, output, required},
    vectors::{parse_group, CaseOutput, Encoder, Results, TestResult, Verdict},
};

/// The maximum size in bytes of `p`, `q`, `g`, `x`, `y`, `r`,
/// and `s`.
pub const DSA_PQG_MAX_BYTES: usize = 384;
/// The maximum size in bytes of a domain parameter seed.
pub const DSA_SEED_MAX_BYTES: usize = 128;
/// The maximum size in bytes of a message.
pub const DSA_MSG_MAX_BYTES: usize = 1024;
/// The maximum size in bits of `p`.
pub const DSA_L_MAX_BITS: u32 = 3072;
/// The maximum size in bits of `q`.
pub const DSA_N_MAX_BITS: u32 = 256;

/// A DSA vector set mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Key pair generation.
    KeyGen,
    /// Domain parameter generation.
    PqgGen,
    /// Domain parameter verification.
    PqgVer,
    /// Signature generation.
    SigGen,
    /// Signature verification.
    SigVer,
}

const MODES: &[(&str, Mode)] = &[
    ("keyGen", Mode::KeyGen),
    ("pqgGen", Mode::PqgGen),
    ("pqgVer", Mode::PqgVer),
    ("sigGen", Mode::SigGen),
    ("sigVer", Mode::SigVer),
];

impl Mode {
    /// Resolves a vector set's `mode`.
    pub fn resolve(mode: &str) -> Result<Self> {
        match token::resolve(MODES, mode) {
            Some(m) => Ok(m),
            None => fail!(invalid_arg("mode", format!("unknown DSA mode `{mode}`"))),
        }
    }

    /// Returns the protocol name of the mode.
    pub fn name(self) -> &'static str {
        token::name(MODES, self)
    }

    /// Returns the [`Cipher`] that handles the mode.
    pub const fn cipher(self) -> Cipher {
        match self {
            Self::KeyGen => Cipher::DsaKeyGen,
            Self::PqgGen => Cipher::DsaPqgGen,
            Self::PqgVer => Cipher::DsaPqgVer,
            Self::SigGen => Cipher::DsaSigGen,
            Self::SigVer => Cipher::DsaSigVer,
        }
    }
}

/// The hash function used by a DSA test group.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum HashAlg {
    Sha1,
    Sha2_224,
    Sha2_256,
    Sha2_384,
    Sha2_512,
    Sha2_512_224,
    Sha2_512_256,
}

const HASH_ALGS: &[(&str, HashAlg)] = &[
    ("SHA-1", HashAlg::Sha1),
    ("SHA2-224", HashAlg::Sha2_224),
    ("SHA2-256", HashAlg::Sha2_256),
    ("SHA2-384", HashAlg::Sha2_384),
    ("SHA2-512", HashAlg::Sha2_512),
    ("SHA2-512/224", HashAlg::Sha2_512_224),
    ("SHA2-512/256", HashAlg::Sha2_512_256),
];

impl HashAlg {
    /// Resolves a group's `hashAlg`.
    pub fn resolve(name: &str) -> Result<Self> {
        match token::resolve(HASH_ALGS, name) {
            Some(h) => Ok(h),
            None => fail!(invalid_arg("hashAlg", format!("unknown hash `{name}`"))),
        }
    }

    /// Returns the protocol name of the hash.
    pub fn name(self) -> &'static str {
        token::name(HASH_ALGS, self)
    }
}

/// How domain parameters are generated or verified.
///
/// `Probable` and `Provable` come from a group's `pqMode` and
/// concern `p` and `q`. `Canonical` and `Unverifiable` come from
/// its `gMode` and concern `g`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PqgMode {
    /// FIPS 186-4 A.1.1.2.
    Probable,
    /// FIPS 186-4 A.1.2.
    Provable,
    /// FIPS 186-4 A.2.3.
    Canonical,
    /// FIPS 186-4 A.2.1.
    Unverifiable,
}

const PQ_MODES: &[(&str, PqgMode)] = &[
    ("probable", PqgMode::Probable),
    ("provable", PqgMode::Provable),
];

const G_MODES: &[(&str, PqgMode)] = &[
    ("canonical", PqgMode::Canonical),
    ("unverifiable", PqgMode::Unverifiable),
];

impl PqgMode {
    /// Resolves a group's `pqMode` and `gMode`.
    ///
    /// Exactly one of them must be present.
    pub fn resolve(pq_mode: Option<&str>, g_mode: Option<&str>) -> Result<Self> {
        let (table, field, value) = match (pq_mode, g_mode) {
            (Some(pq), None) => (PQ_MODES, "pqMode", pq),
            (None, Some(g)) => (G_MODES, "gMode", g),
            (Some(_), Some(_)) => fail!(invalid_arg(
                "gMode",
                "`pqMode` and `gMode` are mutually exclusive"
            )),
            (None, None) => fail!(Error::MissingArgument("pqMode")),
        };
        match token::resolve(table, value) {
            Some(m) => Ok(m),
            None => fail!(Error::UnsupportedOperation(format!(
                "{field} `{value}`"
            ))),
        }
    }

    /// Reports whether the mode concerns `p` and `q` (as opposed
    /// to `g`).
    pub const fn is_pq(self) -> bool {
        matches!(self, Self::Probable | Self::Provable)
    }

    /// Returns the protocol name of the mode.
    pub fn name(self) -> &'static str {
        if self.is_pq() {
            token::name(PQ_MODES, self)
        } else {
            token::name(G_MODES, self)
        }
    }
}

/// A DSA test group.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestGroup {
    /// Identifies the group.
    pub tg_id: Option<u32>,
    /// The size in bits of `p`.
    pub l: Option<u32>,
    /// The size in bits of `q`.
    pub n: Option<u32>,
    /// The hash function.
    pub hash_alg: Option<String>,
    /// How `p` and `q` are generated or verified.
    pub pq_mode: Option<String>,
    /// How `g` is generated or verified.
    pub g_mode: Option<String>,
    /// `sigVer` domain parameter `p`.
    pub p: Option<String>,
    /// `sigVer` domain parameter `q`.
    pub q: Option<String>,
    /// `sigVer` domain parameter `g`.
    pub g: Option<String>,
    /// The test cases.
    pub tests: Option<Vec<Test>>,
}

/// A DSA test case.
///
/// Which fields are present depends on the mode.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct Test {
    /// Identifies the test case.
    pub tc_id: Option<u32>,
    pub message: Option<String>,
    pub p: Option<String>,
    pub q: Option<String>,
    pub g: Option<String>,
    pub r: Option<String>,
    pub s: Option<String>,
    pub y: Option<String>,
    pub domain_seed: Option<String>,
    /// A hexadecimal string.
    pub index: Option<String>,
    pub counter: Option<i64>,
}

/// A test group's resolved parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Params {
    /// The vector set mode.
    pub mode: Mode,
    /// The size in bits of `p`.
    pub l: u32,
    /// The size in bits of `q`.
    pub n: u32,
    /// The hash function. Absent for `keyGen`.
    pub hash_alg: Option<HashAlg>,
    /// The domain parameter mode, for `pqgGen` and `pqgVer`.
    pub pqg_mode: Option<PqgMode>,
}

impl Params {
    /// Resolves and validates a test group's parameters.
    ///
    /// Nothing is allocated.
    pub fn resolve(mode: Mode, group: &TestGroup) -> Result<Self> {
        let l = required(group.l, "l")?;
        let n = required(group.n, "n")?;
        if l == 0 || l > DSA_L_MAX_BITS {
            fail!(invalid_arg(
                "l",
                format!("{l} is not in 1..={DSA_L_MAX_BITS}")
            ));
        }
        if n == 0 || n > DSA_N_MAX_BITS {
            fail!(invalid_arg(
                "n",
                format!("{n} is not in 1..={DSA_N_MAX_BITS}")
            ));
        }

        let hash_alg = match mode {
            Mode::KeyGen => None,
            _ => Some(HashAlg::resolve(required(
                group.hash_alg.as_deref(),
                "hashAlg",
            )?)?),
        };

        let pqg_mode = match mode {
            Mode::PqgGen | Mode::PqgVer => Some(PqgMode::resolve(
                group.pq_mode.as_deref(),
                group.g_mode.as_deref(),
            )?),
            _ => None,
        };
        if mode == Mode::PqgVer && pqg_mode == Some(PqgMode::Provable) {
            fail!(Error::UnsupportedOperation(
                "pqgVer with pqMode `provable`".into()
            ));
        }

        if mode == Mode::SigVer {
            required(group.p.as_ref(), "p")?;
            required(group.q.as_ref(), "q")?;
            required(group.g.as_ref(), "g")?;
        }

        Ok(Self {
            mode,
            l,
            n,
            hash_alg,
            pqg_mode,
        })
    }
}

/// A DSA test-case record.
#[derive(Debug)]
pub struct DsaTestCase {
    /// Identifies the test case.
    pub tc_id: u32,
    /// The size in bits of `p`.
    pub l: u32,
    /// The size in bits of `q`.
    pub n: u32,
    /// The hash function. Absent for `keyGen`.
    pub hash_alg: Option<HashAlg>,
    /// The mode specific inputs and outputs.
    pub op: DsaOp,
}

/// The mode specific half of a [`DsaTestCase`].
#[derive(Debug)]
#[allow(missing_docs)]
pub enum DsaOp {
    KeyGen(KeyGen),
    PqgGen(PqgGen),
    PqgVer(PqgVer),
    SigGen(SigGen),
    SigVer(SigVer),
}

/// Key pair generation. Every buffer is an output.
#[derive(Debug, Default)]
#[allow(missing_docs)]
pub struct KeyGen {
    pub p: Buffer,
    pub q: Buffer,
    pub g: Buffer,
    pub y: Buffer,
    pub x: Buffer,
}

/// Domain parameter generation.
///
/// For `probable` and `provable`, `p`, `q`, `domain_seed`, and
/// `counter` are outputs and `g` is unused.
///
/// For `canonical`, `p`, `q`, `domain_seed`, and `index` are
/// inputs. For `unverifiable`, `p` and `q` are. In both cases
/// `g` is the output.
#[derive(Debug)]
#[allow(missing_docs)]
pub struct PqgGen {
    pub mode: PqgMode,
    pub index: Option<u8>,
    pub p: Buffer,
    pub q: Buffer,
    pub domain_seed: Buffer,
    pub g: Buffer,
    pub counter: u32,
}

/// Domain parameter verification. Every buffer is an input;
/// the module sets `verdict`.
#[derive(Debug)]
#[allow(missing_docs)]
pub struct PqgVer {
    pub mode: PqgMode,
    pub index: Option<u8>,
    pub counter: u32,
    pub p: Buffer,
    pub q: Buffer,
    pub g: Buffer,
    pub domain_seed: Buffer,
    pub verdict: Option<bool>,
}

/// Signature generation. `msg` is the input; every other buffer
/// is an output.
#[derive(Debug, Default)]
#[allow(missing_docs)]
pub struct SigGen {
    pub msg: Buffer,
    pub p: Buffer,
    pub q: Buffer,
    pub g: Buffer,
    pub y: Buffer,
    pub r: Buffer,
    pub s: Buffer,
}

/// Signature verification. Every buffer is an input; the module
/// sets `verdict`.
#[derive(Debug, Default)]
#[allow(missing_docs)]
pub struct SigVer {
    pub msg: Buffer,
    pub p: Buffer,
    pub q: Buffer,
    pub g: Buffer,
    pub r: Buffer,
    pub s: Buffer,
    pub y: Buffer,
    pub verdict: Option<bool>,
}

/// Parses a canonical generator index.
fn parse_index(s: &str) -> Result<u8> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let ok = !digits.is_empty() && digits.bytes().all(|c| c.is_ascii_hexdigit());
    match u8::from_str_radix(digits, 16) {
        Ok(v) if ok => Ok(v),
        _ => fail!(invalid_arg(
            "index",
            format!("`{s}` is not an 8-bit hexadecimal value")
        )),
    }
}

impl KeyGen {
    fn init() -> Result<Self> {
        Ok(Self {
            p: output(DSA_PQG_MAX_BYTES)?,
            q: output(DSA_PQG_MAX_BYTES)?,
            g: output(DSA_PQG_MAX_BYTES)?,
            y: output(DSA_PQG_MAX_BYTES)?,
            x: output(DSA_PQG_MAX_BYTES)?,
        })
    }

    fn release(&mut self) {
        for buf in [&mut self.p, &mut self.q, &mut self.g, &mut self.y, &mut self.x] {
            buf.release();
        }
    }
}

impl PqgGen {
    fn init(mode: PqgMode, test: &Test) -> Result<Self> {
        match mode {
            PqgMode::Probable | PqgMode::Provable => Ok(Self {
                mode,
                index: None,
                p: output(DSA_PQG_MAX_BYTES)?,
                q: output(DSA_PQG_MAX_BYTES)?,
                domain_seed: output(DSA_SEED_MAX_BYTES)?,
                g: Buffer::new(),
                counter: 0,
            }),
            PqgMode::Canonical => {
                let p = required(test.p.as_deref(), "p")?;
                let q = required(test.q.as_deref(), "q")?;
                let seed = required(test.domain_seed.as_deref(), "domainSeed")?;
                let index = parse_index(required(test.index.as_deref(), "index")?)?;
                Ok(Self {
                    mode,
                    index: Some(index),
                    p: decode("p", p, DSA_PQG_MAX_BYTES)?,
                    q: decode("q", q, DSA_PQG_MAX_BYTES)?,
                    domain_seed: decode("domainSeed", seed, DSA_SEED_MAX_BYTES)?,
                    g: output(DSA_PQG_MAX_BYTES)?,
                    counter: 0,
                })
            }
            PqgMode::Unverifiable => {
                let p = required(test.p.as_deref(), "p")?;
                let q = required(test.q.as_deref(), "q")?;
                Ok(Self {
                    mode,
                    index: None,
                    p: decode("p", p, DSA_PQG_MAX_BYTES)?,
                    q: decode("q", q, DSA_PQG_MAX_BYTES)?,
                    domain_seed: Buffer::new(),
                    g: output(DSA_PQG_MAX_BYTES)?,
                    counter: 0,
                })
            }
        }
    }

    fn release(&mut self) {
        for buf in [
            &mut self.p,
            &mut self.q,
            &mut self.domain_seed,
            &mut self.g,
        ] {
            buf.release();
        }
    }
}

impl PqgVer {
    fn init(mode: PqgMode, test: &Test) -> Result<Self> {
        let p = required(test.p.as_deref(), "p")?;
        let q = required(test.q.as_deref(), "q")?;
        let mut index = None;
        let mut counter = 0;
        let (g, seed) = match mode {
            PqgMode::Canonical => {
                let g = required(test.g.as_deref(), "g")?;
                index = Some(parse_index(required(test.index.as_deref(), "index")?)?);
                (Some(g), test.domain_seed.as_deref())
            }
            PqgMode::Unverifiable => {
                let g = required(test.g.as_deref(), "g")?;
                (Some(g), test.domain_seed.as_deref())
            }
            PqgMode::Probable => {
                let seed = required(test.domain_seed.as_deref(), "domainSeed")?;
                counter = match test.counter {
                    None | Some(0) => fail!(Error::MissingArgument("counter")),
                    Some(c) => match u32::try_from(c) {
                        Ok(c) => c,
                        Err(_) => fail!(invalid_arg("counter", format!("{c} is out of range"))),
                    },
                };
                (None, Some(seed))
            }
            PqgMode::Provable => fail!(Error::UnsupportedOperation(
                "pqgVer with pqMode `provable`".into()
            )),
        };
        Ok(Self {
            mode,
            index,
            counter,
            p: decode("p", p, DSA_PQG_MAX_BYTES)?,
            q: decode("q", q, DSA_PQG_MAX_BYTES)?,
            g: decode_opt("g", g, DSA_PQG_MAX_BYTES)?,
            domain_seed: decode_opt("domainSeed", seed, DSA_SEED_MAX_BYTES)?,
            verdict: None,
        })
    }

    fn release(&mut self) {
        for buf in [
            &mut self.p,
            &mut self.q,
            &mut self.g,
            &mut self.domain_seed,
        ] {
            buf.release();
        }
    }
}

impl SigGen {
    fn init(test: &Test) -> Result<Self> {
        let msg = required(test.message.as_deref(), "message")?;
        Ok(Self {
            msg: decode("message", msg, DSA_MSG_MAX_BYTES)?,
            p: output(DSA_PQG_MAX_BYTES)?,
            q: output(DSA_PQG_MAX_BYTES)?,
            g: output(DSA_PQG_MAX_BYTES)?,
            y: output(DSA_PQG_MAX_BYTES)?,
            r: output(DSA_PQG_MAX_BYTES)?,
            s: output(DSA_PQG_MAX_BYTES)?,
        })
    }

    fn release(&mut self) {
        for buf in [
            &mut self.msg,
            &mut self.p,
            &mut self.q,
            &mut self.g,
            &mut self.y,
            &mut self.r,
            &mut self.s,
        ] {
            buf.release();
        }
    }
}

impl SigVer {
    fn init(group: &TestGroup, test: &Test) -> Result<Self> {
        let p = required(group.p.as_deref(), "p")?;
        let q = required(group.q.as_deref(), "q")?;
        let g = required(group.g.as_deref(), "g")?;
        let msg = required(test.message.as_deref(), "message")?;
        let r = required(test.r.as_deref(), "r")?;
        let s = required(test.s.as_deref(), "s")?;
        let y = required(test.y.as_deref(), "y")?;
        Ok(Self {
            msg: decode("message", msg, DSA_MSG_MAX_BYTES)?,
            p: decode("p", p, DSA_PQG_MAX_BYTES)?,
            q: decode("q", q, DSA_PQG_MAX_BYTES)?,
            g: decode("g", g, DSA_PQG_MAX_BYTES)?,
            r: decode("r", r, DSA_PQG_MAX_BYTES)?,
            s: decode("s", s, DSA_PQG_MAX_BYTES)?,
            y: decode("y", y, DSA_PQG_MAX_BYTES)?,
            verdict: None,
        })
    }

    fn release(&mut self) {
        for buf in [
            &mut self.msg,
            &mut self.p,
            &mut self.q,
            &mut self.g,
            &mut self.r,
            &mut self.s,
            &mut self.y,
        ] {
            buf.release();
        }
    }
}

impl DsaTestCase {
    /// Allocates and populates the record for one test case.
    ///
    /// Every required field is checked before anything is
    /// allocated.
    pub fn init(params: &Params, group: &TestGroup, test: &Test, tc_id: u32) -> Result<Self> {
        let op = match params.mode {
            Mode::KeyGen => DsaOp::KeyGen(KeyGen::init()?),
            Mode::PqgGen => DsaOp::PqgGen(PqgGen::init(
                required(params.pqg_mode, "pqMode")?,
                test,
            )?),
            Mode::PqgVer => DsaOp::PqgVer(PqgVer::init(
                required(params.pqg_mode, "pqMode")?,
                test,
            )?),
            Mode::SigGen => DsaOp::SigGen(SigGen::init(test)?),
            Mode::SigVer => DsaOp::SigVer(SigVer::init(group, test)?),
        };
        Ok(Self {
            tc_id,
            l: params.l,
            n: params.n,
            hash_alg: params.hash_alg,
            op,
        })
    }

    /// Zeroes and frees every buffer.
    pub fn release(&mut self) {
        match &mut self.op {
            DsaOp::KeyGen(op) => op.release(),
            DsaOp::PqgGen(op) => op.release(),
            DsaOp::PqgVer(op) => op.release(),
            DsaOp::SigGen(op) => op.release(),
            DsaOp::SigVer(op) => op.release(),
        }
    }

    /// Builds the response fields for the mode.
    ///
    /// Verdicts need no hex encoding, so only the generation
    /// modes allocate an encoder.
    pub(crate) fn output(&self) -> Result<CaseOutput> {
        let out = match &self.op {
            DsaOp::KeyGen(op) => {
                let mut enc = Encoder::new(DSA_PQG_MAX_BYTES)?;
                CaseOutput::KeyGen {
                    p: enc.encode("p", &op.p)?,
                    q: enc.encode("q", &op.q)?,
                    g: enc.encode("g", &op.g)?,
                    y: enc.encode("y", &op.y)?,
                    x: enc.encode("x", &op.x)?,
                }
            }
            DsaOp::PqgGen(op) if op.mode.is_pq() => {
                let mut enc = Encoder::new(DSA_PQG_MAX_BYTES)?;
                CaseOutput::PqgGenPq {
                    p: enc.encode("p", &op.p)?,
                    q: enc.encode("q", &op.q)?,
                    domain_seed: enc.encode("domainSeed", &op.domain_seed)?,
                    counter: op.counter,
                }
            }
            DsaOp::PqgGen(op) => {
                let mut enc = Encoder::new(DSA_PQG_MAX_BYTES)?;
                CaseOutput::PqgGenG {
                    g: enc.encode("g", &op.g)?,
                }
            }
            DsaOp::SigGen(op) => {
                let mut enc = Encoder::new(DSA_PQG_MAX_BYTES)?;
                CaseOutput::SigGen {
                    p: enc.encode("p", &op.p)?,
                    q: enc.encode("q", &op.q)?,
                    g: enc.encode("g", &op.g)?,
                    y: enc.encode("y", &op.y)?,
                    r: enc.encode("r", &op.r)?,
                    s: enc.encode("s", &op.s)?,
                }
            }
            DsaOp::PqgVer(PqgVer { verdict, .. }) | DsaOp::SigVer(SigVer { verdict, .. }) => {
                CaseOutput::Verdict {
                    result: Verdict::from_record(self.tc_id, *verdict),
                }
            }
        };
        Ok(out)
    }
}

/// Runs every test group of a DSA vector set through `module`.
pub(crate) fn run(
    mode: Mode,
    groups: &[serde_json::Value],
    module: &mut dyn CryptoHandler,
) -> Result<Results> {
    let mut results = Vec::new();
    for (tg_index, group) in groups.iter().enumerate() {
        let span = debug_span!("group", tg_index);
        let _guard = span.enter();

        let group: TestGroup = parse_group(group)?;
        let params = Params::resolve(mode, &group)?;
        info!(
            mode = mode.name(),
            l = params.l,
            n = params.n,
            hash_alg = params.hash_alg.map_or("", HashAlg::name),
            pqg_mode = params.pqg_mode.map_or("", PqgMode::name),
            "test group"
        );

        let tests = required(group.tests.as_deref(), "tests")?;
        if tests.is_empty() {
            fail!(Error::MissingArgument("tests"));
        }
        let mut seen = BTreeSet::new();
        for test in tests {
            let tc_id = nonzero(test.tc_id, "tcId")?;
            if !seen.insert(tc_id) {
                fail!(invalid_arg("tcId", format!("duplicate tcId {tc_id}")));
            }
            let span = debug_span!("case", tc_id);
            let _guard = span.enter();
            debug!(tc_id, "test case");

            let mut tc = TestCase::Dsa(DsaTestCase::init(&params, &group, test, tc_id)?);
            invoke(module, &mut tc)?;
            let output = match tc.as_dsa() {
                Some(dsa) => dsa.output()?,
                None => fail!(Error::CryptoModuleFailure(
                    "module replaced the DSA test case".into()
                )),
            };
            tc.release();
            results.push(TestResult { tc_id, output });
        }
    }
    Ok(Results::TestResults(results))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{buffer::live, ErrorKind};

    fn group_of(v: serde_json::Value) -> TestGroup {
        serde_json::from_value(v).unwrap()
    }

    fn case_of(v: serde_json::Value) -> Test {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_resolve_mode() {
        assert_eq!(Mode::resolve("pqgGen").unwrap(), Mode::PqgGen);
        assert_eq!(Mode::resolve("sigVer").unwrap(), Mode::SigVer);
        assert_eq!(
            Mode::resolve("SigVer").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(Mode::SigGen.cipher(), Cipher::DsaSigGen);
        assert_eq!(Mode::KeyGen.name(), "keyGen");
    }

    #[test]
    fn test_resolve_hash() {
        assert_eq!(HashAlg::resolve("SHA-1").unwrap(), HashAlg::Sha1);
        assert_eq!(HashAlg::resolve("SHA2-512").unwrap(), HashAlg::Sha2_512);
        assert_eq!(
            HashAlg::resolve("SHA2-512/224").unwrap(),
            HashAlg::Sha2_512_224
        );
        assert_eq!(
            HashAlg::resolve("SHA2-512/256").unwrap(),
            HashAlg::Sha2_512_256
        );
        assert_eq!(
            HashAlg::resolve("SHA3-256").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_resolve_pqg_mode() {
        assert_eq!(
            PqgMode::resolve(Some("probable"), None).unwrap(),
            PqgMode::Probable
        );
        assert_eq!(
            PqgMode::resolve(None, Some("unverifiable")).unwrap(),
            PqgMode::Unverifiable
        );
        assert_eq!(
            PqgMode::resolve(None, None).unwrap_err().kind(),
            ErrorKind::MissingArgument
        );
        assert_eq!(
            PqgMode::resolve(Some("probable"), Some("canonical"))
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidArgument
        );
        // A `gMode` token in the `pqMode` field.
        assert_eq!(
            PqgMode::resolve(Some("canonical"), None)
                .unwrap_err()
                .kind(),
            ErrorKind::UnsupportedOperation
        );
        assert_eq!(PqgMode::Canonical.name(), "canonical");
    }

    #[test]
    fn test_params() {
        let g = group_of(json!({
            "l": 2048, "n": 256, "hashAlg": "SHA2-256", "pqMode": "probable",
        }));
        let params = Params::resolve(Mode::PqgGen, &g).unwrap();
        assert_eq!(
            params,
            Params {
                mode: Mode::PqgGen,
                l: 2048,
                n: 256,
                hash_alg: Some(HashAlg::Sha2_256),
                pqg_mode: Some(PqgMode::Probable),
            }
        );

        // keyGen needs neither a hash nor a pqg mode.
        let params = Params::resolve(Mode::KeyGen, &group_of(json!({ "l": 1024, "n": 160 }))).unwrap();
        assert_eq!(params.hash_alg, None);
        assert_eq!(params.pqg_mode, None);
    }

    #[test]
    fn test_params_missing_fields() {
        let cases = [
            (Mode::KeyGen, json!({ "n": 256 }), "l"),
            (Mode::SigGen, json!({ "l": 2048, "n": 256 }), "hashAlg"),
            (
                Mode::PqgGen,
                json!({ "l": 2048, "n": 256, "hashAlg": "SHA2-256" }),
                "pqMode",
            ),
            (
                Mode::SigVer,
                json!({ "l": 2048, "n": 256, "hashAlg": "SHA2-256", "p": "01", "g": "02" }),
                "q",
            ),
        ];
        for (mode, g, field) in cases {
            let err = Params::resolve(mode, &group_of(g)).unwrap_err();
            assert_eq!(err, Error::MissingArgument(field), "{mode:?}");
        }
        assert_eq!(live::count(), 0);
    }

    #[test]
    fn test_params_bounds() {
        let err = Params::resolve(Mode::KeyGen, &group_of(json!({ "l": 4096, "n": 256 }))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = Params::resolve(Mode::KeyGen, &group_of(json!({ "l": 3072, "n": 384 }))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        // A declared zero is out of range, not absent.
        for (g, field) in [
            (json!({ "l": 0, "n": 160 }), "l"),
            (json!({ "l": 1024, "n": 0 }), "n"),
        ] {
            let err = Params::resolve(Mode::KeyGen, &group_of(g)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{field}");
            let Error::InvalidArgument(arg) = err else {
                panic!("wrong error");
            };
            assert_eq!(arg.arg(), field);
        }
        assert_eq!(live::count(), 0);

        let err = Params::resolve(
            Mode::PqgVer,
            &group_of(json!({ "l": 2048, "n": 224, "hashAlg": "SHA2-224", "pqMode": "provable" })),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("a5").unwrap(), 0xa5);
        assert_eq!(parse_index("0x01").unwrap(), 1);
        assert_eq!(parse_index("FF").unwrap(), 0xff);
        for bad in ["", "0x", "+1", "1ff", "zz"] {
            assert_eq!(
                parse_index(bad).unwrap_err().kind(),
                ErrorKind::InvalidArgument,
                "{bad}"
            );
        }
    }

    fn params(mode: Mode, pqg_mode: Option<PqgMode>) -> Params {
        Params {
            mode,
            l: 2048,
            n: 256,
            hash_alg: Some(HashAlg::Sha2_256),
            pqg_mode,
        }
    }

    #[test]
    fn test_pqg_ver_missing_conditional_fields() {
        let cases = [
            (PqgMode::Canonical, json!({ "tcId": 1, "p": "01", "q": "02", "g": "03" }), "index"),
            (PqgMode::Canonical, json!({ "tcId": 1, "p": "01", "q": "02", "index": "01" }), "g"),
            (PqgMode::Unverifiable, json!({ "tcId": 1, "p": "01", "q": "02" }), "g"),
            (PqgMode::Probable, json!({ "tcId": 1, "p": "01", "q": "02", "counter": 5 }), "domainSeed"),
            (
                PqgMode::Probable,
                json!({ "tcId": 1, "p": "01", "q": "02", "domainSeed": "aa", "counter": 0 }),
                "counter",
            ),
            (PqgMode::Probable, json!({ "tcId": 1, "q": "02" }), "p"),
        ];
        for (mode, t, field) in cases {
            let err = DsaTestCase::init(
                &params(Mode::PqgVer, Some(mode)),
                &TestGroup::default(),
                &case_of(t),
                1,
            )
            .unwrap_err();
            assert_eq!(err, Error::MissingArgument(field), "{mode:?}");
            assert_eq!(live::count(), 0, "{mode:?}");
        }
    }

    #[test]
    fn test_pqg_gen_canonical_missing_index() {
        let err = DsaTestCase::init(
            &params(Mode::PqgGen, Some(PqgMode::Canonical)),
            &TestGroup::default(),
            &case_of(json!({ "tcId": 3, "p": "01", "q": "02", "domainSeed": "03" })),
            3,
        )
        .unwrap_err();
        assert_eq!(err, Error::MissingArgument("index"));
        assert_eq!(live::count(), 0);
    }

    #[test]
    fn test_init_hex_failure_releases() {
        // `p` decodes, `q` does not.
        let err = DsaTestCase::init(
            &params(Mode::PqgVer, Some(PqgMode::Unverifiable)),
            &TestGroup::default(),
            &case_of(json!({ "tcId": 1, "p": "0102", "q": "xyz1", "g": "03" })),
            1,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::HexConversion {
                field: "q",
                source: crate::hex::HexError::InvalidCharacter,
            }
        );
        assert_eq!(live::count(), 0);
    }

    #[test]
    fn test_message_too_long() {
        let msg = "00".repeat(DSA_MSG_MAX_BYTES + 1);
        let err = DsaTestCase::init(
            &params(Mode::SigGen, None),
            &TestGroup::default(),
            &case_of(json!({ "tcId": 1, "message": msg })),
            1,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HexConversion);
        assert_eq!(live::count(), 0);
    }

    #[test]
    fn test_pqg_gen_probable_allocates_outputs_only() {
        let tc = DsaTestCase::init(
            &params(Mode::PqgGen, Some(PqgMode::Probable)),
            &TestGroup::default(),
            &case_of(json!({ "tcId": 1 })),
            1,
        )
        .unwrap();
        let DsaOp::PqgGen(op) = &tc.op else {
            panic!("wrong op: {:?}", tc.op);
        };
        assert_eq!(op.p.capacity(), DSA_PQG_MAX_BYTES);
        assert_eq!(op.q.capacity(), DSA_PQG_MAX_BYTES);
        assert_eq!(op.domain_seed.capacity(), DSA_SEED_MAX_BYTES);
        assert!(!op.g.is_allocated());
        assert_eq!(live::count(), 3);
    }

    #[test]
    fn test_pqg_gen_output_fields() {
        let mut tc = DsaTestCase::init(
            &params(Mode::PqgGen, Some(PqgMode::Probable)),
            &TestGroup::default(),
            &case_of(json!({ "tcId": 1 })),
            1,
        )
        .unwrap();
        let DsaOp::PqgGen(op) = &mut tc.op else {
            panic!("wrong op");
        };
        op.p.write(&[0xab; 4]).unwrap();
        op.q.write(&[0x01, 0x02]).unwrap();
        op.domain_seed.write(&[0xff]).unwrap();
        op.counter = 17;

        let out = serde_json::to_value(tc.output().unwrap()).unwrap();
        assert_eq!(
            out,
            json!({ "p": "ABABABAB", "q": "0102", "domainSeed": "FF", "counter": 17 })
        );
    }

    #[test]
    fn test_pqg_gen_canonical_output_is_g() {
        let mut tc = DsaTestCase::init(
            &params(Mode::PqgGen, Some(PqgMode::Canonical)),
            &TestGroup::default(),
            &case_of(json!({
                "tcId": 2, "p": "0b", "q": "05", "domainSeed": "c0ffee", "index": "0x5a",
            })),
            2,
        )
        .unwrap();
        let DsaOp::PqgGen(op) = &mut tc.op else {
            panic!("wrong op");
        };
        assert_eq!(op.index, Some(0x5a));
        assert_eq!(op.domain_seed.as_bytes(), &[0xc0, 0xff, 0xee]);
        op.g.write(&[0x04]).unwrap();

        let out = serde_json::to_value(tc.output().unwrap()).unwrap();
        assert_eq!(out, json!({ "g": "04" }));
    }

    #[test]
    fn test_verdict_output_allocates_nothing() {
        let group = group_of(json!({ "p": "0b", "q": "05", "g": "02" }));
        let mut tc = DsaTestCase::init(
            &params(Mode::SigVer, None),
            &group,
            &case_of(json!({ "tcId": 3, "message": "00", "r": "01", "s": "01", "y": "03" })),
            3,
        )
        .unwrap();
        let DsaOp::SigVer(op) = &mut tc.op else {
            panic!("wrong op");
        };
        op.verdict = Some(true);

        let before = live::total();
        let out = serde_json::to_value(tc.output().unwrap()).unwrap();
        assert_eq!(out, json!({ "result": "passed" }));
        assert_eq!(live::total(), before);

        let tc = DsaTestCase::init(
            &params(Mode::KeyGen, None),
            &TestGroup::default(),
            &case_of(json!({ "tcId": 4 })),
            4,
        )
        .unwrap();
        let before = live::total();
        tc.output().unwrap();
        assert_eq!(live::total(), before + 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut tc = DsaTestCase::init(
            &params(Mode::SigGen, None),
            &TestGroup::default(),
            &case_of(json!({ "tcId": 1, "message": "deadbeef" })),
            1,
        )
        .unwrap();
        assert_eq!(live::count(), 7);
        tc.release();
        assert_eq!(live::count(), 0);
        tc.release();
        assert_eq!(live::count(), 0);
        let DsaOp::SigGen(op) = &tc.op else {
            panic!("wrong op");
        };
        assert!(op.msg.is_empty());
        assert!(!op.msg.is_allocated());
    }
}
