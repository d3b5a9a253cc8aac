//! ACVP vector sets and response documents.
//!
//! A [`VectorSet`] is what the server sends; a [`Response`] is
//! what goes back. Group and case layouts are algorithm specific
//! and live next to their handlers (see [`dsa`][crate::dsa] and
//! [`kdf108`][crate::kdf108]).
//!
//! Every field of an incoming document is optional at the serde
//! level so that an absent field is reported as
//! [`Error::MissingArgument`] naming the field instead of as a
//! generic parse failure.

use alloc::{string::String, vec::Vec};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{
    buffer::Buffer,
    error::{Error, Result},
    hex,
    util::fail,
};

/// A set of test vectors.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSet<G> {
    /// Identifies the vector set.
    pub vs_id: Option<u64>,
    /// The algorithm being tested.
    pub algorithm: Option<String>,
    /// The algorithm mode, for multi-mode algorithms.
    pub mode: Option<String>,
    /// The protocol revision.
    pub revision: Option<String>,
    /// Are these sample vectors?
    pub is_sample: Option<bool>,
    /// Groups of test vectors.
    pub test_groups: Option<Vec<G>>,
}

/// Parses one test group.
pub(crate) fn parse_group<G: DeserializeOwned>(group: &serde_json::Value) -> Result<G> {
    match G::deserialize(group) {
        Ok(g) => Ok(g),
        Err(err) => fail!(err),
    }
}

/// The response to a [`VectorSet`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Identifies the vector set being answered.
    pub vs_id: u64,
    /// The algorithm being tested.
    pub algorithm: String,
    /// The results.
    #[serde(flatten)]
    pub results: Results,
}

/// The results of a vector set.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Results {
    /// A flat list of results.
    TestResults(Vec<TestResult>),
    /// Results nested by test group.
    TestGroups(Vec<GroupResult>),
}

impl Results {
    /// Iterates over every result in document order.
    pub fn iter(&self) -> impl Iterator<Item = &TestResult> {
        let (flat, nested): (&[TestResult], &[GroupResult]) = match self {
            Self::TestResults(v) => (v.as_slice(), &[]),
            Self::TestGroups(v) => (&[], v.as_slice()),
        };
        flat.iter().chain(nested.iter().flat_map(|g| g.tests.iter()))
    }
}

/// The results of one test group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    /// Identifies the group.
    pub tg_id: u32,
    /// The group's results.
    pub tests: Vec<TestResult>,
}

/// The result of one test case.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Identifies the test case.
    pub tc_id: u32,
    /// The mode specific output fields.
    #[serde(flatten)]
    pub output: CaseOutput,
}

/// The output fields of a test case.
///
/// Binary fields are uppercase hexadecimal.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CaseOutput {
    /// A verification verdict.
    Verdict {
        /// The verdict.
        result: Verdict,
    },
    /// Probable or provable DSA domain parameters.
    PqgGenPq {
        /// The prime modulus.
        p: String,
        /// The prime divisor of `p-1`.
        q: String,
        /// The seed `p` and `q` were generated from.
        #[serde(rename = "domainSeed")]
        domain_seed: String,
        /// The generation counter.
        counter: u32,
    },
    /// A canonical or unverifiable DSA generator.
    PqgGenG {
        /// The generator.
        g: String,
    },
    /// A DSA signature and the key that produced it.
    SigGen {
        /// The prime modulus.
        p: String,
        /// The prime divisor of `p-1`.
        q: String,
        /// The generator.
        g: String,
        /// The public key.
        y: String,
        /// The signature's `r` component.
        r: String,
        /// The signature's `s` component.
        s: String,
    },
    /// A DSA key pair and its domain parameters.
    KeyGen {
        /// The prime modulus.
        p: String,
        /// The prime divisor of `p-1`.
        q: String,
        /// The generator.
        g: String,
        /// The public key.
        y: String,
        /// The private key.
        x: String,
    },
    /// KDF-108 derived key material.
    Kdf108 {
        /// The derived key.
        #[serde(rename = "keyOut")]
        key_out: String,
        /// The fixed input data the module used.
        #[serde(rename = "fixedData")]
        fixed_data: String,
    },
}

/// The outcome of a verification test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The module accepted the input.
    Passed,
    /// The module rejected the input.
    Failed,
}

impl Verdict {
    /// Converts the verdict a module set on a record.
    ///
    /// A module that never set one is treated as having failed.
    pub(crate) fn from_record(tc_id: u32, verdict: Option<bool>) -> Self {
        match verdict {
            Some(v) => v.into(),
            None => {
                tracing::warn!(tc_id, "module did not set a verdict; reporting `failed`");
                Self::Failed
            }
        }
    }
}

impl From<bool> for Verdict {
    fn from(passed: bool) -> Self {
        if passed {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

/// Hex-encodes output fields through a single scratch buffer.
///
/// The scratch buffer is zeroed after every field.
pub(crate) struct Encoder {
    scratch: Buffer,
}

impl Encoder {
    /// Creates an encoder for fields of at most `max` bytes.
    pub(crate) fn new(max: usize) -> Result<Self> {
        let scratch = Buffer::with_capacity(max.saturating_mul(2))?;
        Ok(Self { scratch })
    }

    /// Encodes `field`.
    pub(crate) fn encode(&mut self, field: &'static str, src: &Buffer) -> Result<String> {
        let res = hex::bin_to_hex(src.as_bytes(), self.scratch.as_mut_capacity()).map(String::from);
        self.scratch.as_mut_capacity().zeroize();
        match res {
            Ok(s) => Ok(s),
            Err(err) => fail!(Error::hex(field, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_response_shape() {
        let resp = Response {
            vs_id: 9,
            algorithm: "KDF".into(),
            results: Results::TestGroups(alloc::vec![GroupResult {
                tg_id: 1,
                tests: alloc::vec![TestResult {
                    tc_id: 3,
                    output: CaseOutput::Kdf108 {
                        key_out: "AA".into(),
                        fixed_data: "BB".into(),
                    },
                }],
            }]),
        };
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "vsId": 9,
                "algorithm": "KDF",
                "testGroups": [{
                    "tgId": 1,
                    "tests": [{ "tcId": 3, "keyOut": "AA", "fixedData": "BB" }],
                }],
            })
        );
    }

    #[test]
    fn test_verdict() {
        let r = TestResult {
            tc_id: 7,
            output: CaseOutput::Verdict {
                result: Verdict::from_record(7, None),
            },
        };
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({ "tcId": 7, "result": "failed" })
        );
        assert_eq!(Verdict::from(true), Verdict::Passed);
    }

    #[test]
    fn test_results_iter_order() {
        let tr = |tc_id| TestResult {
            tc_id,
            output: CaseOutput::PqgGenG { g: "01".into() },
        };
        let nested = Results::TestGroups(alloc::vec![
            GroupResult {
                tg_id: 1,
                tests: alloc::vec![tr(5), tr(2)],
            },
            GroupResult {
                tg_id: 2,
                tests: alloc::vec![tr(9)],
            },
        ]);
        let ids = nested.iter().map(|r| r.tc_id).collect::<Vec<_>>();
        assert_eq!(ids, [5, 2, 9]);
    }

    #[test]
    fn test_encoder_clears_scratch() {
        let mut enc = Encoder::new(4).unwrap();
        let mut long = Buffer::with_capacity(4).unwrap();
        long.write(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
        let mut short = Buffer::with_capacity(1).unwrap();
        short.write(&[0x01]).unwrap();

        assert_eq!(enc.encode("p", &long).unwrap(), "DEADBEEF");
        assert!(enc.scratch.as_mut_capacity().iter().all(|&b| b == 0));
        assert_eq!(enc.encode("q", &short).unwrap(), "01");

        let mut big = Buffer::with_capacity(5).unwrap();
        big.write(&[0; 5]).unwrap();
        let err = enc.encode("g", &big).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::HexConversion);
    }

    #[test]
    fn test_parse_group_malformed() {
        #[derive(Debug, Deserialize)]
        struct G {
            #[allow(dead_code)]
            l: Option<u32>,
        }
        let err = parse_group::<G>(&json!({ "l": "big" })).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedDocument);
    }
}
