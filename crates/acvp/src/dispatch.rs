//! Vector set routing.
//!
//! A [`Session`] picks the handler for a vector set from its
//! `algorithm` (and, for DSA, its `mode`), runs every test case
//! through the registered module, and builds the response.
//!
//! Groups and cases are processed strictly in document order.
//! The first error ends the run; no partial response is ever
//! produced.

use alloc::{format, string::String};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span, Level};

#[cfg(feature = "dsa")]
use crate::dsa;
#[cfg(feature = "kdf108")]
use crate::kdf108;
use crate::{
    config::Config,
    error::{invalid_arg, Error, Result},
    record::{Cipher, TestCase},
    token,
    traits::{Capabilities, CryptoHandler},
    util::{fail, required},
    vectors::{Response, Results, VectorSet},
};

/// Hands `tc` to the module under test.
///
/// Any failure becomes [`Error::CryptoModuleFailure`].
pub(crate) fn invoke(module: &mut dyn CryptoHandler, tc: &mut TestCase) -> Result<()> {
    match module.handle(tc) {
        Ok(()) => Ok(()),
        Err(err) => fail!(Error::CryptoModuleFailure(format!(
            "tcId {}: {err:#}",
            tc.tc_id()
        ))),
    }
}

/// The handler a vector set is routed to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Route {
    /// One of the DSA modes.
    #[cfg(feature = "dsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "dsa")))]
    Dsa(dsa::Mode),
    /// KDF-108.
    #[cfg(feature = "kdf108")]
    #[cfg_attr(docsrs, doc(cfg(feature = "kdf108")))]
    Kdf108,
}

impl Route {
    /// Selects the handler for a vector set's `algorithm` and
    /// `mode`.
    #[cfg_attr(not(feature = "dsa"), allow(unused_variables))]
    pub fn resolve(algorithm: &str, mode: Option<&str>) -> Result<Self> {
        if token::has_prefix(algorithm, "DSA") {
            #[cfg(feature = "dsa")]
            return Ok(Self::Dsa(dsa::Mode::resolve(required(mode, "mode")?)?));
            #[cfg(not(feature = "dsa"))]
            fail!(Error::UnsupportedOperation(format!(
                "`{algorithm}` requires the `dsa` feature"
            )));
        }
        if token::has_prefix(algorithm, "KDF") {
            #[cfg(feature = "kdf108")]
            return Ok(Self::Kdf108);
            #[cfg(not(feature = "kdf108"))]
            fail!(Error::UnsupportedOperation(format!(
                "`{algorithm}` requires the `kdf108` feature"
            )));
        }
        fail!(invalid_arg(
            "algorithm",
            format!("unknown algorithm `{algorithm}`")
        ))
    }

    /// Returns the [`Cipher`] whose handler runs the vector set.
    pub const fn cipher(self) -> Cipher {
        match self {
            #[cfg(feature = "dsa")]
            Self::Dsa(mode) => mode.cipher(),
            #[cfg(feature = "kdf108")]
            Self::Kdf108 => Cipher::Kdf108,
        }
    }
}

/// The `[{"acvVersion": ...}, ...]` response envelope header.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Version<'a> {
    acv_version: &'a str,
}

/// Processes vector sets against a module under test.
#[derive(Debug)]
pub struct Session {
    config: Config,
    capabilities: Capabilities,
}

impl Session {
    /// Creates a session.
    pub fn new(config: Config, capabilities: Capabilities) -> Self {
        Self {
            config,
            capabilities,
        }
    }

    /// Returns the session's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the registered capabilities.
    pub fn capabilities_mut(&mut self) -> &mut Capabilities {
        &mut self.capabilities
    }

    /// Runs every test case in `set` and returns the response.
    pub fn process(&mut self, set: &VectorSet<Value>) -> Result<Response> {
        let algorithm = required(set.algorithm.as_deref(), "algorithm")?;
        let vs_id = set.vs_id.unwrap_or(self.config.vs_id);

        let span = info_span!("vector_set", vs_id, algorithm);
        let _guard = span.enter();

        let route = Route::resolve(algorithm, set.mode.as_deref())?;
        let cipher = route.cipher();
        let Some(module) = self.capabilities.get_mut(cipher) else {
            fail!(Error::UnsupportedOperation(format!(
                "no handler registered for {cipher}"
            )));
        };

        let groups = required(set.test_groups.as_deref(), "testGroups")?;
        if groups.is_empty() {
            fail!(Error::MissingArgument("testGroups"));
        }
        info!(
            %cipher,
            groups = groups.len(),
            is_sample = set.is_sample.unwrap_or(false),
            "processing vector set"
        );

        let results: Results = match route {
            #[cfg(feature = "dsa")]
            Route::Dsa(mode) => dsa::run(mode, groups, module)?,
            #[cfg(feature = "kdf108")]
            Route::Kdf108 => kdf108::run(groups, module)?,
        };
        info!(cases = results.iter().count(), "vector set complete");

        Ok(Response {
            vs_id,
            algorithm: algorithm.into(),
            results,
        })
    }

    /// Parses the vector set `doc`, runs it, and serializes the
    /// response inside its `acvVersion` envelope.
    ///
    /// `doc` may be a bare vector set or one wrapped in the same
    /// envelope.
    pub fn process_str(&mut self, doc: &str) -> Result<String> {
        let set = parse(doc)?;
        let response = self.process(&set)?;

        let envelope = (
            Version {
                acv_version: &self.config.acv_version,
            },
            &response,
        );
        let out = if self.config.pretty {
            serde_json::to_string_pretty(&envelope)?
        } else {
            serde_json::to_string(&envelope)?
        };
        if self.config.pretty {
            debug!("response:\n{out}");
        } else if tracing::enabled!(Level::DEBUG) {
            debug!("response:\n{}", serde_json::to_string_pretty(&envelope)?);
        }
        Ok(out)
    }
}

/// Parses a vector set, unwrapping the envelope if present.
fn parse(doc: &str) -> Result<VectorSet<Value>> {
    let value = match serde_json::from_str::<Value>(doc) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .find(|v| v.get("acvVersion").is_none()),
        Ok(v) => Some(v),
        Err(err) => fail!(err),
    };
    let Some(value) = value else {
        fail!(Error::MalformedDocument(
            "envelope does not contain a vector set".into()
        ));
    };
    match serde_json::from_value(value) {
        Ok(set) => Ok(set),
        Err(err) => fail!(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_route() {
        #[cfg(feature = "dsa")]
        {
            let route = Route::resolve("DSA", Some("pqgVer")).unwrap();
            assert_eq!(route, Route::Dsa(dsa::Mode::PqgVer));
            assert_eq!(route.cipher(), Cipher::DsaPqgVer);
            assert_eq!(
                Route::resolve("DSA", None).unwrap_err(),
                Error::MissingArgument("mode")
            );
            assert_eq!(
                Route::resolve("DSA", Some("pqg")).unwrap_err().kind(),
                ErrorKind::InvalidArgument
            );
        }
        #[cfg(feature = "kdf108")]
        assert_eq!(Route::resolve("KDF", None).unwrap().cipher(), Cipher::Kdf108);

        assert_eq!(
            Route::resolve("ECDSA", Some("sigGen")).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_parse_envelope() {
        let set = parse(r#"[{"acvVersion":"1.0"},{"vsId":5,"algorithm":"KDF","testGroups":[]}]"#)
            .unwrap();
        assert_eq!(set.vs_id, Some(5));
        assert_eq!(set.algorithm.as_deref(), Some("KDF"));

        let err = parse(r#"[{"acvVersion":"1.0"}]"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);

        let err = parse(r#"{"vsId":"five"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);

        let err = parse("{").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    }

    #[test]
    fn test_unregistered_handler() {
        let mut session = Session::new(Config::default(), Capabilities::new());
        let err = session
            .process_str(r#"{"vsId":1,"algorithm":"KDF","testGroups":[{"tgId":1}]}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }
}
