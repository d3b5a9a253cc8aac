//! Protocol token matching.
//!
//! ACVP selects modes with short strings from a closed
//! vocabulary. A value matches a token when it starts with the
//! token, byte for byte. When several tokens match (`SHA2-512`
//! and `SHA2-512/224`, say) the longest one wins.

/// Reports whether `value` starts with `token`.
pub(crate) fn has_prefix(value: &str, token: &str) -> bool {
    value.as_bytes().starts_with(token.as_bytes())
}

/// Resolves `value` against `table`.
pub(crate) fn resolve<T: Copy>(table: &[(&'static str, T)], value: &str) -> Option<T> {
    table
        .iter()
        .filter(|(token, _)| has_prefix(value, token))
        .max_by_key(|(token, _)| token.len())
        .map(|&(_, v)| v)
}

/// Returns the token for `v`.
pub(crate) fn name<T: Copy + PartialEq>(table: &[(&'static str, T)], v: T) -> &'static str {
    table
        .iter()
        .find(|&&(_, x)| x == v)
        .map_or("", |&(token, _)| token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    enum Hash {
        Sha512,
        Sha512_224,
        Sha512_256,
    }

    // Deliberately not sorted by length.
    const TABLE: &[(&str, Hash)] = &[
        ("SHA2-512", Hash::Sha512),
        ("SHA2-512/224", Hash::Sha512_224),
        ("SHA2-512/256", Hash::Sha512_256),
    ];

    #[test]
    fn test_longest_prefix_wins() {
        assert_eq!(resolve(TABLE, "SHA2-512"), Some(Hash::Sha512));
        assert_eq!(resolve(TABLE, "SHA2-512/224"), Some(Hash::Sha512_224));
        assert_eq!(resolve(TABLE, "SHA2-512/256"), Some(Hash::Sha512_256));
        assert_eq!(resolve(TABLE, "SHA2-512/384"), Some(Hash::Sha512));
    }

    #[test]
    fn test_no_case_folding() {
        assert_eq!(resolve(TABLE, "sha2-512"), None);
        assert_eq!(resolve(TABLE, "SHA2-51"), None);
        assert_eq!(resolve(TABLE, ""), None);
    }

    #[test]
    fn test_name() {
        assert_eq!(name(TABLE, Hash::Sha512_256), "SHA2-512/256");
        for &(token, v) in TABLE {
            assert_eq!(resolve(TABLE, name(TABLE, v)), Some(v), "{token}");
        }
    }
}
