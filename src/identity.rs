// 🪪 Identity capability
// "Identity persists, values change": every stored entity exposes a stable key.

/// Anything that can live in a [`Repository`](crate::repository::Repository).
///
/// Identities are compared case-insensitively; `"EST-001"` and `"est-001"`
/// name the same entity.
pub trait Identified {
    fn identity(&self) -> &str;
}

/// Normalized lookup key for an identity (Unicode lowercase).
pub fn identity_key(identity: &str) -> String {
    identity.to_lowercase()
}

/// Case-insensitive identity comparison.
pub fn same_identity(a: &str, b: &str) -> bool {
    a == b || identity_key(a) == identity_key(b)
}

/// True when the identity is empty or only whitespace.
pub fn is_blank(identity: &str) -> bool {
    identity.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_identity_ignores_case() {
        assert!(same_identity("EST-001", "est-001"));
        assert!(same_identity("Ñandú", "ñANDÚ"));
        assert!(!same_identity("EST-001", "EST-002"));
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   \t"));
        assert!(!is_blank(" x "));
    }
}
