use std::collections::BTreeSet;

/// Scopes granted to a caller at token issuance. Read-only to this service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    /// Parse the space-delimited `scope` claim. Repeated whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        Self(raw.split_whitespace().map(str::to_string).collect())
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_space_delimited_scopes() {
        let scopes = ScopeSet::parse("read:card  write:deck\tread:deck.admin ");
        assert!(scopes.contains("read:card"));
        assert!(scopes.contains("write:deck"));
        assert!(scopes.contains("read:deck.admin"));
        assert!(!scopes.contains("write:card"));
        assert_eq!(scopes.iter().count(), 3);
    }

    #[test]
    fn empty_claim_yields_empty_set() {
        assert!(ScopeSet::parse("").is_empty());
        assert!(ScopeSet::parse("   ").is_empty());
    }
}
