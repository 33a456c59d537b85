use super::{AuthError, ScopeSet, VerifiedClaims};

/// Caller identity established for the lifetime of one request.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub email: String,
    pub scopes: ScopeSet,
}

impl AuthUser {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Project verified claims onto a caller identity.
///
/// No signature checks happen here; `claims` must come from a `TokenVerifier`.
pub fn extract_identity(claims: &VerifiedClaims, email_claim: &str) -> Result<AuthUser, AuthError> {
    let email = claims
        .claim_str(email_claim)
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AuthError::MissingEmail(email_claim.to_string()))?;

    Ok(AuthUser {
        email: email.to_string(),
        scopes: ScopeSet::parse(&claims.scope),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: serde_json::Value) -> VerifiedClaims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn extracts_email_and_scopes() {
        let c = claims(json!({
            "sub": "auth0|123",
            "email": "alice@x.com",
            "scope": "read:deck write:deck"
        }));
        let user = extract_identity(&c, "email").unwrap();
        assert_eq!(user.email, "alice@x.com");
        assert!(user.has_scope("read:deck"));
        assert!(user.has_scope("write:deck"));
        assert!(!user.has_scope("write:deck.admin"));
    }

    #[test]
    fn honours_namespaced_email_claim() {
        let c = claims(json!({
            "https://mtgjson.example/email": "bob@x.com",
            "scope": "read:card"
        }));
        let user = extract_identity(&c, "https://mtgjson.example/email").unwrap();
        assert_eq!(user.email, "bob@x.com");
    }

    #[test]
    fn missing_or_blank_email_is_rejected() {
        let c = claims(json!({ "scope": "read:card" }));
        assert_eq!(
            extract_identity(&c, "email").unwrap_err(),
            AuthError::MissingEmail("email".to_string())
        );

        let c = claims(json!({ "email": "  ", "scope": "read:card" }));
        assert!(extract_identity(&c, "email").is_err());
    }

    #[test]
    fn missing_scope_claim_yields_no_scopes() {
        let c = claims(json!({ "email": "carol@x.com" }));
        let user = extract_identity(&c, "email").unwrap();
        assert!(user.scopes.is_empty());
    }
}
