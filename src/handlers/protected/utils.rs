use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{json, Map, Value};

use crate::auth::{ownership::base_scope, Action, AuthUser, Grant, ResourceKind};
use crate::error::ApiError;
use crate::models::Aggregate;

/// Gate on the base scope for `action` on `kind`, then resolve the owner and
/// check the tier scope.
pub fn authorize(
    auth_user: &AuthUser,
    requested_owner: Option<&str>,
    action: Action,
    kind: ResourceKind,
) -> Result<Grant, ApiError> {
    let base = base_scope(action, kind);
    if !auth_user.has_scope(&base) {
        tracing::debug!("{} lacks {}", auth_user.email, base);
        return Err(ApiError::forbidden(base));
    }

    let grant = crate::auth::authorize(&auth_user.scopes, &auth_user.email, requested_owner, action, kind)
        .map_err(|err| {
            tracing::debug!("{} denied {} on {}: {}", auth_user.email, action.verb(), kind, err);
            err
        })?;

    Ok(grant)
}

/// Unwrap a JSON body, turning extractor rejections into 400s.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::malformed("body", rejection.body_text())),
    }
}

/// Decode a new aggregate from a request body. Server-managed metadata must be
/// absent or null.
pub fn parse_new<T: Aggregate>(body: Value) -> Result<T, ApiError> {
    if !body.is_object() {
        return Err(ApiError::malformed("body", "Request body must be a JSON object"));
    }

    if body.get("mtgjsonApiMeta").is_some_and(|meta| !meta.is_null()) {
        return Err(ApiError::malformed(
            "mtgjsonApiMeta",
            "The mtgjsonApiMeta field must be null. It is filled out automatically on creation",
        ));
    }

    serde_json::from_value(body).map_err(|e| {
        ApiError::malformed("body", format!("Failed to decode {}: {}", T::KIND, e))
    })
}

/// A required, non-empty query parameter.
pub fn require_param(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::malformed(field, format!("The '{field}' query parameter is required")))
}

/// Treat `?key=` the same as an absent parameter.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `{<field>: n}`, merged into write confirmations.
pub fn count(field: &str, n: usize) -> Map<String, Value> {
    let mut extra = Map::new();
    extra.insert(field.into(), json!(n));
    extra
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ScopeSet;
    use crate::models::Deck;
    use serde_json::json;

    fn user(scopes: &str) -> AuthUser {
        AuthUser {
            email: "alice@x.com".into(),
            scopes: ScopeSet::parse(scopes),
        }
    }

    #[test]
    fn base_scope_is_checked_first() {
        let err = authorize(&user("write:deck.admin"), Some("bob@x.com"), Action::Write, ResourceKind::Deck)
            .unwrap_err();
        assert_eq!(err, ApiError::forbidden("write:deck"));

        let err = authorize(&user("write:deck"), Some("bob@x.com"), Action::Write, ResourceKind::Deck)
            .unwrap_err();
        assert_eq!(err, ApiError::forbidden("write:deck.admin"));

        let grant = authorize(&user("write:deck"), None, Action::Write, ResourceKind::Deck).unwrap();
        assert_eq!(grant.owner, "alice@x.com");
    }

    #[test]
    fn client_supplied_meta_is_rejected() {
        let body = json!({ "code": "ABC", "mtgjsonApiMeta": { "owner": "mallory@x.com" } });
        let err = parse_new::<Deck>(body).unwrap_err();
        assert!(matches!(err, ApiError::Malformed { ref field, .. } if field == "mtgjsonApiMeta"));

        let deck = parse_new::<Deck>(json!({ "code": "ABC", "mtgjsonApiMeta": null })).unwrap();
        assert_eq!(deck.code, "ABC");
    }

    #[test]
    fn non_object_bodies_are_malformed() {
        assert!(parse_new::<Deck>(json!([1, 2])).is_err());
        assert!(parse_new::<Deck>(json!({ "mainBoard": "not-a-list" })).is_err());
    }

    #[test]
    fn params_must_be_non_empty() {
        assert_eq!(require_param(Some(" ABC ".into()), "deckCode").unwrap(), "ABC");
        assert!(require_param(Some("".into()), "deckCode").is_err());
        assert!(require_param(None, "deckCode").is_err());
        assert_eq!(non_empty(Some("  ".into())), None);
    }
}
