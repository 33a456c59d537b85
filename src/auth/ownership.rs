//! Ownership-aware authorization.
//!
//! Every owned resource request names an owner (explicitly through a query
//! parameter or implicitly as the caller). The relationship between caller and
//! owner decides which scope has to be present:
//!
//! | tier     | read                 | write                |
//! |----------|----------------------|----------------------|
//! | `self`   | `read:<kind>`        | `write:<kind>`       |
//! | `system` | `read:<kind>.admin`  | `write:<kind>.wotc`  |
//! | `other`  | `read:<kind>.admin`  | `write:<kind>.admin` |

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::ScopeSet;

/// Owner value of pre-constructed / official content.
pub const SYSTEM_OWNER: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Card,
    Deck,
    Set,
    User,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Card => "card",
            ResourceKind::Deck => "deck",
            ResourceKind::Set => "set",
            ResourceKind::User => "user",
        }
    }

    /// Document collection backing this resource.
    pub fn collection(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

impl Action {
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[serde(rename = "self")]
    Own,
    System,
    Other,
}

impl Tier {
    /// `system` is checked before the caller comparison so that a request for
    /// the system owner is never treated as `other`.
    pub fn derive(caller_email: &str, owner: &str) -> Self {
        if owner == SYSTEM_OWNER {
            Tier::System
        } else if owner == caller_email {
            Tier::Own
        } else {
            Tier::Other
        }
    }
}

/// Scope gating `action` on `kind` regardless of tier.
pub fn base_scope(action: Action, kind: ResourceKind) -> String {
    format!("{}:{}", action.verb(), kind.as_str())
}

/// Scope required for `action` on a `kind` resource in `tier`.
pub fn required_scope(tier: Tier, action: Action, kind: ResourceKind) -> String {
    let base = base_scope(action, kind);
    match (tier, action) {
        (Tier::Own, _) => base,
        (Tier::System, Action::Write) => format!("{base}.wotc"),
        (Tier::System, Action::Read) | (Tier::Other, _) => format!("{base}.admin"),
    }
}

/// Outcome of a successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// Effective owner; the caller when none was requested.
    pub owner: String,
    pub tier: Tier,
    pub scope: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("missing required scope '{missing_scope}'")]
pub struct Forbidden {
    pub missing_scope: String,
}

/// Decide whether a caller holding `scopes` may perform `action` on a `kind`
/// resource owned by `requested_owner`. Pure; performs no I/O.
pub fn authorize(
    scopes: &ScopeSet,
    caller_email: &str,
    requested_owner: Option<&str>,
    action: Action,
    kind: ResourceKind,
) -> Result<Grant, Forbidden> {
    let owner = match requested_owner.map(str::trim) {
        Some(owner) if !owner.is_empty() => owner,
        _ => caller_email,
    };

    let tier = Tier::derive(caller_email, owner);
    let scope = required_scope(tier, action, kind);

    if !scopes.contains(&scope) {
        return Err(Forbidden { missing_scope: scope });
    }

    Ok(Grant {
        owner: owner.to_string(),
        tier,
        scope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "alice@x.com";
    const BOB: &str = "bob@x.com";

    fn scopes(raw: &str) -> ScopeSet {
        ScopeSet::parse(raw)
    }

    #[test]
    fn empty_owner_defaults_to_caller() {
        let grant = authorize(&scopes("read:deck"), ALICE, None, Action::Read, ResourceKind::Deck).unwrap();
        assert_eq!(grant.owner, ALICE);
        assert_eq!(grant.tier, Tier::Own);

        let grant = authorize(&scopes("read:deck"), ALICE, Some(""), Action::Read, ResourceKind::Deck).unwrap();
        assert_eq!(grant.owner, ALICE);
    }

    #[test]
    fn own_resources_need_only_base_scope() {
        for kind in [ResourceKind::Card, ResourceKind::Deck, ResourceKind::Set, ResourceKind::User] {
            for action in [Action::Read, Action::Write] {
                let base = base_scope(action, kind);
                let grant = authorize(&scopes(&base), ALICE, Some(ALICE), action, kind).unwrap();
                assert_eq!(grant.scope, base);
            }
        }
    }

    #[test]
    fn own_resources_ignore_tier_scopes() {
        let held = scopes("write:deck.admin write:deck.wotc");
        let err = authorize(&held, ALICE, Some(ALICE), Action::Write, ResourceKind::Deck).unwrap_err();
        assert_eq!(err.missing_scope, "write:deck");
    }

    #[test]
    fn system_write_requires_wotc_even_with_admin() {
        let held = scopes("write:deck write:deck.admin");
        let err = authorize(&held, ALICE, Some(SYSTEM_OWNER), Action::Write, ResourceKind::Deck).unwrap_err();
        assert_eq!(err.missing_scope, "write:deck.wotc");

        let held = scopes("write:deck.wotc");
        let grant = authorize(&held, ALICE, Some(SYSTEM_OWNER), Action::Write, ResourceKind::Deck).unwrap();
        assert_eq!(grant.tier, Tier::System);
        assert_eq!(grant.owner, SYSTEM_OWNER);
    }

    #[test]
    fn system_read_requires_admin_read_scope() {
        let err = authorize(&scopes("read:set"), ALICE, Some(SYSTEM_OWNER), Action::Read, ResourceKind::Set).unwrap_err();
        assert_eq!(err.missing_scope, "read:set.admin");
        assert!(authorize(&scopes("read:set.admin"), ALICE, Some(SYSTEM_OWNER), Action::Read, ResourceKind::Set).is_ok());
    }

    #[test]
    fn other_owner_requires_admin_scope() {
        let err = authorize(&scopes("write:deck"), ALICE, Some(BOB), Action::Write, ResourceKind::Deck).unwrap_err();
        assert_eq!(err.missing_scope, "write:deck.admin");

        let err = authorize(&scopes("read:deck"), ALICE, Some(BOB), Action::Read, ResourceKind::Deck).unwrap_err();
        assert_eq!(err.missing_scope, "read:deck.admin");

        let grant = authorize(&scopes("write:deck.admin"), ALICE, Some(BOB), Action::Write, ResourceKind::Deck).unwrap();
        assert_eq!(grant.tier, Tier::Other);
        assert_eq!(grant.owner, BOB);
    }

    #[test]
    fn caller_named_system_is_still_system_tier() {
        assert_eq!(Tier::derive(SYSTEM_OWNER, SYSTEM_OWNER), Tier::System);
    }
}
