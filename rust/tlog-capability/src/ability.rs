/// Ability that grants every other ability.
pub const WILDCARD: &str = "*";

/// Separator between the segments of a hierarchical ability.
pub const SEPARATOR: char = '/';

/// Abilities understood by the log service out of the box.
pub mod abilities {
    /// Append entries to a log.
    pub const APPEND: &str = "tlog/append";
    /// Read entries and heads from a log.
    pub const READ: &str = "tlog/read";
    /// Every administrative operation over a log.
    pub const ADMIN: &str = "tlog/admin";
    /// Revoke a previously issued credential.
    pub const REVOKE: &str = "tlog/admin/revoke";
    /// Change log configuration.
    pub const CONFIGURE: &str = "tlog/admin/configure";
    /// Add a blob referenced by log entries.
    pub const BLOB_ADD: &str = "blob/add";
    /// Permanently remove a blob. Never delegable through a chain.
    pub const BLOB_REMOVE: &str = "blob/remove";
}

/// Returns `true` when holding the `held` ability permits exercising the
/// `required` one.
///
/// That is the case when `held` is the [`WILDCARD`], when both are equal, or
/// when `required` is a strict path extension of `held` (`tlog/admin` allows
/// `tlog/admin/revoke` but not `tlog/administer`).
///
/// Resources are not considered here; callers pair this with an exact
/// resource comparison (see [`Capability::allows`]).
pub fn allows(held: &str, required: &str) -> bool {
    if held.is_empty() {
        return false;
    }

    if held == WILDCARD || held == required {
        return true;
    }

    match required.strip_prefix(held) {
        Some(rest) => rest.len() > 1 && rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// Returns `true` if `ability` is the [`WILDCARD`].
pub fn is_wildcard(ability: &str) -> bool {
    ability == WILDCARD
}

/// Checks that an ability is usable in a table or a credential: either the
/// [`WILDCARD`] or one or more non-empty segments without surrounding
/// separators.
pub fn is_well_formed(ability: &str) -> bool {
    if is_wildcard(ability) {
        return true;
    }

    !ability.is_empty()
        && ability
            .split(SEPARATOR)
            .all(|segment| !segment.is_empty() && segment != WILDCARD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn it_allows_everything_with_wildcard() {
        assert!(allows(WILDCARD, abilities::APPEND));
        assert!(allows(WILDCARD, abilities::BLOB_REMOVE));
        assert!(allows(WILDCARD, WILDCARD));
    }

    #[test]
    fn it_allows_exact_match() {
        assert!(allows(abilities::REVOKE, abilities::REVOKE));
    }

    #[test]
    fn it_allows_nested_abilities() {
        assert!(allows(abilities::ADMIN, abilities::REVOKE));
        assert!(allows(abilities::ADMIN, abilities::CONFIGURE));
        assert!(allows("tlog", abilities::REVOKE));
    }

    #[test]
    fn it_rejects_sibling_with_shared_prefix() {
        assert!(!allows(abilities::ADMIN, "tlog/administer"));
        assert!(!allows("blob", "blobs/add"));
    }

    #[test]
    fn it_rejects_broader_requirement() {
        assert!(!allows(abilities::REVOKE, abilities::ADMIN));
        assert!(!allows(abilities::APPEND, WILDCARD));
    }

    #[test]
    fn it_rejects_empty_and_trailing_separator() {
        assert!(!allows("", abilities::APPEND));
        assert!(!allows(abilities::ADMIN, "tlog/admin/"));
    }

    #[test]
    fn it_checks_well_formed_abilities() {
        assert!(is_well_formed(WILDCARD));
        assert!(is_well_formed(abilities::REVOKE));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("/tlog"));
        assert!(!is_well_formed("tlog//append"));
        assert!(!is_well_formed("tlog/*"));
    }

    fn ability() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{1,6}", 1..5).prop_map(|segments| segments.join("/"))
    }

    proptest! {
        #[test]
        fn wildcard_allows_any_ability(required in ability()) {
            prop_assert!(allows(WILDCARD, &required));
        }

        #[test]
        fn ability_allows_its_extensions(held in ability(), suffix in ability()) {
            let required = format!("{held}/{suffix}");
            prop_assert!(allows(&held, &required));
            prop_assert!(!allows(&required, &held));
        }

        #[test]
        fn only_wildcard_allows_wildcard(held in ability()) {
            prop_assert!(!allows(&held, WILDCARD));
        }
    }
}
