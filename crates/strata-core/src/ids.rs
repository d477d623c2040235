//! ID prefix constants for all Strata entities.
//!
//! IDs are generated by the database as `{prefix}-{8 hex chars}`, e.g.
//! `itm-a3f8b2c1`. The prefix makes an ID self-describing in logs and CLI
//! output.

pub const PREFIX_ITEM: &str = "itm";
pub const PREFIX_DIGEST: &str = "dig";
pub const PREFIX_CANDIDATE: &str = "cnd";
pub const PREFIX_SYNTHESIS: &str = "syn";
pub const PREFIX_QUEUE_ITEM: &str = "que";

/// Every prefix in use, for exhaustive tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_ITEM,
    PREFIX_DIGEST,
    PREFIX_CANDIDATE,
    PREFIX_SYNTHESIS,
    PREFIX_QUEUE_ITEM,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn prefixes_are_unique_and_three_chars() {
        let unique: HashSet<_> = ALL_PREFIXES.iter().collect();
        assert_eq!(unique.len(), ALL_PREFIXES.len());
        for prefix in ALL_PREFIXES {
            assert_eq!(prefix.len(), 3, "prefix '{prefix}' should be 3 chars");
        }
    }
}
