//! Shared utility helpers.

/// Removes every backtick from an identifier, so that `` `p.d.t` ``,
/// `` `p`.`d`.`t` `` and `p.d.t` all compare equal.
#[inline]
pub fn strip_backticks(ident: &str) -> String {
    ident.trim().chars().filter(|c| *c != '`').collect()
}

/// Number of the first line shown in an excerpt centred on `line`.
#[inline]
pub fn excerpt_start(line: usize, context: usize) -> usize {
    line.saturating_sub(context)
}
