//! Administrative-region name canonicalization.
//!
//! Raw eBird `STATE` values for Sweden arrive as free text like
//! "Stockholms län" while the boundary reference keys on bare names like
//! "Stockholm". The transform: keep the first whitespace-separated token,
//! then strip its trailing `'s'` run. It is a heuristic. Multi-word county
//! names ("Västra Götalands län") lose everything after the first token,
//! and the strip assumes a Swedish genitive `-s`.

/// Normalize a raw region string, or `None` when the input has no token at
/// all (such rows are dropped by ingestion).
///
/// Trailing `'s'` characters are stripped one at a time, stopping before
/// the whole token is consumed: an all-`'s'` token collapses to `"s"`. The
/// output never ends in a strippable `'s'` and is never empty, so the
/// transform is idempotent over every input.
pub fn normalize(raw: &str) -> Option<String> {
    let mut token = raw.split_whitespace().next()?;
    while let Some(rest) = token.strip_suffix('s') {
        if rest.is_empty() {
            break;
        }
        token = rest;
    }
    Some(token.to_string())
}
