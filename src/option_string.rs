//! Per-query option string parser: a flat underscore-separated list of
//! `key.value` pairs (§6). Grounded directly on
//! `juniper::QueryHandle::parse_parameters` in the original source: `priv.<n>`
//! is only recognized as the leading token, and `log.<n>` / `debug.<n>` are
//! honored only once that leading check has set the privileged flag — a
//! `priv.` appearing later in the string is just an unknown key.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub privileged: bool,
    pub dynlength: Option<i64>,
    pub dynmatches: Option<i64>,
    pub dynsurmax: Option<i64>,
    pub near: Option<u32>,
    pub within: Option<u32>,
    pub onear: Option<u32>,
    pub stemmin: Option<usize>,
    pub stemext: Option<usize>,
    pub winsize: Option<usize>,
    pub winsize_fallback_multiplier: Option<usize>,
    pub max_match_candidates: Option<usize>,
    pub log_mask: u64,
    pub debug_mask: u64,
}

impl QueryOptions {
    pub fn parse(options: &str) -> QueryOptions {
        let mut parsed = QueryOptions::default();
        let mut rest = options;

        if let Some(tail) = rest.strip_prefix("priv.") {
            let (value, next) = take_number(tail);
            parsed.privileged = value.map(|n| n > 0).unwrap_or(false);
            rest = next;
            rest = skip_to_next_token(rest);
        }

        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix("dynlength.") {
                let (v, next) = take_number(tail);
                parsed.dynlength = v;
                rest = next;
            } else if let Some(tail) = rest.strip_prefix("dynmatches.") {
                let (v, next) = take_number(tail);
                parsed.dynmatches = v;
                rest = next;
            } else if let Some(tail) = rest.strip_prefix("dynsurmax.") {
                let (v, next) = take_number(tail);
                parsed.dynsurmax = v;
                rest = next;
            } else if let Some(tail) = rest.strip_prefix("near.") {
                let (v, next) = take_number(tail);
                parsed.near = v.map(|n| n.max(0) as u32);
                rest = next;
            } else if let Some(tail) = rest.strip_prefix("within.") {
                let (v, next) = take_number(tail);
                parsed.within = v.map(|n| n.max(0) as u32);
                rest = next;
            } else if let Some(tail) = rest.strip_prefix("onear.") {
                let (v, next) = take_number(tail);
                parsed.onear = v.map(|n| n.max(0) as u32);
                rest = next;
            } else if let Some(tail) = rest.strip_prefix("stemmin.") {
                let (v, next) = take_number(tail);
                parsed.stemmin = v.map(|n| n.max(0) as usize);
                rest = next;
            } else if let Some(tail) = rest.strip_prefix("stemext.") {
                let (v, next) = take_number(tail);
                parsed.stemext = v.map(|n| n.max(0) as usize);
                rest = next;
            } else if let Some(tail) = rest.strip_prefix("winsize_fallback_multiplier.") {
                let (v, next) = take_number(tail);
                parsed.winsize_fallback_multiplier = v.map(|n| n.max(0) as usize);
                rest = next;
            } else if let Some(tail) = rest.strip_prefix("winsize.") {
                let (v, next) = take_number(tail);
                parsed.winsize = v.map(|n| n.max(0) as usize);
                rest = next;
            } else if let Some(tail) = rest.strip_prefix("max_match_candidates.") {
                let (v, next) = take_number(tail);
                parsed.max_match_candidates = v.map(|n| n.max(0) as usize);
                rest = next;
            } else if parsed.privileged && rest.starts_with("log.") {
                let (v, next) = take_number(&rest[4..]);
                parsed.log_mask = v.unwrap_or(0) as u64;
                rest = next;
            } else if parsed.privileged && rest.starts_with("debug.") {
                let (v, next) = take_number(&rest[6..]);
                parsed.debug_mask = v.unwrap_or(0) as u64;
                rest = next;
            } else {
                tracing::debug!(token = %leading_token(rest), "unknown juniper option key, skipping");
                rest = skip_to_next_token(rest);
                continue;
            }
            rest = skip_to_next_token(rest);
        }

        parsed
    }
}

fn take_number(s: &str) -> (Option<i64>, &str) {
    let end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && *c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (digits, rest) = s.split_at(end);
    (digits.parse::<i64>().ok(), rest)
}

fn leading_token(s: &str) -> &str {
    match s.find('_') {
        Some(i) => &s[..i],
        None => s,
    }
}

fn skip_to_next_token(s: &str) -> &str {
    match s.find('_') {
        Some(i) => &s[i + 1..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_keys() {
        let o = QueryOptions::parse("near.4_dynlength.80_dynmatches.2");
        assert_eq!(o.near, Some(4));
        assert_eq!(o.dynlength, Some(80));
        assert_eq!(o.dynmatches, Some(2));
    }

    #[test]
    fn unprivileged_log_is_ignored() {
        let o = QueryOptions::parse("log.7");
        assert_eq!(o.log_mask, 0);
        assert!(!o.privileged);
    }

    #[test]
    fn priv_must_lead_to_unlock_log() {
        let o = QueryOptions::parse("priv.1_log.7_debug.3");
        assert!(o.privileged);
        assert_eq!(o.log_mask, 7);
        assert_eq!(o.debug_mask, 3);
    }

    #[test]
    fn priv_appearing_later_is_just_unknown() {
        let o = QueryOptions::parse("near.4_priv.1_log.7");
        assert!(!o.privileged);
        assert_eq!(o.log_mask, 0);
        assert_eq!(o.near, Some(4));
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let o = QueryOptions::parse("bogus.1_near.3");
        assert_eq!(o.near, Some(3));
    }
}
