/// Match `hostname` against a certificate name `pattern`.
///
/// The comparison ignores ASCII case.  A pattern may contain at most one
/// `*`, which must sit in its left-most label and be followed by `.` or
/// end the pattern.  The wildcard stands for a non-empty run of
/// characters that contains no dot, so `*.example.com` matches
/// `foo.example.com` but neither `example.com` nor `a.b.example.com`.
pub fn match_hostname(hostname: &str, pattern: &str) -> bool {
    let host = hostname.as_bytes();
    let pattern = pattern.as_bytes();

    let Some(star) = pattern.iter().position(|&b| b == b'*') else {
        return host.eq_ignore_ascii_case(pattern);
    };

    let (prefix, rest) = pattern.split_at(star);
    let suffix = &rest[1..];

    if suffix.contains(&b'*') || prefix.contains(&b'.') {
        return false;
    }

    if !suffix.is_empty() && suffix[0] != b'.' {
        return false;
    }

    if host.len() <= prefix.len() + suffix.len() {
        return false;
    }

    let (host_prefix, host_rest) = host.split_at(prefix.len());
    let (wild, host_suffix) = host_rest.split_at(host_rest.len() - suffix.len());

    host_prefix.eq_ignore_ascii_case(prefix)
        && host_suffix.eq_ignore_ascii_case(suffix)
        && !wild.contains(&b'.')
}

#[cfg(test)]
mod tests {
    use super::match_hostname;

    #[test]
    fn exact_names() {
        assert!(match_hostname("example.com", "example.com"));
        assert!(match_hostname("EXAMPLE.com", "example.com"));
        assert!(match_hostname("example.com", "Example.COM"));
        assert!(!match_hostname("example.org", "example.com"));
        assert!(!match_hostname("www.example.com", "example.com"));
        assert!(!match_hostname("", "example.com"));
    }

    #[test]
    fn wildcard_covers_one_label() {
        assert!(match_hostname("foo.example.com", "*.example.com"));
        assert!(match_hostname("FOO.Example.Com", "*.example.com"));
        assert!(!match_hostname("example.com", "*.example.com"));
        assert!(!match_hostname(".example.com", "*.example.com"));
        assert!(!match_hostname("a.b.example.com", "*.example.com"));
    }

    #[test]
    fn partial_label_wildcards() {
        assert!(match_hostname("foo1.example.com", "foo*.example.com"));
        assert!(!match_hostname("foo.example.com", "foo*.example.com"));
        assert!(!match_hostname("bar1.example.com", "foo*.example.com"));
        assert!(match_hostname("anything", "*"));
        assert!(!match_hostname("two.labels", "*"));
    }

    #[test]
    fn malformed_patterns_never_match() {
        assert!(!match_hostname("a.b.example.com", "*.*.example.com"));
        assert!(!match_hostname("foo.example.com", "**.example.com"));
        assert!(!match_hostname("foo.example.com", "f*o.example.com"));
        assert!(!match_hostname("www.foo.example.com", "www.*.example.com"));
        assert!(!match_hostname("foo.example.com", "*example.com"));
    }
}
