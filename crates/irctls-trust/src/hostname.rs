//! Hostname verification with RFC 2818 style wildcards.
//!
//! A `*` inside a label stands for one or more characters of the matching
//! label and never spans a `.`, so `*.example.com` covers `foo.example.com`
//! but not `foo.bar.example.com` or `example.com`.

use crate::certificate::Certificate;

/// Whether `certificate` was issued for `hostname`.
///
/// Common names are tried first, then DNS and IP subject alternative names.
#[must_use]
pub fn is_valid_for(certificate: &Certificate, hostname: &str) -> bool {
    if certificate
        .subject()
        .common_names
        .iter()
        .any(|cn| matches(cn, hostname))
    {
        return true;
    }

    certificate
        .alt_names()
        .iter()
        .any(|name| matches(&name.to_string(), hostname))
}

/// Match a certificate name (possibly containing wildcards) against a host.
#[must_use]
pub fn matches(pattern: &str, hostname: &str) -> bool {
    let pattern_labels: Vec<&str> = pattern.split('.').collect();
    let host_labels: Vec<&str> = hostname.split('.').collect();

    pattern_labels.len() == host_labels.len()
        && pattern_labels
            .iter()
            .zip(&host_labels)
            .all(|(p, h)| label_matches(p.as_bytes(), h.as_bytes()))
}

/// Glob match of one label. Runs in O(pattern * label): only the most
/// recent `*` is ever widened.
fn label_matches(pattern: &[u8], label: &[u8]) -> bool {
    let (mut p, mut l) = (0, 0);
    // Pattern index after the last `*` and the label index to resume from.
    let mut resume: Option<(usize, usize)> = None;

    while l < label.len() {
        match pattern.get(p) {
            Some(b'*') => {
                // Each `*` takes at least one character.
                resume = Some((p + 1, l + 1));
                p += 1;
                l += 1;
            }
            Some(&c) if c == label[l] => {
                p += 1;
                l += 1;
            }
            _ => match resume {
                Some((after_star, from)) => {
                    resume = Some((after_star, from + 1));
                    p = after_star;
                    l = from + 1;
                }
                None => return false,
            },
        }
    }

    p == pattern.len()
}
