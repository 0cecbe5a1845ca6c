// ABOUTME: Domain name normalization for DNS and CDN comparisons.
// ABOUTME: Lowercases and strips the trailing root dot so Route 53 and CDN names compare equal.

/// Normalize a domain for comparison: trimmed, lowercase, no trailing dot.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Compare two domains after normalization.
pub fn domains_match(a: &str, b: &str) -> bool {
    normalize_domain(a) == normalize_domain(b)
}

/// Whether `domain` equals `zone` or sits underneath it.
pub fn is_within_zone(domain: &str, zone: &str) -> bool {
    let domain = normalize_domain(domain);
    let zone = normalize_domain(zone);
    domain == zone || domain.ends_with(&format!(".{zone}"))
}
