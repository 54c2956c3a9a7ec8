//! Canonical keys derived from free-text company data.

use url::Url;

/// Legal-entity suffixes stripped from the end of a name, already lowercased
/// and without punctuation.
const LEGAL_SUFFIXES: &[&str] = &["inc", "llc", "ltd", "corporation", "corp", "limited", "co"];

/// Canonicalise a company display name into its dedup key.
///
/// Lowercases, removes punctuation, strips trailing legal-entity suffixes
/// (repeatedly, so `"Acme Co. Ltd."` becomes `"acme"`) and collapses
/// whitespace. A suffix that is the only remaining word is kept.
///
/// This is exact-key normalisation only: `"IBM"` and
/// `"International Business Machines"` stay distinct.
#[must_use]
pub fn normalize_company_name(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|w| LEGAL_SUFFIXES.contains(w)) {
        words.pop();
    }

    words.join(" ")
}

/// Parse a stored website value into an absolute `http(s)` URL.
///
/// Values without an `http://` or `https://` scheme are read as bare hosts
/// and get `https://` prepended. Other schemes and values that do not parse
/// to a host yield `None`.
#[must_use]
pub fn parse_website_url(website_url: &str) -> Option<Url> {
    let raw = website_url.trim();
    if raw.is_empty() {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    let url = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Url::parse(raw)
    } else if raw.contains("://") {
        return None;
    } else {
        Url::parse(&format!("https://{raw}"))
    }
    .ok()?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Some(url),
        _ => None,
    }
}

/// Extract the host of a website URL, lowercased and without a leading `www.`.
///
/// Accepts bare hosts (`"acme.com/about"`) as well as full URLs. Returns
/// `None` when [`parse_website_url`] does.
#[must_use]
pub fn primary_domain(website_url: &str) -> Option<String> {
    let url = parse_website_url(website_url)?;
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    Some(host.to_string())
}
