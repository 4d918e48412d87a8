use std::fmt;

use url::Url;

/// Supported scraper targets. Each kind pins the origin its catalog URLs
/// must live under and the path prefix catalog pages use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScrapeKind {
    Labirint,
    Intecron,
}

impl ScrapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeKind::Labirint => "labirint",
            ScrapeKind::Intecron => "intecron",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "labirint" => Some(ScrapeKind::Labirint),
            "intecron" => Some(ScrapeKind::Intecron),
            _ => None,
        }
    }

    pub fn origin(self) -> &'static str {
        match self {
            ScrapeKind::Labirint => "https://labirintdoors.ru",
            ScrapeKind::Intecron => "https://intecron-msk.ru",
        }
    }

    pub fn host(self) -> &'static str {
        match self {
            ScrapeKind::Labirint => "labirintdoors.ru",
            ScrapeKind::Intecron => "intecron-msk.ru",
        }
    }

    pub fn catalog_prefix(self) -> &'static str {
        match self {
            ScrapeKind::Labirint => "/katalog/",
            ScrapeKind::Intecron => "/catalog/",
        }
    }
}

impl fmt::Display for ScrapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Result of splitting submitted URLs into the ones worth sending and the
/// ones reported back to the user as dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlPartition {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

fn is_bare_slug(raw: &str) -> bool {
    // Slugs are alphanumeric/underscore only. Hyphenated or dotted input is
    // ambiguous with a malformed URL and must arrive as a path or absolute
    // URL instead of being expanded into a plausible catalog address.
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Expands user input into an absolute catalog URL for `kind`.
///
/// Already-absolute input is returned unchanged, which also makes the
/// operation idempotent. Bare paths get the kind's origin, bare slugs get
/// origin plus catalog prefix. Anything else is left for validation to
/// reject.
pub fn normalize_url(kind: ScrapeKind, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }
    if let Some(rest) = trimmed.strip_prefix('/') {
        return format!("{}/{}", kind.origin(), rest);
    }
    if is_bare_slug(trimmed) {
        return format!("{}{}{}", kind.origin(), kind.catalog_prefix(), trimmed);
    }
    trimmed.to_string()
}

/// A candidate is valid when it parses as http(s), sits on the kind's host
/// and its path continues past the kind's catalog prefix.
pub fn is_valid_catalog_url(kind: ScrapeKind, candidate: &str) -> bool {
    let Ok(parsed) = Url::parse(candidate) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    if parsed.host_str() != Some(kind.host()) {
        return false;
    }
    parsed
        .path()
        .strip_prefix(kind.catalog_prefix())
        .is_some_and(|rest| !rest.is_empty())
}

/// Normalizes every input and partitions the results by validity.
/// Invalid entries keep their original spelling so reports stay readable.
pub fn partition_urls(kind: ScrapeKind, raw_urls: &[String]) -> UrlPartition {
    let mut partition = UrlPartition::default();
    for raw in raw_urls {
        if raw.trim().is_empty() {
            continue;
        }
        let normalized = normalize_url(kind, raw);
        if is_valid_catalog_url(kind, &normalized) {
            partition.valid.push(normalized);
        } else {
            partition.invalid.push(raw.trim().to_string());
        }
    }
    partition
}
