use std::collections::HashSet;

/// Names that can never be claimed as a tenant subdomain: platform routes and
/// infrastructure hosts.
pub const DEFAULT_RESERVED_WORDS: &[&str] = &[
    "about", "account", "accounts", "admin", "administrator", "api", "app", "assets", "auth",
    "billing", "cdn", "dashboard", "dev", "docs", "email", "feed", "feeds", "ftp", "help",
    "imap", "login", "logout", "mail", "mx", "ns1", "ns2", "pop", "portal", "root", "rss",
    "security", "settings", "signup", "smtp", "staging", "static", "status", "subscribe",
    "support", "system", "terms", "webmail", "www",
];

/// Immutable set of reserved subdomain labels, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedWords {
    words: HashSet<String>,
}

impl ReservedWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_ascii_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Parses a comma separated list, e.g. from `RESERVED_WORDS`.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.words.contains(label)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for ReservedWords {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_WORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_covers_platform_names() {
        let reserved = ReservedWords::default();
        for word in ["admin", "api", "portal", "www", "dashboard"] {
            assert!(reserved.contains(word), "{word} should be reserved");
        }
        assert!(!reserved.contains("blog"));
    }

    #[test]
    fn csv_is_trimmed_and_lowercased() {
        let reserved = ReservedWords::from_csv(" Admin, api ,,WWW");
        assert_eq!(reserved.len(), 3);
        assert!(reserved.contains("admin"));
        assert!(reserved.contains("www"));
        assert!(!reserved.contains(""));
    }
}
