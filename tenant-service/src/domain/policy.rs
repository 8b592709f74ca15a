//! Process-wide domain configuration: the platform root domain, the reserved
//! subdomain set, and whether the `.localhost` development suffix is honoured.
//!
//! Everything that decides "is this host ours" reads from one `DomainPolicy`
//! so the reserved list and the root-domain exclusion cannot drift apart.

use super::normalize::normalize;
use super::reserved::ReservedWords;

const LOCALHOST: &str = "localhost";
const LOCALHOST_SUFFIX: &str = ".localhost";

/// How a normalized host relates to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostShape<'a> {
    /// The root domain itself (or bare `localhost` in development).
    Platform,
    /// Exactly one label in front of the platform suffix.
    Subdomain(&'a str),
    /// More than one label, or an empty label, in front of the platform
    /// suffix. Never resolved.
    NestedSubdomain,
    /// Anything else; candidate custom domain.
    External,
}

#[derive(Debug, Clone)]
pub struct DomainPolicy {
    root_domain: String,
    root_suffix: String,
    development: bool,
    reserved: ReservedWords,
}

impl DomainPolicy {
    /// Returns `None` when `root_domain` does not normalize to a usable name.
    pub fn new(root_domain: &str, development: bool, reserved: ReservedWords) -> Option<Self> {
        let root_domain = normalize(root_domain)?;
        if !root_domain.contains('.') && root_domain != LOCALHOST {
            return None;
        }
        let root_suffix = format!(".{root_domain}");

        Some(Self {
            root_domain,
            root_suffix,
            development,
            reserved,
        })
    }

    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    pub fn is_development(&self) -> bool {
        self.development
    }

    pub fn is_reserved(&self, label: &str) -> bool {
        self.reserved.contains(label)
    }

    pub fn reserved_words(&self) -> &ReservedWords {
        &self.reserved
    }

    /// True for the root domain and every name beneath it.
    pub fn is_platform_owned(&self, host: &str) -> bool {
        host == self.root_domain || host.ends_with(&self.root_suffix)
    }

    /// True for hosts strictly beneath the root domain.
    pub fn is_under_root(&self, host: &str) -> bool {
        host.ends_with(&self.root_suffix)
    }

    /// Classifies an already-normalized host. Performs no I/O.
    pub fn classify<'a>(&self, host: &'a str) -> HostShape<'a> {
        if host == self.root_domain || (self.development && host == LOCALHOST) {
            return HostShape::Platform;
        }

        let remainder = host.strip_suffix(self.root_suffix.as_str()).or_else(|| {
            self.development
                .then(|| host.strip_suffix(LOCALHOST_SUFFIX))
                .flatten()
        });

        match remainder {
            Some(label) if !label.is_empty() && !label.contains('.') => HostShape::Subdomain(label),
            Some(_) => HostShape::NestedSubdomain,
            None => HostShape::External,
        }
    }
}
