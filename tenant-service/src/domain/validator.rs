//! Redirect / TLS target validation.
//!
//! A domain is accepted only when every rule affirmatively passes. The input
//! must already be canonical (lowercase, no port, no trailing dot); callers
//! holding raw Host values normalize first.

use super::normalize::normalize;
use super::policy::DomainPolicy;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// DNS maximum for a full name.
pub const MAX_DOMAIN_LENGTH: usize = 253;

static DOMAIN_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}$").expect("domain grammar is a valid regex")
});

static DOTTED_QUAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("dotted quad is a valid regex"));

const LOOPBACK_LITERALS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "::1"];

#[derive(Debug, Clone)]
pub struct DomainValidator {
    policy: Arc<DomainPolicy>,
}

impl DomainValidator {
    pub fn new(policy: Arc<DomainPolicy>) -> Self {
        Self { policy }
    }

    /// Whether `domain` may be used as a redirect destination or TLS name.
    ///
    /// Rejects anything that is not a plain, canonical DNS name outside the
    /// platform root: addresses, loopback names, names under the root domain,
    /// and over-long or structurally broken input.
    pub fn is_valid_redirect_target(&self, domain: &str) -> bool {
        if !is_well_formed(domain) {
            return false;
        }

        if is_address_or_loopback(domain) {
            return false;
        }

        // Names under the root must be reached through subdomain resolution;
        // accepting them here would let one tenant claim another's namespace.
        if self.policy.is_platform_owned(domain) {
            return false;
        }

        true
    }
}

/// Structural checks shared by redirect-target validation and the TLS
/// endpoint's wildcard branch.
pub fn is_well_formed(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LENGTH {
        return false;
    }

    // Only canonical input: a string that normalization would change is
    // carrying a port, uppercase, or a trailing dot.
    if normalize(domain).as_deref() != Some(domain) {
        return false;
    }

    // Checked explicitly in case the caller passes partially decoded input.
    if domain.contains("..") || domain.chars().any(|c| c.is_control()) {
        return false;
    }

    DOMAIN_GRAMMAR.is_match(domain)
}

fn is_address_or_loopback(domain: &str) -> bool {
    if LOOPBACK_LITERALS.contains(&domain) {
        return true;
    }

    if domain.split('.').any(|label| label == "localhost") {
        return true;
    }

    if DOTTED_QUAD.is_match(domain) || domain.parse::<Ipv4Addr>().is_ok() {
        return true;
    }

    let unbracketed = domain
        .strip_prefix('[')
        .and_then(|d| d.strip_suffix(']'))
        .unwrap_or(domain);
    unbracketed.parse::<Ipv6Addr>().is_ok()
}
