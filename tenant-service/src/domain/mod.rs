//! Pure host and domain rules. Nothing in this module performs I/O.

pub mod assignment;
pub mod normalize;
pub mod policy;
pub mod rate_key;
pub mod reserved;
pub mod validator;

pub use assignment::AssignmentError;
pub use normalize::normalize;
pub use policy::{DomainPolicy, HostShape};
pub use rate_key::RateKeyExtractor;
pub use reserved::{ReservedWords, DEFAULT_RESERVED_WORDS};
pub use validator::{is_well_formed, DomainValidator, MAX_DOMAIN_LENGTH};
