//! Multi-step form state.
//!
//! Section completion is derived from the current field values on every
//! call and never stored.

mod accordion;
mod estimate;
mod signup;

pub use accordion::Accordion;
pub use estimate::{
    ContactMethod, EstimateForm, EstimatePanel, EstimateSection, MIN_DESCRIPTION_CHARS,
};
pub use signup::{SignupForm, SignupSection, MIN_PASSWORD_CHARS};

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// A loose shape check: one `@`, something before it and a dotted domain after.
fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !value.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}
