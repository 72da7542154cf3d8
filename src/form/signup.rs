//! Contractor signup form.

use serde::{Deserialize, Serialize};

use super::{is_blank, looks_like_email};

pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub business_name: String,
    pub trades: Vec<String>,
    pub service_area: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignupSection {
    Account,
    Business,
    ServiceArea,
}

impl SignupSection {
    pub const ALL: [SignupSection; 3] = [
        SignupSection::Account,
        SignupSection::Business,
        SignupSection::ServiceArea,
    ];
}

impl SignupForm {
    pub fn is_complete(&self, section: SignupSection) -> bool {
        match section {
            SignupSection::Account => {
                looks_like_email(&self.email)
                    && self.password.chars().count() >= MIN_PASSWORD_CHARS
                    && self.password == self.confirm_password
            }
            SignupSection::Business => {
                !is_blank(&self.business_name) && self.trades.iter().any(|t| !is_blank(t))
            }
            SignupSection::ServiceArea => {
                self.service_area.as_deref().is_some_and(|a| !is_blank(a))
                    || self.zip_code.as_deref().is_some_and(is_zip_code)
            }
        }
    }

    pub fn incomplete(&self) -> Vec<SignupSection> {
        SignupSection::ALL
            .into_iter()
            .filter(|s| !self.is_complete(*s))
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        SignupSection::ALL.iter().all(|s| self.is_complete(*s))
    }
}

fn is_zip_code(value: &str) -> bool {
    let value = value.trim();
    value.len() == 5 && value.bytes().all(|b| b.is_ascii_digit())
}
