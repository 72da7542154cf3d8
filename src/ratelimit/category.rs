//! Request categories that quotas are tracked against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The class of endpoint a quota policy applies to.
///
/// This is a closed set, so every call site names a category that is
/// guaranteed to have a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Login, signup and password endpoints
    Auth,
    /// General file uploads
    Upload,
    /// Generic API protection
    General,
    /// Business create/update
    Business,
    /// Chat widget traffic
    Chat,
    /// Images attached to estimate requests and chat
    EstimateUpload,
}

impl Category {
    /// Every category, in table order.
    pub const ALL: [Category; 6] = [
        Category::Auth,
        Category::Upload,
        Category::General,
        Category::Business,
        Category::Chat,
        Category::EstimateUpload,
    ];

    /// Name used in store keys and configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Auth => "auth",
            Category::Upload => "upload",
            Category::General => "general",
            Category::Business => "business",
            Category::Chat => "chat",
            Category::EstimateUpload => "estimateUpload",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown rate limit category: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_table_order() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("auth".parse::<Category>().unwrap(), Category::Auth);
        assert_eq!(
            "estimateUpload".parse::<Category>().unwrap(),
            Category::EstimateUpload
        );
        assert!("estimate_upload".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_names_match_display() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category));
        }
    }
}
