use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackageCategory {
    #[default]
    Standard,
    Hosted,
    Addon,
    Special,
}

impl Display for PackageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let category = match self {
            PackageCategory::Standard => "standard",
            PackageCategory::Hosted => "hosted",
            PackageCategory::Addon => "addon",
            PackageCategory::Special => "special",
        };
        write!(f, "{}", category)
    }
}

impl PackageCategory {
    pub fn from_str(value: &str) -> Self {
        match value {
            "hosted" => PackageCategory::Hosted,
            "addon" => PackageCategory::Addon,
            "special" => PackageCategory::Special,
            _ => PackageCategory::Standard,
        }
    }
}
