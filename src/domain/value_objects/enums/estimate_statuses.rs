use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EstimateStatus {
    #[default]
    Quoted,
    Confirmed,
}

impl EstimateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateStatus::Quoted => "quoted",
            EstimateStatus::Confirmed => "confirmed",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "confirmed" => EstimateStatus::Confirmed,
            _ => EstimateStatus::Quoted,
        }
    }
}

impl Display for EstimateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
