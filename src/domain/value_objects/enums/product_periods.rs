use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Billing period of an external store product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductPeriod {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl ProductPeriod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hour" | "hours" | "h" => Some(ProductPeriod::Hour),
            "day" | "days" | "d" => Some(ProductPeriod::Day),
            "week" | "weeks" | "w" => Some(ProductPeriod::Week),
            "month" | "months" | "m" => Some(ProductPeriod::Month),
            "year" | "years" | "y" => Some(ProductPeriod::Year),
            _ => None,
        }
    }

    /// Night count covered by `count` periods. An hourly product always covers one night.
    pub fn nights(&self, count: i32) -> i32 {
        let count = count.max(1);
        match self {
            ProductPeriod::Hour => 1,
            ProductPeriod::Day => count,
            ProductPeriod::Week => count.saturating_mul(7),
            ProductPeriod::Month => count.saturating_mul(30),
            ProductPeriod::Year => count.saturating_mul(365),
        }
    }
}

impl Display for ProductPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let period = match self {
            ProductPeriod::Hour => "hour",
            ProductPeriod::Day => "day",
            ProductPeriod::Week => "week",
            ProductPeriod::Month => "month",
            ProductPeriod::Year => "year",
        };
        write!(f, "{}", period)
    }
}
