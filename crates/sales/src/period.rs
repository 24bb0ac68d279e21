use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar granularity for revenue buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Annual,
}

impl Period {
    /// Parse a period name, case-insensitively.
    ///
    /// Anything unrecognized (or absent) buckets daily instead of failing.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("weekly") => Period::Weekly,
            Some("monthly") => Period::Monthly,
            Some("annual") => Period::Annual,
            _ => Period::Daily,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Annual => "annual",
        }
    }

    /// Bucket key for a sale date.
    ///
    /// Keys sort chronologically as plain strings:
    /// daily `2025-05-03`, weekly ISO `2025-W18`, monthly `2025-05`, annual `2025`.
    pub fn bucket_key(self, date: NaiveDate) -> String {
        match self {
            Period::Daily => date.format("%Y-%m-%d").to_string(),
            Period::Weekly => {
                let week = date.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Period::Monthly => date.format("%Y-%m").to_string(),
            Period::Annual => format!("{:04}", date.year()),
        }
    }
}
