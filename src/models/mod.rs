use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::AppError;

pub mod product;
pub mod raw_record;

// Re-exports for convenience
pub use product::*;
pub use raw_record::*;

/// Amazon marketplace a provider query is scoped to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Domain {
    Us,
    Gb,
    De,
    Fr,
    Jp,
    Ca,
    It,
    Es,
    In,
    Mx,
}

impl Domain {
    /// Numeric marketplace id used by the Keepa API.
    pub fn keepa_id(self) -> u8 {
        match self {
            Domain::Us => 1,
            Domain::Gb => 2,
            Domain::De => 3,
            Domain::Fr => 4,
            Domain::Jp => 5,
            Domain::Ca => 6,
            Domain::It => 8,
            Domain::Es => 9,
            Domain::In => 10,
            Domain::Mx => 11,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Domain::Us => "US",
            Domain::Gb => "GB",
            Domain::De => "DE",
            Domain::Fr => "FR",
            Domain::Jp => "JP",
            Domain::Ca => "CA",
            Domain::It => "IT",
            Domain::Es => "ES",
            Domain::In => "IN",
            Domain::Mx => "MX",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Domain {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Domain::Us),
            "GB" | "UK" => Ok(Domain::Gb),
            "DE" => Ok(Domain::De),
            "FR" => Ok(Domain::Fr),
            "JP" => Ok(Domain::Jp),
            "CA" => Ok(Domain::Ca),
            "IT" => Ok(Domain::It),
            "ES" => Ok(Domain::Es),
            "IN" => Ok(Domain::In),
            "MX" => Ok(Domain::Mx),
            other => Err(AppError::Validation(format!("Unknown domain: {}", other))),
        }
    }
}

impl TryFrom<String> for Domain {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Historical price series a product's canonical price is read from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PriceChannel {
    #[default]
    BuyBoxShipping,
    New,
}

impl PriceChannel {
    /// Position of the series inside the record's `csv` array.
    pub fn csv_index(self) -> usize {
        match self {
            PriceChannel::New => 1,
            PriceChannel::BuyBoxShipping => 18,
        }
    }

    /// Number of integers per data point: `[time, price]` or `[time, price, shipping]`.
    pub fn stride(self) -> usize {
        match self {
            PriceChannel::New => 2,
            PriceChannel::BuyBoxShipping => 3,
        }
    }
}
