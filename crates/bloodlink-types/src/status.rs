use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role. Every route below `/api/donor` or `/api/hospital` is gated
/// on one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Hospital,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Donor => "donor",
            Self::Hospital => "hospital",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donor" => Ok(Self::Donor),
            "hospital" => Ok(Self::Hospital),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Lifecycle of a blood request.
///
/// The status is derived from how many donors have committed versus how many
/// persons the hospital asked for. `Closed` is terminal: once capacity is met
/// the request never goes back to accepting responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Open,
    #[serde(rename = "Partially Filled")]
    PartiallyFilled,
    Closed,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::PartiallyFilled => "Partially Filled",
            Self::Closed => "Closed",
        }
    }

    /// Status implied by `responses` commitments against `persons` needed.
    pub fn for_response_count(responses: i64, persons: i64) -> Self {
        if responses >= persons {
            Self::Closed
        } else if responses > 0 {
            Self::PartiallyFilled
        } else {
            Self::Open
        }
    }

    /// Transition applied after a new response is recorded. A closed request
    /// stays closed whatever the count says.
    pub fn advance(self, responses: i64, persons: i64) -> Self {
        match self {
            Self::Closed => Self::Closed,
            Self::Open | Self::PartiallyFilled => Self::for_response_count(responses, persons),
        }
    }

    pub fn accepts_responses(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Partially Filled" => Ok(Self::PartiallyFilled),
            "Closed" => Ok(Self::Closed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Lifecycle of a single donor's commitment. `Donated` is permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseStatus {
    Pending,
    Donated,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Donated => "Donated",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Donated" => Ok(Self::Donated),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A stored enum value that doesn't match any known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}
