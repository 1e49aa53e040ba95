use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One target path on the remote profiling API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Strengths,
    Challenges,
    Goals,
    Means,
    FullProfile,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Strengths,
        Endpoint::Challenges,
        Endpoint::Goals,
        Endpoint::Means,
        Endpoint::FullProfile,
    ];

    /// Path suffix appended to the API base URL. Trailing slash included,
    /// the API redirects without it.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Strengths => "/strengths/",
            Endpoint::Challenges => "/challenges/",
            Endpoint::Goals => "/goals/",
            Endpoint::Means => "/means/",
            Endpoint::FullProfile => "/profile/full/",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Strengths => "strengths",
            Endpoint::Challenges => "challenges",
            Endpoint::Goals => "goals",
            Endpoint::Means => "means",
            Endpoint::FullProfile => "full_profile",
        }
    }

    /// Whether the API expects multipart form data rather than JSON.
    pub fn expects_multipart(self) -> bool {
        matches!(self, Endpoint::FullProfile)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_matches('/').to_ascii_lowercase().as_str() {
            "strengths" => Ok(Endpoint::Strengths),
            "challenges" => Ok(Endpoint::Challenges),
            "goals" => Ok(Endpoint::Goals),
            "means" => Ok(Endpoint::Means),
            "full_profile" | "full" | "profile/full" => Ok(Endpoint::FullProfile),
            other => Err(format!("unknown endpoint '{other}'")),
        }
    }
}
