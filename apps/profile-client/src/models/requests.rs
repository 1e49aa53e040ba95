use std::fmt;

use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;
use crate::errors::ClientError;
use crate::payload::{Attachment, Payload};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Undefined,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed request body that is sent as JSON to a fixed endpoint.
pub trait JsonRequest: Serialize {
    const ENDPOINT: Endpoint;

    fn to_payload(&self) -> Result<Payload, ClientError> {
        Payload::from_serializable(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    pub description: String,
}

impl JsonRequest for StrengthsRequest {
    const ENDPOINT: Endpoint = Endpoint::Strengths;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    pub description: String,
}

impl JsonRequest for ChallengesRequest {
    const ENDPOINT: Endpoint = Endpoint::Challenges;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strengths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenges: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs: Option<Vec<String>>,
}

impl JsonRequest for GoalsRequest {
    const ENDPOINT: Endpoint = Endpoint::Goals;
}

/// Same profile fields as [`GoalsRequest`], plus the goals the means should serve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeansRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strengths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenges: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs: Option<Vec<String>>,
    pub goals: Vec<String>,
}

impl JsonRequest for MeansRequest {
    const ENDPOINT: Endpoint = Endpoint::Means;
}

/// Full-profile request. Sent as multipart form data so a document can ride along.
#[derive(Debug, Clone, PartialEq)]
pub struct FullProfileRequest {
    pub description: String,
    pub age: Option<f64>,
    pub gender: Gender,
    pub file: Option<Attachment>,
}

impl FullProfileRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            age: None,
            gender: Gender::Undefined,
            file: None,
        }
    }

    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new().field("description", self.description.as_str());
        if let Some(age) = self.age {
            payload.insert("age", age);
        }
        payload.insert("gender", self.gender.as_str());
        if let Some(file) = &self.file {
            payload.insert("file", file.clone());
        }
        payload
    }
}
