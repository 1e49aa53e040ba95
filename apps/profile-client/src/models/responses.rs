use serde::{Deserialize, Serialize};

/// Envelope wrapped around every recommendation the API returns.
/// `error` is set (and `data` empty) when generation failed or timed out server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: bool,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// The data when the API reported success, otherwise its message.
    pub fn into_result(self) -> Result<T, String> {
        match (self.error, self.data) {
            (false, Some(data)) => Ok(data),
            (_, _) => Err(self
                .message
                .unwrap_or_else(|| "API returned no data".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mean {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullProfileData {
    pub strengths: Option<Vec<String>>,
    pub challenges: Option<Vec<String>>,
    pub needs: Option<Vec<String>>,
    pub goals: Option<Vec<Goal>>,
    pub means: Option<Vec<Mean>>,
}
