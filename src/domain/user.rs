use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    /// Only checked locally, never sent.
    #[serde(skip_serializing)]
    pub confirm_password: String,
}
