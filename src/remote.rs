use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PortalError, Result};
use crate::models::User;

const USER_COLUMNS: &str = "id,email,full_name,role,created_at";

/// Read-only access to the hosted `users` table over Supabase REST.
#[derive(Debug)]
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct SupabaseErrorBody {
    message: Option<String>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn users_endpoint(&self) -> String {
        format!("{}/rest/v1/users?select={}", self.base_url, USER_COLUMNS)
    }

    pub fn fetch_users(&self) -> Result<Vec<User>> {
        let url = self.users_endpoint();
        debug!("Fetching users from {url}");

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Accept", "application/json")
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<SupabaseErrorBody>()
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_default();
            warn!("Supabase users request failed with status {status}");
            return Err(PortalError::Backend(format!(
                "Supabase request failed with status {}: {}",
                status, detail
            )));
        }

        Ok(response.json::<Vec<User>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_endpoint_trims_trailing_slash() {
        let client = SupabaseClient::new("https://campus.supabase.co/", "key");
        assert_eq!(
            client.users_endpoint(),
            "https://campus.supabase.co/rest/v1/users?select=id,email,full_name,role,created_at"
        );
    }

    #[test]
    fn test_user_rows_deserialize() {
        let body = r#"[{"id":"u1","email":"a@b.co","full_name":"A B","role":"placement_officer","created_at":"2025-06-01T10:00:00Z"}]"#;
        let users: Vec<User> = serde_json::from_str(body).unwrap();
        assert_eq!(users[0].role, crate::models::Role::PlacementOfficer);
    }
}
