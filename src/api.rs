//! Typed wrapper around the backend's HTTP surface
//!
//! Every method performs exactly one request and surfaces the first failure
//! to the caller; there are no retries. Calls that need an identity read it
//! from the shared session and fail fast with `Unauthenticated` before any
//! network I/O when no user is present.

use crate::error::ClientError;
use crate::models::{
    BatchDeleteResponse, HistoryResponse, LoginResponse, ProfileResponse,
    RecommendationResponse, StatusResponse, UploadResponse, UserProfile, WardrobeResponse,
    WeatherReport,
};
use crate::session::SessionState;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Placeholder style sent when the user picked none. The backend treats it
/// as a valid categorical value, not as "unset".
pub const DEFAULT_STYLE: &str = "unrestricted style";
/// Placeholder occasion, same contract as [`DEFAULT_STYLE`]
pub const DEFAULT_OCCASION: &str = "outing";

/// One compressed file ready for the multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The slice of the backend surface the workflows depend on, as a trait so
/// tests can script a backend
#[async_trait]
pub trait WardrobeApi: Send + Sync {
    async fn upload_images(&self, parts: Vec<UploadPart>) -> Result<UploadResponse, ClientError>;
    async fn get_wardrobe(&self) -> Result<WardrobeResponse, ClientError>;
    async fn delete_item(&self, item_id: i64) -> Result<StatusResponse, ClientError>;
    async fn batch_delete(&self, item_ids: &[i64]) -> Result<BatchDeleteResponse, ClientError>;
}

/// HTTP client over the wardrobe backend
pub struct ApiClient {
    base_url: String,
    session: SessionState,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &crate::config::ApiConfig, session: SessionState) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .user_agent("WardrobeClient/0.1.0")
            .build()
            .map_err(|e| ClientError::Network(format!("Client build failed: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        if !response.status().is_success() {
            return Err(ClientError::Network(format!(
                "HTTP {}",
                response.status()
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Json(format!("Failed to parse response: {}", e)))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        log::info!("Login attempt: {}", username);
        let response = self
            .http
            .post(self.endpoint("/api/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<StatusResponse, ClientError> {
        let response = self
            .http
            .post(self.endpoint("/api/register"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_weather(&self, city: &str) -> Result<WeatherReport, ClientError> {
        let response = self
            .http
            .get(self.endpoint("/api/weather"))
            .query(&[("city", city)])
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_recommendation(
        &self,
        city: &str,
        style: Option<&str>,
        occasion: Option<&str>,
    ) -> Result<RecommendationResponse, ClientError> {
        let user = self.session.require_user()?;
        log::info!("Recommendation request: user_id={}, city={}", user.id, city);
        let response = self
            .http
            .post(self.endpoint("/api/recommendation"))
            .form(&recommendation_fields(&user.id, city, style, occasion))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_profile(&self) -> Result<ProfileResponse, ClientError> {
        let user = self.session.require_user()?;
        let response = self
            .http
            .get(self.endpoint("/api/profile"))
            .query(&[("user_id", user.id.to_string())])
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn update_profile(&self, profile: &UserProfile) -> Result<StatusResponse, ClientError> {
        let user = self.session.require_user()?;
        let response = self
            .http
            .post(self.endpoint("/api/profile/update"))
            .form(&profile_fields(&user.id, profile))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_history(&self) -> Result<HistoryResponse, ClientError> {
        let user = self.session.require_user()?;
        let response = self
            .http
            .get(self.endpoint("/api/history"))
            .query(&[("user_id", user.id.to_string())])
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn delete_history(&self, history_id: i64) -> Result<StatusResponse, ClientError> {
        let user = self.session.require_user()?;
        let response = self
            .http
            .post(self.endpoint("/api/history/delete"))
            .form(&[
                ("user_id", user.id.to_string()),
                ("history_id", history_id.to_string()),
            ])
            .send()
            .await?;
        Self::parse(response).await
    }
}

#[async_trait]
impl WardrobeApi for ApiClient {
    async fn upload_images(&self, parts: Vec<UploadPart>) -> Result<UploadResponse, ClientError> {
        let user = self.session.require_user()?;
        log::info!("Uploading {} files: user_id={}", parts.len(), user.id);

        let mut form = reqwest::multipart::Form::new().text("user_id", user.id.to_string());
        for part in parts {
            let file = reqwest::multipart::Part::bytes(part.bytes)
                .file_name(part.file_name)
                .mime_str("image/jpeg")
                .map_err(|e| ClientError::Network(format!("Invalid multipart: {}", e)))?;
            form = form.part("files", file);
        }

        let response = self
            .http
            .post(self.endpoint("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn get_wardrobe(&self) -> Result<WardrobeResponse, ClientError> {
        let user = self.session.require_user()?;
        log::info!("Fetching wardrobe: user_id={}", user.id);
        let response = self
            .http
            .get(self.endpoint("/api/wardrobe"))
            .query(&[("user_id", user.id.to_string())])
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn delete_item(&self, item_id: i64) -> Result<StatusResponse, ClientError> {
        let user = self.session.require_user()?;
        let response = self
            .http
            .post(self.endpoint("/api/wardrobe/delete"))
            .form(&[
                ("user_id", user.id.to_string()),
                ("item_id", item_id.to_string()),
            ])
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn batch_delete(&self, item_ids: &[i64]) -> Result<BatchDeleteResponse, ClientError> {
        let user = self.session.require_user()?;
        log::info!("Batch delete of {} items: user_id={}", item_ids.len(), user.id);
        let response = self
            .http
            .post(self.endpoint("/api/wardrobe/batch-delete"))
            .form(&batch_delete_fields(&user.id, item_ids))
            .send()
            .await?;
        Self::parse(response).await
    }
}

/// Form fields for the recommendation call, with the placeholder defaults
/// applied when style/occasion are omitted
fn recommendation_fields(
    user_id: &Uuid,
    city: &str,
    style: Option<&str>,
    occasion: Option<&str>,
) -> Vec<(&'static str, String)> {
    vec![
        ("user_id", user_id.to_string()),
        ("city", city.to_string()),
        (
            "style",
            style.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_STYLE).to_string(),
        ),
        (
            "occasion",
            occasion
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_OCCASION)
                .to_string(),
        ),
    ]
}

/// Form fields for the batch delete call; `item_ids` is a repeated field
fn batch_delete_fields(user_id: &Uuid, item_ids: &[i64]) -> Vec<(&'static str, String)> {
    let mut fields = vec![("user_id", user_id.to_string())];
    for id in item_ids {
        fields.push(("item_ids", id.to_string()));
    }
    fields
}

fn profile_fields(user_id: &Uuid, profile: &UserProfile) -> Vec<(&'static str, String)> {
    let mut fields = vec![("user_id", user_id.to_string())];
    if let Some(gender) = &profile.gender {
        fields.push(("gender", gender.clone()));
    }
    if let Some(height) = profile.height {
        fields.push(("height", height.to_string()));
    }
    if let Some(weight) = profile.weight {
        fields.push(("weight", weight.to_string()));
    }
    if let Some(dislikes) = &profile.dislikes {
        fields.push(("dislikes", dislikes.clone()));
    }
    if let Some(desc) = &profile.custom_style_desc {
        fields.push(("custom_style_desc", desc.clone()));
    }
    if let Some(thermal) = &profile.thermal_preference {
        fields.push(("thermal_preference", thermal.clone()));
    }
    for style in &profile.favorite_styles {
        fields.push(("favorite_styles", style.clone()));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::models::UserRef;

    fn test_client() -> ApiClient {
        ApiClient::new(&ApiConfig::default(), SessionState::new()).unwrap()
    }

    #[tokio::test]
    async fn test_identity_calls_fail_fast_without_user() {
        // No network I/O happens; the session check rejects first
        let client = test_client();
        assert!(matches!(
            client.get_wardrobe().await,
            Err(ClientError::Unauthenticated)
        ));
        assert!(matches!(
            client.upload_images(Vec::new()).await,
            Err(ClientError::Unauthenticated)
        ));
        assert!(matches!(
            client.delete_item(42).await,
            Err(ClientError::Unauthenticated)
        ));
        assert!(matches!(
            client.batch_delete(&[1, 2]).await,
            Err(ClientError::Unauthenticated)
        ));
        assert!(matches!(
            client.get_recommendation("Taipei", None, None).await,
            Err(ClientError::Unauthenticated)
        ));
    }

    #[test]
    fn test_recommendation_defaults_are_placeholders() {
        let user_id = Uuid::new_v4();
        let fields = recommendation_fields(&user_id, "Taipei", None, Some(""));

        assert!(fields.contains(&("style", DEFAULT_STYLE.to_string())));
        assert!(fields.contains(&("occasion", DEFAULT_OCCASION.to_string())));

        let explicit = recommendation_fields(&user_id, "Taipei", Some("Streetwear"), None);
        assert!(explicit.contains(&("style", "Streetwear".to_string())));
    }

    #[test]
    fn test_batch_delete_fields_repeat_item_ids() {
        let user_id = Uuid::new_v4();
        let fields = batch_delete_fields(&user_id, &[1, 2, 3]);

        let ids: Vec<&str> = fields
            .iter()
            .filter(|(k, _)| *k == "item_ids")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(fields[0], ("user_id", user_id.to_string()));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..Default::default()
        };
        let session = SessionState::new();
        session.set_user(UserRef {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
        });
        let client = ApiClient::new(&config, session).unwrap();
        assert_eq!(client.endpoint("/api/wardrobe"), "http://localhost:8000/api/wardrobe");
    }
}
