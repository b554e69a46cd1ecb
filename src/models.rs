use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The logged-in user as the backend identifies it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRef {
    pub id: Uuid,
    pub username: String,
}

/// A single wardrobe item as returned by the backend
///
/// The client only holds a transient mirror of these records; `id` is the
/// sole key for selection and deletion. Records without an id or name are
/// never rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClothingItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default = "default_warmth")]
    pub warmth: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_warmth() -> i32 {
    5
}

impl ClothingItem {
    /// Warmth clamped into the displayable 1..=10 range
    pub fn warmth_level(&self) -> u8 {
        self.warmth.clamp(1, 10) as u8
    }
}

/// Generic `{success, message}` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherReport {
    pub temp: f32,
    pub feels_like: f32,
    pub desc: String,
    pub city: String,
}

/// Result of one multipart upload batch
///
/// `success_count`/`duplicate_count`/`fail_count` describe a partial outcome
/// that is still a successful response; `fail_details` may be absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub success_count: u32,
    #[serde(default)]
    pub duplicate_count: u32,
    #[serde(default)]
    pub fail_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_details: Option<Vec<String>>,
    #[serde(default)]
    pub items: Vec<ClothingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WardrobeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub items: Vec<ClothingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchDeleteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub success_count: u32,
    #[serde(default)]
    pub fail_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub items: Vec<ClothingItem>,
}

/// Styling preferences stored per user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub weight: Option<f32>,
    #[serde(default)]
    pub dislikes: Option<String>,
    #[serde(default)]
    pub custom_style_desc: Option<String>,
    #[serde(default)]
    pub thermal_preference: Option<String>,
    #[serde(default)]
    pub favorite_styles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

/// One past recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}
