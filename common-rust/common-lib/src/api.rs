//! JSON bodies exchanged with the companion API.

use crate::likes::LikeStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OkResult<T> {
    pub ok: T,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ErrResult {
    pub err: ErrDetail,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ErrDetail {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(golem_rust::Schema))]
#[serde(rename_all = "kebab-case")]
pub struct PostView {
    pub post_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub body: String,
    pub media: Option<String>,
    pub likes_count: u32,
    pub comments_count: u32,
    pub liked_by_viewer: bool,
    pub created_at: DateTime<Utc>,
}

impl PostView {
    pub fn like_status(&self) -> LikeStatus {
        LikeStatus::new(self.liked_by_viewer, self.likes_count)
    }

    pub fn set_like_status(&mut self, status: LikeStatus) {
        self.liked_by_viewer = status.is_liked;
        self.likes_count = status.likes_count;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(golem_rust::Schema))]
#[serde(rename_all = "kebab-case")]
pub struct CommentView {
    pub comment_id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub body: String,
    pub likes_count: u32,
    pub liked_by_viewer: bool,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn like_status(&self) -> LikeStatus {
        LikeStatus::new(self.liked_by_viewer, self.likes_count)
    }

    pub fn set_like_status(&mut self, status: LikeStatus) {
        self.liked_by_viewer = status.is_liked;
        self.likes_count = status.likes_count;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreatePost {
    pub body: String,
    pub media: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateComment {
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(golem_rust::Schema))]
#[serde(rename_all = "kebab-case")]
pub struct Profile {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub followers_count: u32,
    pub following_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update, absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(golem_rust::Schema))]
#[serde(rename_all = "kebab-case")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(golem_rust::Schema))]
#[serde(rename_all = "kebab-case")]
pub struct RideStats {
    pub total_distance_km: f64,
    pub total_duration_secs: u64,
    pub total_rides: u32,
    pub co2_saved_kg: f64,
    pub points: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(golem_rust::Schema))]
#[serde(rename_all = "kebab-case")]
pub struct Device {
    pub serial_number: String,
    pub model: String,
    pub battery_level: u8,
    pub firmware_version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckInRequest {
    pub landmark_id: String,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(golem_rust::Schema))]
#[serde(rename_all = "kebab-case")]
pub struct CheckIn {
    pub landmark_id: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(golem_rust::Schema))]
#[serde(rename_all = "kebab-case")]
pub struct RideInput {
    pub distance_km: f64,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(golem_rust::Schema))]
#[serde(rename_all = "kebab-case")]
pub struct Ride {
    pub ride_id: String,
    pub distance_km: f64,
    pub duration_secs: u64,
    pub average_speed_kmh: f64,
    pub started_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

// Authentication is served by the hosted auth provider, which speaks camelCase.

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub contact: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub contact: String,
    pub password: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub contact: String,
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    pub user: Option<AuthUser>,
    pub access_token: Option<String>,
    pub error: Option<String>,
}
