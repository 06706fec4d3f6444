//! Boundary to the companion API and the hosted auth provider.

pub mod http;

use crate::error::ClientError;
use async_trait::async_trait;
use common_lib::api::{
    AuthResponse, CheckIn, CheckInRequest, CommentView, CreateComment, CreatePost, Device,
    PostView, Profile, ProfileUpdate, Ride, RideInput, RideStats, SignInRequest, SignUpRequest,
};
use common_lib::likes::LikeStatus;

/// Every call is one independent request. Authenticated calls take the
/// bearer token explicitly; nothing here retries.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ClientError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ClientError>;

    async fn get_profile(&self, token: &str, user_id: &str) -> Result<Profile, ClientError>;

    async fn update_profile(
        &self,
        token: &str,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, ClientError>;

    async fn update_stats(
        &self,
        token: &str,
        user_id: &str,
        stats: &RideStats,
    ) -> Result<RideStats, ClientError>;

    async fn set_device(&self, token: &str, user_id: &str, device: &Device)
        -> Result<(), ClientError>;

    async fn remove_device(&self, token: &str, user_id: &str) -> Result<(), ClientError>;

    async fn check_in(
        &self,
        token: &str,
        user_id: &str,
        request: &CheckInRequest,
    ) -> Result<CheckIn, ClientError>;

    async fn record_ride(
        &self,
        token: &str,
        user_id: &str,
        ride: &RideInput,
    ) -> Result<Ride, ClientError>;

    async fn follow(&self, token: &str, user_id: &str, other_id: &str) -> Result<(), ClientError>;

    async fn unfollow(&self, token: &str, user_id: &str, other_id: &str)
        -> Result<(), ClientError>;

    async fn get_feed(&self, token: &str, user_id: &str) -> Result<Vec<PostView>, ClientError>;

    async fn create_post(
        &self,
        token: &str,
        user_id: &str,
        post: &CreatePost,
    ) -> Result<PostView, ClientError>;

    async fn toggle_post_like(&self, token: &str, post_id: &str)
        -> Result<LikeStatus, ClientError>;

    async fn delete_post(&self, token: &str, post_id: &str) -> Result<(), ClientError>;

    async fn get_comments(
        &self,
        token: &str,
        post_id: &str,
    ) -> Result<Vec<CommentView>, ClientError>;

    async fn create_comment(
        &self,
        token: &str,
        post_id: &str,
        comment: &CreateComment,
    ) -> Result<CommentView, ClientError>;

    async fn toggle_comment_like(
        &self,
        token: &str,
        post_id: &str,
        comment_id: &str,
    ) -> Result<LikeStatus, ClientError>;

    async fn delete_comment(
        &self,
        token: &str,
        post_id: &str,
        comment_id: &str,
    ) -> Result<(), ClientError>;
}
