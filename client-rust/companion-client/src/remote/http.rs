use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::remote::RemoteStore;
use async_trait::async_trait;
use common_lib::api::{
    AuthResponse, CheckIn, CheckInRequest, CommentView, CreateComment, CreatePost, Device,
    ErrResult, OkResult, PostView, Profile, ProfileUpdate, Ride, RideInput, RideStats,
    SignInRequest, SignUpRequest,
};
use common_lib::likes::LikeStatus;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// [`RemoteStore`] over the REST routes of the companion API.
#[derive(Clone, Debug)]
pub struct HttpRemoteStore {
    client: Client,
    base_url: Url,
}

impl HttpRemoteStore {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| ClientError::Config(format!("COMPANION_API_URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "COMPANION_API_URL: {base_url} cannot be a base URL"
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(default_headers())
            .build()?;

        Ok(HttpRemoteStore { client, base_url })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, name: &str, request: RequestBuilder) -> Result<String, ClientError> {
        let response = request.send().await.map_err(|e| {
            log::warn!("{name} - request failed: {e}");
            ClientError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            log::debug!("{name} - status: {status}");
            Ok(body)
        } else {
            let message = error_message(&body, status);
            log::warn!("{name} - status: {status}, message: {message}");
            Err(ClientError::from_status(status.as_u16(), message))
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        name: &str,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let body = self.execute(name, request).await?;
        serde_json::from_str::<OkResult<T>>(&body)
            .map(|result| result.ok)
            .map_err(|e| ClientError::Malformed(format!("{name}: {e}")))
    }

    async fn call_empty(&self, name: &str, request: RequestBuilder) -> Result<(), ClientError> {
        self.execute(name, request).await.map(|_| ())
    }

    async fn authenticate<T: Serialize + Sync>(
        &self,
        name: &str,
        path: &str,
        body: &T,
    ) -> Result<AuthResponse, ClientError> {
        let request = self.client.post(self.url(&[path])?).json(body);
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let parsed = serde_json::from_str::<AuthResponse>(&text);

        if status.is_success() {
            parsed.map_err(|e| ClientError::Malformed(format!("{name}: {e}")))
        } else {
            let message = parsed
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| error_message(&text, status));
            log::warn!("{name} - status: {status}, message: {message}");
            Err(ClientError::from_status(status.as_u16(), message))
        }
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn error_message(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<ErrResult>(body) {
        Ok(result) => result.err.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ClientError> {
        self.authenticate("sign-in", "signin", request).await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ClientError> {
        self.authenticate("sign-up", "signup", request).await
    }

    async fn get_profile(&self, token: &str, user_id: &str) -> Result<Profile, ClientError> {
        let url = self.url(&["users", user_id, "profile"])?;
        self.call("profile-get", self.client.get(url).bearer_auth(token))
            .await
    }

    async fn update_profile(
        &self,
        token: &str,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, ClientError> {
        let url = self.url(&["users", user_id, "profile"])?;
        self.call(
            "profile-update",
            self.client.put(url).bearer_auth(token).json(update),
        )
        .await
    }

    async fn update_stats(
        &self,
        token: &str,
        user_id: &str,
        stats: &RideStats,
    ) -> Result<RideStats, ClientError> {
        let url = self.url(&["users", user_id, "stats"])?;
        self.call(
            "stats-update",
            self.client.put(url).bearer_auth(token).json(stats),
        )
        .await
    }

    async fn set_device(
        &self,
        token: &str,
        user_id: &str,
        device: &Device,
    ) -> Result<(), ClientError> {
        let url = self.url(&["users", user_id, "device"])?;
        self.call_empty(
            "device-set",
            self.client.put(url).bearer_auth(token).json(device),
        )
        .await
    }

    async fn remove_device(&self, token: &str, user_id: &str) -> Result<(), ClientError> {
        let url = self.url(&["users", user_id, "device"])?;
        self.call_empty("device-remove", self.client.delete(url).bearer_auth(token))
            .await
    }

    async fn check_in(
        &self,
        token: &str,
        user_id: &str,
        request: &CheckInRequest,
    ) -> Result<CheckIn, ClientError> {
        let url = self.url(&["users", user_id, "check-ins"])?;
        self.call(
            "check-in",
            self.client.post(url).bearer_auth(token).json(request),
        )
        .await
    }

    async fn record_ride(
        &self,
        token: &str,
        user_id: &str,
        ride: &RideInput,
    ) -> Result<Ride, ClientError> {
        let url = self.url(&["users", user_id, "rides"])?;
        self.call(
            "ride-record",
            self.client.post(url).bearer_auth(token).json(ride),
        )
        .await
    }

    async fn follow(&self, token: &str, user_id: &str, other_id: &str) -> Result<(), ClientError> {
        let url = self.url(&["users", user_id, "following", other_id])?;
        self.call_empty("follow", self.client.put(url).bearer_auth(token))
            .await
    }

    async fn unfollow(
        &self,
        token: &str,
        user_id: &str,
        other_id: &str,
    ) -> Result<(), ClientError> {
        let url = self.url(&["users", user_id, "following", other_id])?;
        self.call_empty("unfollow", self.client.delete(url).bearer_auth(token))
            .await
    }

    async fn get_feed(&self, token: &str, user_id: &str) -> Result<Vec<PostView>, ClientError> {
        let url = self.url(&["users", user_id, "feed"])?;
        self.call("feed-get", self.client.get(url).bearer_auth(token))
            .await
    }

    async fn create_post(
        &self,
        token: &str,
        user_id: &str,
        post: &CreatePost,
    ) -> Result<PostView, ClientError> {
        let url = self.url(&["users", user_id, "posts"])?;
        self.call(
            "post-create",
            self.client.post(url).bearer_auth(token).json(post),
        )
        .await
    }

    async fn toggle_post_like(
        &self,
        token: &str,
        post_id: &str,
    ) -> Result<LikeStatus, ClientError> {
        let url = self.url(&["posts", post_id, "like"])?;
        self.call("post-like", self.client.post(url).bearer_auth(token))
            .await
    }

    async fn delete_post(&self, token: &str, post_id: &str) -> Result<(), ClientError> {
        let url = self.url(&["posts", post_id])?;
        self.call_empty("post-delete", self.client.delete(url).bearer_auth(token))
            .await
    }

    async fn get_comments(
        &self,
        token: &str,
        post_id: &str,
    ) -> Result<Vec<CommentView>, ClientError> {
        let url = self.url(&["posts", post_id, "comments"])?;
        self.call("comments-get", self.client.get(url).bearer_auth(token))
            .await
    }

    async fn create_comment(
        &self,
        token: &str,
        post_id: &str,
        comment: &CreateComment,
    ) -> Result<CommentView, ClientError> {
        let url = self.url(&["posts", post_id, "comments"])?;
        self.call(
            "comment-add",
            self.client.post(url).bearer_auth(token).json(comment),
        )
        .await
    }

    async fn toggle_comment_like(
        &self,
        token: &str,
        post_id: &str,
        comment_id: &str,
    ) -> Result<LikeStatus, ClientError> {
        let url = self.url(&["posts", post_id, "comments", comment_id, "like"])?;
        self.call("comment-like", self.client.post(url).bearer_auth(token))
            .await
    }

    async fn delete_comment(
        &self,
        token: &str,
        post_id: &str,
        comment_id: &str,
    ) -> Result<(), ClientError> {
        let url = self.url(&["posts", post_id, "comments", comment_id])?;
        self.call_empty("comment-delete", self.client.delete(url).bearer_auth(token))
            .await
    }
}
