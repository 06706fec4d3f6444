#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common_lib::api::{
    AuthResponse, AuthUser, CheckIn, CheckInRequest, CommentView, CreateComment, CreatePost,
    Device, PostView, Profile, ProfileUpdate, Ride, RideInput, RideStats, SignInRequest,
    SignUpRequest,
};
use common_lib::likes::LikeStatus;
use companion_client::{
    ClientError, FeedController, FeedSettings, MemoryStorage, RemoteStore, SessionContext,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub type LikeReply = Result<LikeStatus, ClientError>;

/// In-memory API double. Records every call by name; like toggles can be
/// held in flight until the test answers them.
#[derive(Default)]
pub struct MockRemote {
    calls: Mutex<Vec<String>>,
    feed: Mutex<Vec<PostView>>,
    comments: Mutex<Vec<CommentView>>,
    like_gates: Mutex<VecDeque<oneshot::Receiver<LikeReply>>>,
    failures: Mutex<HashMap<&'static str, ClientError>>,
    auth: Mutex<Option<Result<AuthResponse, ClientError>>>,
    next_id: Mutex<u32>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(MockRemote::default())
    }

    pub fn with_feed(posts: Vec<PostView>) -> Arc<Self> {
        let remote = MockRemote::default();
        *remote.feed.lock().unwrap() = posts;
        Arc::new(remote)
    }

    pub fn set_comments(&self, comments: Vec<CommentView>) {
        *self.comments.lock().unwrap() = comments;
    }

    /// The next like request waits for the returned sender.
    pub fn hold_like(&self) -> oneshot::Sender<LikeReply> {
        let (tx, rx) = oneshot::channel();
        self.like_gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Every later call of `name` fails with `error`.
    pub fn fail(&self, name: &'static str, error: ClientError) {
        self.failures.lock().unwrap().insert(name, error);
    }

    pub fn respond_auth(&self, response: Result<AuthResponse, ClientError>) {
        *self.auth.lock().unwrap() = Some(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    pub async fn wait_for_calls(&self, name: &str, n: usize) {
        while self.count(name) < n {
            tokio::task::yield_now().await;
        }
    }

    fn call(&self, name: &'static str) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(name.to_string());
        match self.failures.lock().unwrap().get(name) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{prefix}-{next}")
    }

    async fn like(&self, name: &'static str) -> LikeReply {
        self.call(name)?;
        let gate = self.like_gates.lock().unwrap().pop_front();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ClientError::Transport("gate dropped".to_string()))),
            None => Ok(LikeStatus::new(true, 1)),
        }
    }

    fn auth_reply(&self, name: &'static str) -> Result<AuthResponse, ClientError> {
        self.call(name)?;
        self.auth
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(auth_ok(rider("u001"), "token-1")))
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn sign_in(&self, _request: &SignInRequest) -> Result<AuthResponse, ClientError> {
        self.auth_reply("sign_in")
    }

    async fn sign_up(&self, _request: &SignUpRequest) -> Result<AuthResponse, ClientError> {
        self.auth_reply("sign_up")
    }

    async fn get_profile(&self, _token: &str, user_id: &str) -> Result<Profile, ClientError> {
        self.call("get_profile")?;
        Ok(profile(user_id))
    }

    async fn update_profile(
        &self,
        _token: &str,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, ClientError> {
        self.call("update_profile")?;
        let mut profile = profile(user_id);
        profile.name = update.name.clone().or(profile.name);
        profile.email = update.email.clone();
        profile.phone = update.phone.clone();
        Ok(profile)
    }

    async fn update_stats(
        &self,
        _token: &str,
        _user_id: &str,
        stats: &RideStats,
    ) -> Result<RideStats, ClientError> {
        self.call("update_stats")?;
        Ok(stats.clone())
    }

    async fn set_device(
        &self,
        _token: &str,
        _user_id: &str,
        _device: &Device,
    ) -> Result<(), ClientError> {
        self.call("set_device")
    }

    async fn remove_device(&self, _token: &str, _user_id: &str) -> Result<(), ClientError> {
        self.call("remove_device")
    }

    async fn check_in(
        &self,
        _token: &str,
        _user_id: &str,
        request: &CheckInRequest,
    ) -> Result<CheckIn, ClientError> {
        self.call("check_in")?;
        Ok(CheckIn {
            landmark_id: request.landmark_id.clone(),
            note: request.note.clone(),
            created_at: Utc::now(),
        })
    }

    async fn record_ride(
        &self,
        _token: &str,
        _user_id: &str,
        ride: &RideInput,
    ) -> Result<Ride, ClientError> {
        self.call("record_ride")?;
        Ok(Ride {
            ride_id: self.next_id("ride"),
            distance_km: ride.distance_km,
            duration_secs: ride.duration_secs,
            average_speed_kmh: common_lib::rides::average_speed_kmh(
                ride.distance_km,
                ride.duration_secs,
            ),
            started_at: ride.started_at,
            recorded_at: Utc::now(),
        })
    }

    async fn follow(&self, _token: &str, _user_id: &str, _other: &str) -> Result<(), ClientError> {
        self.call("follow")
    }

    async fn unfollow(
        &self,
        _token: &str,
        _user_id: &str,
        _other: &str,
    ) -> Result<(), ClientError> {
        self.call("unfollow")
    }

    async fn get_feed(&self, _token: &str, _user_id: &str) -> Result<Vec<PostView>, ClientError> {
        self.call("get_feed")?;
        Ok(self.feed.lock().unwrap().clone())
    }

    async fn create_post(
        &self,
        _token: &str,
        user_id: &str,
        request: &CreatePost,
    ) -> Result<PostView, ClientError> {
        self.call("create_post")?;
        let mut created = post(&self.next_id("post"), user_id, false, 0);
        created.body = request.body.clone();
        created.media = request.media.clone();
        created.created_at = Utc::now();
        created.comments_count = 0;
        Ok(created)
    }

    async fn toggle_post_like(&self, _token: &str, _post_id: &str) -> LikeReply {
        self.like("toggle_post_like").await
    }

    async fn delete_post(&self, _token: &str, _post_id: &str) -> Result<(), ClientError> {
        self.call("delete_post")
    }

    async fn get_comments(
        &self,
        _token: &str,
        post_id: &str,
    ) -> Result<Vec<CommentView>, ClientError> {
        self.call("get_comments")?;
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn create_comment(
        &self,
        _token: &str,
        post_id: &str,
        request: &CreateComment,
    ) -> Result<CommentView, ClientError> {
        self.call("create_comment")?;
        let mut created = comment(post_id, &self.next_id("comment"), "u001");
        created.body = request.body.clone();
        Ok(created)
    }

    async fn toggle_comment_like(
        &self,
        _token: &str,
        _post_id: &str,
        _comment_id: &str,
    ) -> LikeReply {
        self.like("toggle_comment_like").await
    }

    async fn delete_comment(
        &self,
        _token: &str,
        _post_id: &str,
        _comment_id: &str,
    ) -> Result<(), ClientError> {
        self.call("delete_comment")
    }
}

pub fn rider(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        name: format!("Rider {id}"),
        contact: format!("{id}@example.com"),
        avatar: None,
    }
}

pub fn auth_ok(user: AuthUser, token: &str) -> AuthResponse {
    AuthResponse {
        success: true,
        user: Some(user),
        access_token: Some(token.to_string()),
        error: None,
    }
}

pub fn profile(user_id: &str) -> Profile {
    Profile {
        user_id: user_id.to_string(),
        name: Some(format!("Rider {user_id}")),
        email: None,
        phone: None,
        avatar: None,
        bio: None,
        followers_count: 0,
        following_count: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A post by `author_id` published ten minutes ago.
pub fn post(post_id: &str, author_id: &str, liked: bool, likes_count: u32) -> PostView {
    PostView {
        post_id: post_id.to_string(),
        author_id: author_id.to_string(),
        author_name: format!("Rider {author_id}"),
        author_avatar: None,
        body: format!("Ride report {post_id}"),
        media: None,
        likes_count,
        comments_count: 1,
        liked_by_viewer: liked,
        created_at: Utc::now() - Duration::minutes(10),
    }
}

pub fn comment(post_id: &str, comment_id: &str, author_id: &str) -> CommentView {
    CommentView {
        comment_id: comment_id.to_string(),
        post_id: post_id.to_string(),
        author_id: author_id.to_string(),
        author_name: format!("Rider {author_id}"),
        author_avatar: None,
        body: "Nice route!".to_string(),
        likes_count: 0,
        liked_by_viewer: false,
        created_at: Utc::now(),
    }
}

/// A session for `u001` kept in memory.
pub fn signed_in() -> Arc<SessionContext> {
    let session = Arc::new(SessionContext::new(Arc::new(MemoryStorage::new())));
    session
        .begin(rider("u001"), "token-1".to_string())
        .unwrap();
    session
}

/// Controller over `remote` with the feed already loaded.
pub async fn loaded_feed(
    remote: &Arc<MockRemote>,
    session: &Arc<SessionContext>,
    settings: FeedSettings,
) -> FeedController {
    let feed = FeedController::new(remote.clone(), session.clone(), settings);
    feed.refresh_feed().await.unwrap();
    feed
}
