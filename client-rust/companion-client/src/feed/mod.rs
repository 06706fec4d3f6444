//! Community feed with optimistic likes.
//!
//! A like toggle is applied to the local state before the request leaves,
//! then reconciled when the server answers: kept on success, undone on any
//! failure. Creating and deleting posts or comments is never optimistic;
//! local state changes only once the server has confirmed.

mod duplicate;
mod ledger;
mod state;

pub use duplicate::PostDraft;
pub use ledger::LikeTarget;
pub use state::{FeedState, PostDetail};

use crate::config::{ClientConfig, ReconcilePolicy, DEFAULT_DUPLICATE_WINDOW};
use crate::error::ClientError;
use crate::remote::RemoteStore;
use crate::session::SessionContext;
use async_trait::async_trait;
use common_lib::api::{CommentView, CreateComment, CreatePost, PostView};
use common_lib::likes::LikeStatus;
use common_lib::validation;
use duplicate::find_duplicate;
use ledger::LikeLedger;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedSettings {
    /// How many of the rider's own latest posts the duplicate check covers.
    pub duplicate_window: usize,
    pub reconcile_policy: ReconcilePolicy,
}

impl Default for FeedSettings {
    fn default() -> Self {
        FeedSettings {
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            reconcile_policy: ReconcilePolicy::default(),
        }
    }
}

impl From<&ClientConfig> for FeedSettings {
    fn from(config: &ClientConfig) -> Self {
        FeedSettings {
            duplicate_window: config.duplicate_window,
            reconcile_policy: config.reconcile_policy,
        }
    }
}

/// Asks the rider whether to publish a post identical to a recent one.
#[async_trait]
pub trait ConfirmDuplicate: Send + Sync {
    async fn confirm_duplicate(&self, draft: &PostDraft, existing: &PostView) -> bool;
}

#[async_trait]
impl<F> ConfirmDuplicate for F
where
    F: Fn(&PostDraft, &PostView) -> bool + Send + Sync,
{
    async fn confirm_duplicate(&self, draft: &PostDraft, existing: &PostView) -> bool {
        (self)(draft, existing)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LikeResolution {
    /// The server accepted the toggle; the status now shown.
    Committed(LikeStatus),
    /// The request failed and the toggle was undone.
    RolledBack {
        status: LikeStatus,
        error: ClientError,
    },
    /// The controller was closed before the server answered.
    Cancelled,
    /// The target was deleted while the request was in flight.
    Discarded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(PostView),
    /// The draft duplicated a recent post and the rider chose not to publish.
    Declined,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// The deleted post was open in the detail view, which is now closed.
    pub closed_detail: bool,
}

/// The server side of a like toggle whose optimistic part is already applied.
///
/// Nothing is sent until it is polled; spawn it or await it. Dropping it
/// before it resolves undoes the toggle.
#[must_use = "the like request is only sent when the future is polled"]
pub struct PendingLike {
    target: LikeTarget,
    optimistic: LikeStatus,
    shared: Arc<Shared>,
    settled: bool,
    future: Pin<Box<dyn Future<Output = LikeResolution> + Send>>,
}

impl PendingLike {
    pub fn target(&self) -> &LikeTarget {
        &self.target
    }

    /// Status shown while the request is in flight.
    pub fn optimistic(&self) -> LikeStatus {
        self.optimistic
    }
}

impl Future for PendingLike {
    type Output = LikeResolution;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let poll = self.future.as_mut().poll(cx);
        if poll.is_ready() {
            self.settled = true;
        }
        poll
    }
}

impl Drop for PendingLike {
    fn drop(&mut self) {
        // after close() the state is frozen as it is
        if self.settled || self.shared.cancel.is_cancelled() {
            return;
        }

        let target = &self.target;
        let status = self.shared.update(|state, ledger| {
            let status = ledger.rollback(target)?;
            state.apply_like_status(target, status);
            Some(status)
        });

        if let Some(status) = status {
            log::debug!(
                "toggle like - {target} abandoned, liked: {}, count: {}",
                status.is_liked,
                status.likes_count
            );
        }
    }
}

struct Inner {
    state: Arc<FeedState>,
    ledger: LikeLedger,
}

struct Shared {
    remote: Arc<dyn RemoteStore>,
    session: Arc<SessionContext>,
    settings: FeedSettings,
    cancel: CancellationToken,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on a fresh copy of the state and publishes it as the new
    /// snapshot; snapshots already handed out stay untouched.
    fn update<T>(&self, f: impl FnOnce(&mut FeedState, &mut LikeLedger) -> T) -> T {
        let mut inner = self.lock();
        let Inner { state, ledger } = &mut *inner;
        f(Arc::make_mut(state), ledger)
    }

    /// Awaits `request` unless the controller gets closed first. An
    /// authentication failure ends the session `token` belongs to.
    async fn guarded<T>(
        &self,
        token: &str,
        request: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            result = request => result,
        };

        if let Err(e) = &result {
            if e.is_auth() {
                self.session.invalidate(token);
            }
        }
        result
    }
}

/// Owns the feed state of the community tab; views read snapshots of it.
#[derive(Clone)]
pub struct FeedController {
    shared: Arc<Shared>,
}

impl FeedController {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        session: Arc<SessionContext>,
        settings: FeedSettings,
    ) -> Self {
        FeedController {
            shared: Arc::new(Shared {
                remote,
                session,
                settings,
                cancel: CancellationToken::new(),
                inner: Mutex::new(Inner {
                    state: Arc::new(FeedState::default()),
                    ledger: LikeLedger::default(),
                }),
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<FeedState> {
        self.shared.lock().state.clone()
    }

    pub fn posts(&self) -> Vec<PostView> {
        self.snapshot().posts.clone()
    }

    pub fn detail(&self) -> Option<PostDetail> {
        self.snapshot().detail.clone()
    }

    /// Number of like requests of `target` still waiting for the server.
    pub fn in_flight(&self, target: &LikeTarget) -> usize {
        self.shared.lock().ledger.in_flight(target)
    }

    /// Stops the controller: requests in flight are abandoned and their
    /// late answers ignored.
    pub fn close(&self) {
        log::debug!("feed - closed");
        self.shared.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    pub async fn refresh_feed(&self) -> Result<(), ClientError> {
        let session = self.shared.session.require()?;
        let posts = self
            .shared
            .guarded(
                &session.access_token,
                self.shared
                    .remote
                    .get_feed(&session.access_token, &session.user.id),
            )
            .await?;

        log::debug!("feed - refreshed, posts: {}", posts.len());

        self.shared.update(|state, ledger| {
            state.replace_posts(posts);
            // toggles still in flight are not in the server's answer yet
            state.overlay(ledger.pending());
        });
        Ok(())
    }

    pub async fn open_detail(&self, post_id: &str) -> Result<(), ClientError> {
        let session = self.shared.session.require()?;
        let post = self
            .snapshot()
            .post(post_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("post {post_id}")))?;

        let comments = self
            .shared
            .guarded(
                &session.access_token,
                self.shared
                    .remote
                    .get_comments(&session.access_token, post_id),
            )
            .await?;

        self.shared.update(|state, ledger| {
            let post = state.post(post_id).cloned().unwrap_or(post);
            state.detail = Some(PostDetail { post, comments });
            state.overlay(ledger.pending());
        });
        Ok(())
    }

    pub fn close_detail(&self) {
        self.shared.update(|state, _| state.detail = None);
    }

    /// Likes or unlikes a post. See [`FeedController::toggle_comment_like`].
    pub fn toggle_post_like(&self, post_id: &str) -> Option<PendingLike> {
        self.toggle_like(LikeTarget::post(post_id))
    }

    /// Flips the like of a comment in every local copy right away and returns
    /// the request that confirms it with the server.
    ///
    /// Returns `None`, changing nothing, without a session, when the
    /// controller is closed or when the comment is not loaded.
    pub fn toggle_comment_like(&self, post_id: &str, comment_id: &str) -> Option<PendingLike> {
        self.toggle_like(LikeTarget::comment(post_id, comment_id))
    }

    fn toggle_like(&self, target: LikeTarget) -> Option<PendingLike> {
        if self.is_closed() {
            return None;
        }
        let Some(token) = self.shared.session.access_token() else {
            log::debug!("toggle like - no session, ignoring {target}");
            return None;
        };

        let optimistic = self.shared.update(|state, ledger| {
            let current = state.like_status(&target)?;
            let displayed = ledger.begin(&target, current);
            state.apply_like_status(&target, displayed);
            Some(displayed)
        });
        let Some(optimistic) = optimistic else {
            log::debug!("toggle like - {target} not loaded");
            return None;
        };

        log::debug!(
            "toggle like - {target}, liked: {}, count: {}",
            optimistic.is_liked,
            optimistic.likes_count
        );

        let future = resolve_like(self.shared.clone(), target.clone(), token);
        Some(PendingLike {
            target,
            optimistic,
            shared: self.shared.clone(),
            settled: false,
            future: Box::pin(future),
        })
    }

    /// Deletes one of the rider's posts. Nothing changes locally unless the
    /// server confirms.
    pub async fn delete_post(&self, post_id: &str) -> Result<DeleteOutcome, ClientError> {
        let session = self.shared.session.require()?;
        let post = self
            .snapshot()
            .post(post_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("post {post_id}")))?;

        if post.author_id != session.user.id {
            return Err(ClientError::Forbidden(
                "only the author can delete a post".to_string(),
            ));
        }

        self.shared
            .guarded(
                &session.access_token,
                self.shared.remote.delete_post(&session.access_token, post_id),
            )
            .await
            .inspect_err(|e| log::warn!("delete post - id: {post_id}, failed: {e}"))?;

        let closed_detail = self.shared.update(|state, ledger| {
            ledger.forget_post(post_id);
            state.remove_post(post_id)
        });

        log::info!("delete post - id: {post_id}, closed detail: {closed_detail}");
        Ok(DeleteOutcome { closed_detail })
    }

    /// Deletes a comment of the open post; allowed for the comment's author
    /// and the post's author.
    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<(), ClientError> {
        let session = self.shared.session.require()?;
        {
            let snapshot = self.snapshot();
            let post = snapshot
                .detail
                .as_ref()
                .map(|d| &d.post)
                .filter(|p| p.post_id == post_id)
                .ok_or_else(|| ClientError::NotFound(format!("post {post_id}")))?;
            let comment = snapshot
                .comment(post_id, comment_id)
                .ok_or_else(|| ClientError::NotFound(format!("comment {comment_id}")))?;

            if comment.author_id != session.user.id && post.author_id != session.user.id {
                return Err(ClientError::Forbidden(
                    "only the author can delete a comment".to_string(),
                ));
            }
        }

        self.shared
            .guarded(
                &session.access_token,
                self.shared
                    .remote
                    .delete_comment(&session.access_token, post_id, comment_id),
            )
            .await
            .inspect_err(|e| log::warn!("delete comment - id: {comment_id}, failed: {e}"))?;

        self.shared.update(|state, ledger| {
            ledger.forget(&LikeTarget::comment(post_id, comment_id));
            state.remove_comment(post_id, comment_id);
        });

        log::info!("delete comment - post id: {post_id}, comment id: {comment_id}");
        Ok(())
    }

    /// Publishes a post once the server returns it with its id and timestamp.
    ///
    /// If the rider published the same body and media among their latest
    /// posts, `confirm` decides; declining sends nothing.
    pub async fn create_post<C>(
        &self,
        draft: PostDraft,
        confirm: &C,
    ) -> Result<CreateOutcome, ClientError>
    where
        C: ConfirmDuplicate + ?Sized,
    {
        let session = self.shared.session.require()?;
        validation::validate_post(&draft.body, draft.media.as_deref())?;

        let duplicate = find_duplicate(
            &self.snapshot().posts,
            &session.user.id,
            &draft,
            self.shared.settings.duplicate_window,
        )
        .cloned();

        if let Some(existing) = duplicate {
            if !confirm.confirm_duplicate(&draft, &existing).await {
                log::info!("create post - duplicate of {}, declined", existing.post_id);
                return Ok(CreateOutcome::Declined);
            }
        }

        let request = CreatePost {
            body: draft.body,
            media: draft.media,
        };
        let post = self
            .shared
            .guarded(
                &session.access_token,
                self.shared
                    .remote
                    .create_post(&session.access_token, &session.user.id, &request),
            )
            .await?;

        log::info!("create post - id: {}", post.post_id);

        self.shared.update(|state, _| state.insert_post(post.clone()));
        Ok(CreateOutcome::Created(post))
    }

    pub async fn add_comment(&self, post_id: &str, body: &str) -> Result<CommentView, ClientError> {
        let session = self.shared.session.require()?;
        validation::validate_comment(body)?;

        let request = CreateComment {
            body: body.to_string(),
        };
        let comment = self
            .shared
            .guarded(
                &session.access_token,
                self.shared
                    .remote
                    .create_comment(&session.access_token, post_id, &request),
            )
            .await?;

        log::info!(
            "add comment - post id: {post_id}, comment id: {}",
            comment.comment_id
        );

        self.shared
            .update(|state, _| state.insert_comment(comment.clone()));
        Ok(comment)
    }
}

async fn resolve_like(shared: Arc<Shared>, target: LikeTarget, token: String) -> LikeResolution {
    let request = async {
        match &target {
            LikeTarget::Post { post_id } => shared.remote.toggle_post_like(&token, post_id).await,
            LikeTarget::Comment {
                post_id,
                comment_id,
            } => {
                shared
                    .remote
                    .toggle_comment_like(&token, post_id, comment_id)
                    .await
            }
        }
    };

    match shared.guarded(&token, request).await {
        Ok(server) => {
            let adopt = (shared.settings.reconcile_policy == ReconcilePolicy::AdoptServer)
                .then_some(server);
            let status = shared.update(|state, ledger| {
                let status = ledger.commit(&target, adopt)?;
                state.apply_like_status(&target, status);
                Some(status)
            });

            match status {
                Some(status) => {
                    log::debug!(
                        "toggle like - {target} committed, liked: {}, count: {}",
                        status.is_liked,
                        status.likes_count
                    );
                    LikeResolution::Committed(status)
                }
                None => LikeResolution::Discarded,
            }
        }
        Err(ClientError::Cancelled) => {
            // the ledger entry stays in flight; a closed controller takes no new toggles
            log::debug!("toggle like - {target} cancelled");
            LikeResolution::Cancelled
        }
        Err(error) => {
            log::warn!("toggle like - {target} failed, rolling back: {error}");
            let status = shared.update(|state, ledger| {
                let status = ledger.rollback(&target)?;
                state.apply_like_status(&target, status);
                Some(status)
            });

            match status {
                Some(status) => LikeResolution::RolledBack { status, error },
                None => LikeResolution::Discarded,
            }
        }
    }
}
