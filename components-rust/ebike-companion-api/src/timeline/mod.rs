use crate::post::PostAgentClient;
use common_lib::api::PostView;
use futures::future::join_all;
use golem_rust::{agent_definition, agent_implementation, Schema};
use serde::{Deserialize, Serialize};

const MAX_TIMELINE_POSTS: usize = 1000;
const DEFAULT_FEED_LIMIT: u32 = 50;

#[derive(Schema, Clone, Serialize, Deserialize)]
pub struct PostRef {
    pub post_id: String,
    pub created_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PostRef {
    pub fn new(
        post_id: String,
        created_by: String,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        PostRef {
            post_id,
            created_by,
            created_at,
            updated_at: chrono::Utc::now(),
        }
    }
}

#[derive(Schema, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub user_id: String,
    pub posts: Vec<PostRef>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Timeline {
    fn new(user_id: String) -> Self {
        let now = chrono::Utc::now();
        Timeline {
            user_id,
            posts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn add_or_update_post(&mut self, post: PostRef) {
        let updated_at = post.updated_at;

        self.posts.retain(|p| p.post_id != post.post_id);
        self.posts.push(post);

        // newest first
        self.posts
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).reverse());
        self.posts.truncate(MAX_TIMELINE_POSTS);

        if self.updated_at < updated_at {
            self.updated_at = updated_at;
        }
    }

    fn remove_where(&mut self, f: impl Fn(&PostRef) -> bool) -> usize {
        let before = self.posts.len();
        self.posts.retain(|p| !f(p));
        let removed = before - self.posts.len();
        if removed > 0 {
            self.updated_at = chrono::Utc::now();
        }
        removed
    }
}

#[agent_definition]
trait TimelineAgent {
    fn new(id: String) -> Self;

    fn get_timeline(&self) -> Option<Timeline>;

    fn add_post(&mut self, post: PostRef) -> Result<(), String>;

    fn remove_post(&mut self, post_id: String) -> Result<(), String>;

    fn remove_posts_by(&mut self, user_id: String) -> Result<(), String>;

    fn get_updates(&self, updates_since: chrono::DateTime<chrono::Utc>) -> Option<Vec<PostRef>>;
}

struct TimelineAgentImpl {
    _id: String,
    state: Option<Timeline>,
}

impl TimelineAgentImpl {
    fn get_state(&mut self) -> &mut Timeline {
        self.state.get_or_insert(Timeline::new(self._id.clone()))
    }

    fn with_state<T>(&mut self, f: impl FnOnce(&mut Timeline) -> T) -> T {
        f(self.get_state())
    }
}

#[agent_implementation]
impl TimelineAgent for TimelineAgentImpl {
    fn new(id: String) -> Self {
        TimelineAgentImpl {
            _id: id,
            state: None,
        }
    }

    fn get_timeline(&self) -> Option<Timeline> {
        self.state.clone()
    }

    fn add_post(&mut self, post: PostRef) -> Result<(), String> {
        self.with_state(|state| {
            log::info!(
                "add post - user id: {}, post id: {}, created by: {}",
                state.user_id,
                post.post_id,
                post.created_by
            );
            state.add_or_update_post(post);
            Ok(())
        })
    }

    fn remove_post(&mut self, post_id: String) -> Result<(), String> {
        self.with_state(|state| {
            let removed = state.remove_where(|p| p.post_id == post_id);
            log::info!(
                "remove post - user id: {}, post id: {post_id}, removed: {removed}",
                state.user_id
            );
            Ok(())
        })
    }

    fn remove_posts_by(&mut self, user_id: String) -> Result<(), String> {
        self.with_state(|state| {
            // The timeline owner's own posts stay.
            if user_id != state.user_id {
                let removed = state.remove_where(|p| p.created_by == user_id);
                log::info!(
                    "remove posts by - user id: {}, created by: {user_id}, removed: {removed}",
                    state.user_id
                );
            }
            Ok(())
        })
    }

    fn get_updates(&self, updates_since: chrono::DateTime<chrono::Utc>) -> Option<Vec<PostRef>> {
        self.state.as_ref().map(|state| {
            log::debug!("get updates - updates since: {updates_since}");
            state
                .posts
                .iter()
                .filter(|p| p.updated_at > updates_since)
                .cloned()
                .collect()
        })
    }

    async fn load_snapshot(&mut self, bytes: Vec<u8>) -> Result<(), String> {
        let data: Option<Timeline> = crate::common::snapshot::deserialize(&bytes)?;
        self.state = data;
        Ok(())
    }

    async fn save_snapshot(&self) -> Result<Vec<u8>, String> {
        crate::common::snapshot::serialize(&self.state)
    }
}

async fn fetch_post_views(post_refs: &[PostRef], viewer_id: &str) -> Vec<PostView> {
    let clients = post_refs
        .iter()
        .map(|p| PostAgentClient::get(p.post_id.clone()))
        .collect::<Vec<_>>();

    let tasks: Vec<_> = clients
        .iter()
        .map(|client| client.get_post_view(viewer_id.to_string()))
        .collect();

    // deleted posts resolve to None and drop out here
    join_all(tasks).await.into_iter().flatten().collect()
}

#[agent_definition(mode = "ephemeral")]
trait FeedViewAgent {
    fn new() -> Self;

    async fn get_feed(&mut self, user_id: String, limit: Option<u32>) -> Option<Vec<PostView>>;

    async fn get_feed_updates(
        &mut self,
        user_id: String,
        updates_since: chrono::DateTime<chrono::Utc>,
    ) -> Option<Vec<PostView>>;
}

struct FeedViewAgentImpl {}

#[agent_implementation]
impl FeedViewAgent for FeedViewAgentImpl {
    fn new() -> Self {
        Self {}
    }

    async fn get_feed(&mut self, user_id: String, limit: Option<u32>) -> Option<Vec<PostView>> {
        let timeline = TimelineAgentClient::get(user_id.clone())
            .get_timeline()
            .await;

        log::debug!("get feed - user id: {user_id}, limit: {limit:?}");

        match timeline {
            Some(timeline) => {
                let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT) as usize;
                let post_refs: Vec<PostRef> = timeline.posts.into_iter().take(limit).collect();

                Some(fetch_post_views(&post_refs, &user_id).await)
            }
            None => Some(vec![]),
        }
    }

    async fn get_feed_updates(
        &mut self,
        user_id: String,
        updates_since: chrono::DateTime<chrono::Utc>,
    ) -> Option<Vec<PostView>> {
        let updates = TimelineAgentClient::get(user_id.clone())
            .get_updates(updates_since)
            .await;

        log::debug!("get feed updates - user id: {user_id}, updates since: {updates_since}");

        match updates {
            Some(post_refs) => Some(fetch_post_views(&post_refs, &user_id).await),
            None => None,
        }
    }
}
