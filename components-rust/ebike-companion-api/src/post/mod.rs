use crate::common::Author;
use crate::rider::RiderAgentClient;
use common_lib::api::{CommentView, PostView};
use common_lib::likes::{self, LikeStatus};
use common_lib::validation;
use golem_rust::{agent_definition, agent_implementation, Schema};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const MAX_COMMENTS: usize = 2000;

#[derive(Schema, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub author: Author,
    pub body: String,
    pub likes: HashSet<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Comment {
    fn new(author: Author, body: String) -> Self {
        let now = chrono::Utc::now();
        Comment {
            comment_id: uuid::Uuid::new_v4().to_string(),
            author,
            body,
            likes: HashSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn view(&self, post_id: &str, viewer_id: &str) -> CommentView {
        let status = likes::status_for(&self.likes, viewer_id);
        CommentView {
            comment_id: self.comment_id.clone(),
            post_id: post_id.to_string(),
            author_id: self.author.user_id.clone(),
            author_name: self.author.name.clone(),
            author_avatar: self.author.avatar.clone(),
            body: self.body.clone(),
            likes_count: status.likes_count,
            liked_by_viewer: status.is_liked,
            created_at: self.created_at,
        }
    }
}

#[derive(Schema, Clone, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub author: Author,
    pub body: String,
    pub media: Option<String>,
    pub likes: HashSet<String>,
    pub comments: Vec<Comment>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Post {
    fn new(post_id: String, author: Author, body: String, media: Option<String>) -> Self {
        let now = chrono::Utc::now();
        Post {
            post_id,
            author,
            body,
            media,
            likes: HashSet::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn view(&self, viewer_id: &str) -> PostView {
        let status = likes::status_for(&self.likes, viewer_id);
        PostView {
            post_id: self.post_id.clone(),
            author_id: self.author.user_id.clone(),
            author_name: self.author.name.clone(),
            author_avatar: self.author.avatar.clone(),
            body: self.body.clone(),
            media: self.media.clone(),
            likes_count: status.likes_count,
            comments_count: self.comments.len() as u32,
            liked_by_viewer: status.is_liked,
            created_at: self.created_at,
        }
    }

    fn comment_mut(&mut self, comment_id: &str) -> Result<&mut Comment, String> {
        self.comments
            .iter_mut()
            .find(|c| c.comment_id == comment_id)
            .ok_or_else(|| "Comment not found".to_string())
    }

    fn remove_comment(&mut self, comment_id: &str, user_id: &str) -> Result<(), String> {
        let comment = self
            .comments
            .iter()
            .find(|c| c.comment_id == comment_id)
            .ok_or_else(|| "Comment not found".to_string())?;

        // Post authors moderate their own threads.
        if comment.author.user_id != user_id && self.author.user_id != user_id {
            Err("Not the comment author".to_string())
        } else {
            self.comments.retain(|c| c.comment_id != comment_id);
            self.updated_at = chrono::Utc::now();
            Ok(())
        }
    }
}

#[agent_definition]
trait PostAgent {
    fn new(id: String) -> Self;

    fn get_post(&self) -> Option<Post>;

    fn get_post_view(&self, viewer_id: String) -> Option<PostView>;

    fn init_post(
        &mut self,
        author: Author,
        body: String,
        media: Option<String>,
    ) -> Result<PostView, String>;

    fn toggle_like(&mut self, user_id: String) -> Result<LikeStatus, String>;

    fn get_comments(&self, viewer_id: String) -> Option<Vec<CommentView>>;

    fn add_comment(&mut self, author: Author, body: String) -> Result<CommentView, String>;

    fn toggle_comment_like(
        &mut self,
        comment_id: String,
        user_id: String,
    ) -> Result<LikeStatus, String>;

    fn delete_comment(&mut self, comment_id: String, user_id: String) -> Result<(), String>;

    fn delete_post(&mut self, user_id: String) -> Result<(), String>;
}

struct PostAgentImpl {
    _id: String,
    state: Option<Post>,
}

impl PostAgentImpl {
    fn with_existing<T>(
        &mut self,
        f: impl FnOnce(&mut Post) -> Result<T, String>,
    ) -> Result<T, String> {
        match self.state.as_mut() {
            Some(state) => f(state),
            None => Err("Post not exists".to_string()),
        }
    }
}

#[agent_implementation]
impl PostAgent for PostAgentImpl {
    fn new(id: String) -> Self {
        PostAgentImpl {
            _id: id,
            state: None,
        }
    }

    fn get_post(&self) -> Option<Post> {
        self.state.clone()
    }

    fn get_post_view(&self, viewer_id: String) -> Option<PostView> {
        self.state.as_ref().map(|state| state.view(&viewer_id))
    }

    fn init_post(
        &mut self,
        author: Author,
        body: String,
        media: Option<String>,
    ) -> Result<PostView, String> {
        if self.state.is_some() {
            Err("Post already exists".to_string())
        } else {
            validation::validate_post(&body, media.as_deref()).map_err(|e| e.to_string())?;

            log::info!(
                "init post - id: {}, author id: {}, has media: {}",
                self._id,
                author.user_id,
                media.is_some()
            );

            let author_id = author.user_id.clone();
            let post = Post::new(self._id.clone(), author, body, media);
            let view = post.view(&author_id);
            self.state = Some(post);

            Ok(view)
        }
    }

    fn toggle_like(&mut self, user_id: String) -> Result<LikeStatus, String> {
        self.with_existing(|state| {
            let status = likes::toggle_member(&mut state.likes, &user_id);
            state.updated_at = chrono::Utc::now();

            log::info!(
                "toggle like - post id: {}, user id: {user_id}, liked: {}, count: {}",
                state.post_id,
                status.is_liked,
                status.likes_count
            );

            Ok(status)
        })
    }

    fn get_comments(&self, viewer_id: String) -> Option<Vec<CommentView>> {
        self.state.as_ref().map(|state| {
            state
                .comments
                .iter()
                .map(|c| c.view(&state.post_id, &viewer_id))
                .collect()
        })
    }

    fn add_comment(&mut self, author: Author, body: String) -> Result<CommentView, String> {
        self.with_existing(|state| {
            validation::validate_comment(&body).map_err(|e| e.to_string())?;

            if state.comments.len() >= MAX_COMMENTS {
                Err("Max comments reached".to_string())
            } else {
                log::info!(
                    "add comment - post id: {}, author id: {}",
                    state.post_id,
                    author.user_id
                );

                let author_id = author.user_id.clone();
                let comment = Comment::new(author, body);
                let view = comment.view(&state.post_id, &author_id);

                state.updated_at = comment.created_at;
                state.comments.push(comment);

                Ok(view)
            }
        })
    }

    fn toggle_comment_like(
        &mut self,
        comment_id: String,
        user_id: String,
    ) -> Result<LikeStatus, String> {
        self.with_existing(|state| {
            let comment = state.comment_mut(&comment_id)?;
            let status = likes::toggle_member(&mut comment.likes, &user_id);
            comment.updated_at = chrono::Utc::now();

            log::info!(
                "toggle comment like - comment id: {comment_id}, user id: {user_id}, liked: {}",
                status.is_liked
            );

            Ok(status)
        })
    }

    fn delete_comment(&mut self, comment_id: String, user_id: String) -> Result<(), String> {
        self.with_existing(|state| {
            log::info!("delete comment - comment id: {comment_id}, user id: {user_id}");
            state.remove_comment(&comment_id, &user_id)
        })
    }

    fn delete_post(&mut self, user_id: String) -> Result<(), String> {
        let author_id = self.with_existing(|state| {
            if state.author.user_id != user_id {
                Err("Not the post author".to_string())
            } else {
                Ok(state.author.user_id.clone())
            }
        })?;

        log::info!("delete post - id: {}, author id: {author_id}", self._id);

        self.state = None;
        RiderAgentClient::get(author_id).trigger_post_deleted(self._id.clone());

        Ok(())
    }

    async fn load_snapshot(&mut self, bytes: Vec<u8>) -> Result<(), String> {
        let data: Option<Post> = crate::common::snapshot::deserialize(&bytes)?;
        self.state = data;
        Ok(())
    }

    async fn save_snapshot(&self) -> Result<Vec<u8>, String> {
        crate::common::snapshot::serialize(&self.state)
    }
}
