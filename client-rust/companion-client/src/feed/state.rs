use crate::feed::ledger::LikeTarget;
use common_lib::api::{CommentView, PostView};
use common_lib::likes::LikeStatus;

/// What the community tab renders: the feed list and, when a post is open,
/// its detail view. The same post may appear in both; every update goes to
/// both copies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedState {
    pub posts: Vec<PostView>,
    pub detail: Option<PostDetail>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostDetail {
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

impl FeedState {
    pub fn post(&self, post_id: &str) -> Option<&PostView> {
        self.posts
            .iter()
            .chain(self.detail.iter().map(|d| &d.post))
            .find(|p| p.post_id == post_id)
    }

    pub fn comment(&self, post_id: &str, comment_id: &str) -> Option<&CommentView> {
        self.detail
            .iter()
            .filter(|d| d.post.post_id == post_id)
            .flat_map(|d| d.comments.iter())
            .find(|c| c.comment_id == comment_id)
    }

    pub(crate) fn like_status(&self, target: &LikeTarget) -> Option<LikeStatus> {
        match target {
            LikeTarget::Post { post_id } => self.post(post_id).map(|p| p.like_status()),
            LikeTarget::Comment {
                post_id,
                comment_id,
            } => self.comment(post_id, comment_id).map(|c| c.like_status()),
        }
    }

    pub(crate) fn apply_like_status(&mut self, target: &LikeTarget, status: LikeStatus) {
        match target {
            LikeTarget::Post { post_id } => {
                for post in self.copies_of_post(post_id) {
                    post.set_like_status(status);
                }
            }
            LikeTarget::Comment {
                post_id,
                comment_id,
            } => {
                if let Some(detail) = self.detail.as_mut().filter(|d| d.post.post_id == *post_id) {
                    for comment in detail
                        .comments
                        .iter_mut()
                        .filter(|c| c.comment_id == *comment_id)
                    {
                        comment.set_like_status(status);
                    }
                }
            }
        }
    }

    pub(crate) fn overlay<'a>(
        &mut self,
        pending: impl Iterator<Item = (&'a LikeTarget, LikeStatus)>,
    ) {
        for (target, status) in pending {
            self.apply_like_status(target, status);
        }
    }

    pub(crate) fn replace_posts(&mut self, posts: Vec<PostView>) {
        if let Some(detail) = self.detail.as_mut() {
            if let Some(fresh) = posts.iter().find(|p| p.post_id == detail.post.post_id) {
                detail.post = fresh.clone();
            }
        }
        self.posts = posts;
    }

    pub(crate) fn insert_post(&mut self, post: PostView) {
        self.posts.retain(|p| p.post_id != post.post_id);
        self.posts.insert(0, post);
    }

    /// Removes the post everywhere. Returns true when its detail view was
    /// open and has been closed.
    pub(crate) fn remove_post(&mut self, post_id: &str) -> bool {
        self.posts.retain(|p| p.post_id != post_id);

        if self.detail.as_ref().is_some_and(|d| d.post.post_id == post_id) {
            self.detail = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn insert_comment(&mut self, comment: CommentView) {
        let post_id = comment.post_id.clone();
        let mut added = true;

        if let Some(detail) = self.detail.as_mut().filter(|d| d.post.post_id == post_id) {
            if detail.comments.iter().any(|c| c.comment_id == comment.comment_id) {
                added = false;
            } else {
                detail.comments.push(comment);
            }
        }

        if added {
            for post in self.copies_of_post(&post_id) {
                post.comments_count += 1;
            }
        }
    }

    pub(crate) fn remove_comment(&mut self, post_id: &str, comment_id: &str) {
        let removed = match self.detail.as_mut().filter(|d| d.post.post_id == post_id) {
            Some(detail) => {
                let before = detail.comments.len();
                detail.comments.retain(|c| c.comment_id != comment_id);
                before != detail.comments.len()
            }
            None => true,
        };

        if removed {
            for post in self.copies_of_post(post_id) {
                post.comments_count = post.comments_count.saturating_sub(1);
            }
        }
    }

    fn copies_of_post<'a>(
        &'a mut self,
        post_id: &'a str,
    ) -> impl Iterator<Item = &'a mut PostView> + 'a {
        self.posts
            .iter_mut()
            .chain(self.detail.iter_mut().map(|d| &mut d.post))
            .filter(move |p| p.post_id == post_id)
    }
}
