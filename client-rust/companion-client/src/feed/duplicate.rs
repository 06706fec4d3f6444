use common_lib::api::PostView;
use serde::{Deserialize, Serialize};

/// A post the rider is about to publish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub body: String,
    pub media: Option<String>,
}

impl PostDraft {
    pub fn new(body: impl Into<String>, media: Option<String>) -> Self {
        PostDraft {
            body: body.into(),
            media,
        }
    }

    fn media(&self) -> Option<&str> {
        self.media.as_deref().filter(|m| !m.is_empty())
    }

    fn same_as(&self, post: &PostView) -> bool {
        self.body == post.body && self.media() == post.media.as_deref().filter(|m| !m.is_empty())
    }
}

/// Looks for `draft` among the `window` most recent posts of `author_id`.
pub(crate) fn find_duplicate<'a>(
    posts: &'a [PostView],
    author_id: &str,
    draft: &PostDraft,
    window: usize,
) -> Option<&'a PostView> {
    let mut own: Vec<&PostView> = posts.iter().filter(|p| p.author_id == author_id).collect();
    own.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    own.into_iter().take(window).find(|p| draft.same_as(p))
}
