use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Like flag and like count of a post or comment, as seen by one user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(golem_rust::Schema))]
#[serde(rename_all = "kebab-case")]
pub struct LikeStatus {
    pub is_liked: bool,
    pub likes_count: u32,
}

impl LikeStatus {
    pub fn new(is_liked: bool, likes_count: u32) -> Self {
        LikeStatus {
            is_liked,
            likes_count,
        }
    }

    /// Flips the flag and moves the count one step in the same direction.
    ///
    /// Applying it twice gives back the original status, as long as the
    /// status is consistent (a liked entity always has a count of at least 1).
    pub fn toggled(self) -> Self {
        if self.is_liked {
            LikeStatus {
                is_liked: false,
                likes_count: self.likes_count.saturating_sub(1),
            }
        } else {
            LikeStatus {
                is_liked: true,
                likes_count: self.likes_count.saturating_add(1),
            }
        }
    }

    /// Status after `times` consecutive toggles.
    pub fn toggled_times(self, times: usize) -> Self {
        if times % 2 == 0 {
            self
        } else {
            self.toggled()
        }
    }
}

/// Adds `user_id` to the liker set if absent, removes it otherwise.
pub fn toggle_member(likes: &mut HashSet<String>, user_id: &str) -> LikeStatus {
    let is_liked = if likes.remove(user_id) {
        false
    } else {
        likes.insert(user_id.to_string());
        true
    };

    LikeStatus::new(is_liked, likes.len() as u32)
}

/// Status of a liker set from the point of view of `viewer_id`.
pub fn status_for(likes: &HashSet<String>, viewer_id: &str) -> LikeStatus {
    LikeStatus::new(likes.contains(viewer_id), likes.len() as u32)
}
