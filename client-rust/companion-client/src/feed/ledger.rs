use common_lib::likes::LikeStatus;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// A post or a comment that can be liked.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Post { post_id: String },
    Comment { post_id: String, comment_id: String },
}

impl LikeTarget {
    pub fn post(post_id: impl Into<String>) -> Self {
        LikeTarget::Post {
            post_id: post_id.into(),
        }
    }

    pub fn comment(post_id: impl Into<String>, comment_id: impl Into<String>) -> Self {
        LikeTarget::Comment {
            post_id: post_id.into(),
            comment_id: comment_id.into(),
        }
    }

    pub fn post_id(&self) -> &str {
        match self {
            LikeTarget::Post { post_id } | LikeTarget::Comment { post_id, .. } => post_id,
        }
    }
}

impl Display for LikeTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LikeTarget::Post { post_id } => write!(f, "post {post_id}"),
            LikeTarget::Comment {
                post_id,
                comment_id,
            } => write!(f, "comment {comment_id} of post {post_id}"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    confirmed: LikeStatus,
    in_flight: usize,
}

impl Entry {
    fn displayed(&self) -> LikeStatus {
        self.confirmed.toggled_times(self.in_flight)
    }
}

/// Like toggles that have not been answered by the server yet.
///
/// For each target with toggles in flight it keeps the last status the
/// server confirmed and how many toggles are pending. What the user sees is
/// the confirmed status toggled once per pending request, so a failed request
/// is undone by forgetting it, and success moves the confirmed status. The
/// outcome does not depend on the order in which responses arrive.
#[derive(Debug, Default)]
pub(crate) struct LikeLedger {
    entries: HashMap<LikeTarget, Entry>,
}

impl LikeLedger {
    /// Records a new toggle of `target`, currently shown as `displayed`.
    /// Returns the status to show now.
    pub fn begin(&mut self, target: &LikeTarget, displayed: LikeStatus) -> LikeStatus {
        let entry = self.entries.entry(target.clone()).or_insert(Entry {
            confirmed: displayed,
            in_flight: 0,
        });
        entry.in_flight += 1;
        entry.displayed()
    }

    /// A toggle succeeded. `server` is adopted as the new confirmed status when
    /// given and no other toggle of the target is still pending.
    pub fn commit(&mut self, target: &LikeTarget, server: Option<LikeStatus>) -> Option<LikeStatus> {
        self.finish(target, |entry| {
            entry.confirmed = match server {
                Some(status) if entry.in_flight == 0 => status,
                _ => entry.confirmed.toggled(),
            };
        })
    }

    /// A toggle failed; the status reverts as if it had never been made.
    pub fn rollback(&mut self, target: &LikeTarget) -> Option<LikeStatus> {
        self.finish(target, |_| {})
    }

    pub fn in_flight(&self, target: &LikeTarget) -> usize {
        self.entries.get(target).map_or(0, |e| e.in_flight)
    }

    /// Status to overlay on freshly loaded data for targets still in flight.
    pub fn pending(&self) -> impl Iterator<Item = (&LikeTarget, LikeStatus)> {
        self.entries.iter().map(|(t, e)| (t, e.displayed()))
    }

    pub fn forget_post(&mut self, post_id: &str) {
        self.entries.retain(|target, _| target.post_id() != post_id);
    }

    pub fn forget(&mut self, target: &LikeTarget) {
        self.entries.remove(target);
    }

    fn finish(&mut self, target: &LikeTarget, f: impl FnOnce(&mut Entry)) -> Option<LikeStatus> {
        let entry = self.entries.get_mut(target)?;
        entry.in_flight = entry.in_flight.saturating_sub(1);
        f(entry);

        let displayed = entry.displayed();
        if entry.in_flight == 0 {
            self.entries.remove(target);
        }
        Some(displayed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(is_liked: bool, likes_count: u32) -> LikeStatus {
        LikeStatus::new(is_liked, likes_count)
    }

    #[test]
    fn rollback_restores_original() {
        let mut ledger = LikeLedger::default();
        let target = LikeTarget::post("p1");

        assert_eq!(ledger.begin(&target, status(false, 10)), status(true, 11));
        assert_eq!(ledger.rollback(&target), Some(status(false, 10)));
        assert_eq!(ledger.in_flight(&target), 0);
    }

    #[test]
    fn commit_keeps_optimistic_status() {
        let mut ledger = LikeLedger::default();
        let target = LikeTarget::post("p1");

        ledger.begin(&target, status(false, 10));

        assert_eq!(ledger.commit(&target, None), Some(status(true, 11)));
    }

    #[test]
    fn double_toggle_with_mixed_outcomes() {
        let mut ledger = LikeLedger::default();
        let target = LikeTarget::comment("p1", "c1");

        ledger.begin(&target, status(false, 10));
        assert_eq!(ledger.begin(&target, status(true, 11)), status(false, 10));

        // first request fails, second succeeds: the server saw one toggle
        assert_eq!(ledger.rollback(&target), Some(status(true, 11)));
        assert_eq!(ledger.commit(&target, None), Some(status(true, 11)));
        assert_eq!(ledger.pending().count(), 0);
    }

    #[test]
    fn server_status_adopted_only_when_settled() {
        let mut ledger = LikeLedger::default();
        let target = LikeTarget::post("p1");

        ledger.begin(&target, status(false, 10));
        ledger.begin(&target, status(true, 11));

        // another toggle is pending, the server value would be stale
        assert_eq!(ledger.commit(&target, Some(status(true, 14))), Some(status(false, 10)));
        assert_eq!(ledger.commit(&target, Some(status(false, 13))), Some(status(false, 13)));
    }

    #[test]
    fn unknown_target_is_ignored() {
        let mut ledger = LikeLedger::default();

        assert_eq!(ledger.rollback(&LikeTarget::post("nope")), None);
        assert_eq!(ledger.commit(&LikeTarget::post("nope"), None), None);
    }

    #[test]
    fn forget_post_drops_its_comments() {
        let mut ledger = LikeLedger::default();
        ledger.begin(&LikeTarget::post("p1"), status(false, 0));
        ledger.begin(&LikeTarget::comment("p1", "c1"), status(false, 0));
        ledger.begin(&LikeTarget::post("p2"), status(false, 0));

        ledger.forget_post("p1");

        let pending: Vec<_> = ledger.pending().map(|(t, _)| t.clone()).collect();
        assert_eq!(pending, vec![LikeTarget::post("p2")]);
    }
}
