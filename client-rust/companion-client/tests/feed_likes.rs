mod common;

use assert_matches::assert_matches;
use common::{comment, loaded_feed, post, rider, signed_in, MockRemote};
use common_lib::likes::LikeStatus;
use companion_client::{ClientError, FeedSettings, LikeResolution, LikeTarget, ReconcilePolicy};

fn status(is_liked: bool, likes_count: u32) -> LikeStatus {
    LikeStatus::new(is_liked, likes_count)
}

fn feed_posts() -> Vec<common_lib::api::PostView> {
    vec![post("p1", "u002", false, 10), post("p2", "u001", true, 3)]
}

#[tokio::test]
async fn like_is_shown_before_the_server_answers() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let tx = remote.hold_like();

    let before = feed.snapshot();
    let pending = feed.toggle_post_like("p1").unwrap();

    assert_eq!(pending.optimistic(), status(true, 11));
    assert_eq!(pending.target(), &LikeTarget::post("p1"));
    assert_eq!(feed.posts()[0].like_status(), status(true, 11));
    assert_eq!(before.posts[0].like_status(), status(false, 10));
    assert_eq!(remote.count("toggle_post_like"), 0);

    let handle = tokio::spawn(pending);
    remote.wait_for_calls("toggle_post_like", 1).await;
    assert_eq!(feed.in_flight(&LikeTarget::post("p1")), 1);

    tx.send(Ok(status(true, 11))).unwrap();

    assert_eq!(handle.await.unwrap(), LikeResolution::Committed(status(true, 11)));
    assert_eq!(feed.posts()[0].like_status(), status(true, 11));
    assert_eq!(feed.in_flight(&LikeTarget::post("p1")), 0);
}

#[tokio::test]
async fn failed_like_restores_previous_state() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let tx = remote.hold_like();

    let pending = feed.toggle_post_like("p1").unwrap();
    assert_eq!(feed.posts()[0].like_status(), status(true, 11));

    tx.send(Err(ClientError::Transport("connection reset".to_string())))
        .unwrap();

    assert_matches!(
        pending.await,
        LikeResolution::RolledBack { status: s, error: ClientError::Transport(_) } if s == status(false, 10)
    );
    assert_eq!(feed.posts()[0].like_status(), status(false, 10));
    assert!(session.is_active());
}

#[tokio::test]
async fn unlike_rolls_back_too() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let tx = remote.hold_like();

    let pending = feed.toggle_post_like("p2").unwrap();
    assert_eq!(pending.optimistic(), status(false, 2));

    tx.send(Err(ClientError::Malformed("not json".to_string())))
        .unwrap();

    assert_matches!(pending.await, LikeResolution::RolledBack { .. });
    assert_eq!(feed.posts()[1].like_status(), status(true, 3));
}

#[tokio::test]
async fn two_successful_toggles_cancel_out() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;

    let first = feed.toggle_post_like("p1").unwrap();
    let second = feed.toggle_post_like("p1").unwrap();

    assert_eq!(first.await, LikeResolution::Committed(status(false, 10)));
    assert_eq!(second.await, LikeResolution::Committed(status(false, 10)));
    assert_eq!(feed.posts()[0].like_status(), status(false, 10));
    assert_eq!(remote.count("toggle_post_like"), 2);
}

#[tokio::test]
async fn double_toggle_with_failed_first_request_keeps_second() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let tx1 = remote.hold_like();
    let tx2 = remote.hold_like();

    let first = feed.toggle_post_like("p1").unwrap();
    let second = feed.toggle_post_like("p1").unwrap();
    assert_eq!(first.optimistic(), status(true, 11));
    assert_eq!(second.optimistic(), status(false, 10));
    assert_eq!(feed.in_flight(&LikeTarget::post("p1")), 2);

    let h1 = tokio::spawn(first);
    remote.wait_for_calls("toggle_post_like", 1).await;
    let h2 = tokio::spawn(second);
    remote.wait_for_calls("toggle_post_like", 2).await;

    tx1.send(Err(ClientError::Transport("timeout".to_string())))
        .unwrap();
    assert_matches!(h1.await.unwrap(), LikeResolution::RolledBack { status: s, .. } if s == status(true, 11));

    tx2.send(Ok(status(true, 11))).unwrap();
    assert_eq!(h2.await.unwrap(), LikeResolution::Committed(status(true, 11)));

    // the server saw exactly one successful toggle
    assert_eq!(feed.posts()[0].like_status(), status(true, 11));
}

#[tokio::test]
async fn double_toggle_result_does_not_depend_on_response_order() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let tx1 = remote.hold_like();
    let tx2 = remote.hold_like();

    let h1 = tokio::spawn(feed.toggle_post_like("p1").unwrap());
    remote.wait_for_calls("toggle_post_like", 1).await;
    let h2 = tokio::spawn(feed.toggle_post_like("p1").unwrap());
    remote.wait_for_calls("toggle_post_like", 2).await;

    tx1.send(Ok(status(true, 11))).unwrap();
    assert_eq!(h1.await.unwrap(), LikeResolution::Committed(status(false, 10)));

    tx2.send(Err(ClientError::Transport("timeout".to_string())))
        .unwrap();
    assert_matches!(h2.await.unwrap(), LikeResolution::RolledBack { status: s, .. } if s == status(true, 11));

    assert_eq!(feed.posts()[0].like_status(), status(true, 11));
}

#[tokio::test]
async fn likes_update_feed_and_detail_copies() {
    let remote = MockRemote::with_feed(feed_posts());
    remote.set_comments(vec![comment("p1", "c1", "u003")]);
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    feed.open_detail("p1").await.unwrap();

    let pending = feed.toggle_post_like("p1").unwrap();
    let detail = feed.detail().unwrap();
    assert_eq!(detail.post.like_status(), status(true, 11));
    assert_eq!(feed.posts()[0].like_status(), status(true, 11));
    assert_eq!(pending.await, LikeResolution::Committed(status(true, 11)));

    let pending = feed.toggle_comment_like("p1", "c1").unwrap();
    assert_eq!(pending.optimistic(), status(true, 1));
    assert_eq!(pending.await, LikeResolution::Committed(status(true, 1)));

    let detail = feed.detail().unwrap();
    assert!(detail.comments[0].liked_by_viewer);
    assert_eq!(detail.comments[0].likes_count, 1);
    assert_eq!(detail.post.like_status(), feed.posts()[0].like_status());
}

#[tokio::test]
async fn toggle_without_session_changes_nothing() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    session.end().unwrap();

    let before = feed.snapshot();

    assert!(feed.toggle_post_like("p1").is_none());
    assert!(feed.toggle_comment_like("p1", "c1").is_none());
    assert_eq!(*feed.snapshot(), *before);
    assert_eq!(remote.count("toggle_post_like"), 0);
}

#[tokio::test]
async fn toggle_of_unknown_post_is_ignored() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;

    assert!(feed.toggle_post_like("nope").is_none());
    // comments exist only for the open post
    assert!(feed.toggle_comment_like("p1", "c1").is_none());
}

#[tokio::test]
async fn closing_abandons_requests_in_flight() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let _tx = remote.hold_like();

    let handle = tokio::spawn(feed.toggle_post_like("p1").unwrap());
    remote.wait_for_calls("toggle_post_like", 1).await;

    feed.close();

    assert_eq!(handle.await.unwrap(), LikeResolution::Cancelled);
    assert!(feed.is_closed());
    assert!(feed.toggle_post_like("p1").is_none());
    assert!(session.is_active());
}

#[tokio::test]
async fn rejected_token_ends_session_and_rolls_back() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let tx = remote.hold_like();

    let pending = feed.toggle_post_like("p1").unwrap();
    tx.send(Err(ClientError::Unauthenticated)).unwrap();

    assert_matches!(
        pending.await,
        LikeResolution::RolledBack { error: ClientError::Unauthenticated, .. }
    );
    assert_eq!(feed.posts()[0].like_status(), status(false, 10));
    assert!(!session.is_active());
}

#[tokio::test]
async fn rejection_of_an_old_token_keeps_the_new_session() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let tx = remote.hold_like();

    let handle = tokio::spawn(feed.toggle_post_like("p1").unwrap());
    remote.wait_for_calls("toggle_post_like", 1).await;

    session.end().unwrap();
    session.begin(rider("u001"), "token-2".to_string()).unwrap();
    tx.send(Err(ClientError::Unauthenticated)).unwrap();

    assert_matches!(
        handle.await.unwrap(),
        LikeResolution::RolledBack { error: ClientError::Unauthenticated, .. }
    );
    assert_eq!(feed.posts()[0].like_status(), status(false, 10));
    assert_eq!(session.access_token().as_deref(), Some("token-2"));
}

#[tokio::test]
async fn dropped_toggle_is_undone() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;

    drop(feed.toggle_post_like("p1").unwrap());

    assert_eq!(feed.posts()[0].like_status(), status(false, 10));
    assert_eq!(feed.in_flight(&LikeTarget::post("p1")), 0);
    assert_eq!(remote.count("toggle_post_like"), 0);

    let pending = feed.toggle_post_like("p1").unwrap();
    assert_eq!(pending.optimistic(), status(true, 11));
    assert_eq!(pending.await, LikeResolution::Committed(status(true, 11)));

    // one toggle reached the server and one is shown
    assert_eq!(remote.count("toggle_post_like"), 1);
    assert_eq!(feed.posts()[0].like_status(), status(true, 11));
    assert_eq!(feed.in_flight(&LikeTarget::post("p1")), 0);
}

#[tokio::test]
async fn aborted_like_task_is_undone() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let _tx = remote.hold_like();

    let handle = tokio::spawn(feed.toggle_post_like("p2").unwrap());
    remote.wait_for_calls("toggle_post_like", 1).await;
    assert_eq!(feed.posts()[1].like_status(), status(false, 2));

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    assert_eq!(feed.posts()[1].like_status(), status(true, 3));
    assert_eq!(feed.in_flight(&LikeTarget::post("p2")), 0);
}

#[tokio::test]
async fn server_status_is_adopted_when_configured() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let settings = FeedSettings {
        reconcile_policy: ReconcilePolicy::AdoptServer,
        ..FeedSettings::default()
    };
    let feed = loaded_feed(&remote, &session, settings).await;
    let tx = remote.hold_like();

    let pending = feed.toggle_post_like("p1").unwrap();
    // others liked the post meanwhile
    tx.send(Ok(status(true, 14))).unwrap();

    assert_eq!(pending.await, LikeResolution::Committed(status(true, 14)));
    assert_eq!(feed.posts()[0].like_status(), status(true, 14));
}

#[tokio::test]
async fn refresh_keeps_likes_still_in_flight() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let tx = remote.hold_like();

    let handle = tokio::spawn(feed.toggle_post_like("p1").unwrap());
    remote.wait_for_calls("toggle_post_like", 1).await;

    feed.refresh_feed().await.unwrap();
    assert_eq!(feed.posts()[0].like_status(), status(true, 11));

    tx.send(Ok(status(true, 11))).unwrap();
    assert_eq!(handle.await.unwrap(), LikeResolution::Committed(status(true, 11)));
    assert_eq!(feed.posts()[0].like_status(), status(true, 11));
}

#[tokio::test]
async fn late_answer_for_deleted_post_is_discarded() {
    let remote = MockRemote::with_feed(feed_posts());
    let session = signed_in();
    let feed = loaded_feed(&remote, &session, FeedSettings::default()).await;
    let tx = remote.hold_like();

    let handle = tokio::spawn(feed.toggle_post_like("p2").unwrap());
    remote.wait_for_calls("toggle_post_like", 1).await;

    feed.delete_post("p2").await.unwrap();
    tx.send(Ok(status(false, 2))).unwrap();

    assert_eq!(handle.await.unwrap(), LikeResolution::Discarded);
    assert!(feed.posts().iter().all(|p| p.post_id != "p2"));
}
