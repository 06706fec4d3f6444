mod data;
mod domain;
mod goose_ext;

use crate::domain::BenchRider;
use crate::goose_ext::{GooseRequestExt, GooseResponseExt};
use goose::prelude::*;
use std::time::Duration;

const BASE_PATH: &str = "/v1/ebike";

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    let custom_host = match std::env::var("HOST") {
        Ok(host) => host,
        Err(_) => "".to_string(),
    };

    GooseAttack::initialize()?
        .register_scenario(
            scenario!("Browse Feed")
                .set_wait_time(Duration::from_secs(1), Duration::from_secs(5))?
                .register_transaction(transaction!(sign_in).set_on_start())
                .register_transaction(transaction!(get_feed).set_weight(3)?)
                .register_transaction(transaction!(get_profile)),
        )
        .register_scenario(
            scenario!("Post, Comments and Likes")
                .set_wait_time(Duration::from_secs(5), Duration::from_secs(15))?
                .register_transaction(transaction!(sign_in).set_on_start())
                .register_transaction(transaction!(create_post_comments_and_likes)),
        )
        .register_scenario(
            scenario!("Rides and Check-ins")
                .set_wait_time(Duration::from_secs(2), Duration::from_secs(10))?
                .register_transaction(transaction!(sign_in).set_on_start())
                .register_transaction(transaction!(record_ride_and_check_in)),
        )
        .register_scenario(
            scenario!("Follow Riders")
                .set_wait_time(Duration::from_secs(5), Duration::from_secs(15))?
                .register_transaction(transaction!(sign_in).set_on_start())
                .register_transaction(transaction!(follow_and_unfollow)),
        )
        .set_default(GooseDefault::Host, custom_host.as_str())?
        .execute()
        .await?;

    Ok(())
}

fn rider(user: &GooseUser) -> Option<BenchRider> {
    user.get_session_data::<BenchRider>().cloned()
}

async fn sign_in(user: &mut GooseUser) -> TransactionResult {
    let user_id = data::rand_user_id();
    let sign_in = domain::SignInRequest {
        contact: data::contact(&user_id),
        password: data::PASSWORD.to_string(),
    };

    let response = user
        .post_request("sign-in", format!("{BASE_PATH}/signin").as_str(), &sign_in)
        .await?;
    let mut auth: domain::AuthResponse = response.json().await.unwrap_or_default();

    if auth.access_token.is_none() {
        let sign_up = domain::SignUpRequest {
            contact: sign_in.contact.clone(),
            password: sign_in.password.clone(),
            name: format!("Rider {user_id}"),
        };
        let response = user
            .post_request("sign-up", format!("{BASE_PATH}/signup").as_str(), &sign_up)
            .await?;
        auth = response.json().await.unwrap_or_default();
    }

    if let (Some(auth_user), Some(access_token)) = (auth.user, auth.access_token) {
        user.set_session_data(BenchRider {
            user_id: auth_user.id,
            access_token,
        });
    }

    Ok(())
}

async fn get_feed(user: &mut GooseUser) -> TransactionResult {
    let Some(rider) = rider(user) else {
        return Ok(());
    };
    let user_id = rider.user_id;

    let response = user
        .get_request("feed-get", format!("{BASE_PATH}/users/{user_id}/feed").as_str())
        .await?;
    let feed: domain::OkResult<Vec<domain::PostView>> = response.json().await?;

    // open the newest post like the detail screen does
    if let Some(post) = feed.ok.first() {
        let post_id = &post.post_id;
        let _response = user
            .get_request(
                "comments-get",
                format!("{BASE_PATH}/posts/{post_id}/comments").as_str(),
            )
            .await?;
    }

    Ok(())
}

async fn get_profile(user: &mut GooseUser) -> TransactionResult {
    let user_id = data::rand_user_id();

    let _response = user
        .get_request(
            "profile-get",
            format!("{BASE_PATH}/users/{user_id}/profile").as_str(),
        )
        .await?;

    Ok(())
}

async fn create_post_comments_and_likes(user: &mut GooseUser) -> TransactionResult {
    let Some(rider) = rider(user) else {
        return Ok(());
    };
    let user_id = rider.user_id;

    // 1. Create Post
    let create_post = domain::CreatePost {
        body: data::rand_post_body(),
        media: None,
    };
    let response = user
        .post_request(
            "post-create",
            format!("{BASE_PATH}/users/{user_id}/posts").as_str(),
            &create_post,
        )
        .await?;
    let created: domain::OkResult<domain::PostView> = response.json().await?;
    let post_id = created.ok.post_id;

    // 2. Like and unlike, as a double tap would
    for _ in 0..2 {
        let response = user
            .post_request(
                "post-like",
                format!("{BASE_PATH}/posts/{post_id}/like").as_str(),
                &(),
            )
            .await?;
        let _status: domain::OkResult<domain::LikeStatus> = response.json().await?;
    }

    // 3. Add Comments and Like them
    let mut last_comment_id = None;
    for _ in 0..2 {
        let create_comment = domain::CreateComment {
            body: data::rand_comment_body(),
        };
        let response = user
            .post_request(
                "comment-add",
                format!("{BASE_PATH}/posts/{post_id}/comments").as_str(),
                &create_comment,
            )
            .await?;
        let comment: domain::OkResult<domain::CommentView> = response.json().await?;
        let comment_id = comment.ok.comment_id;

        let _response = user
            .post_request(
                "comment-like",
                format!("{BASE_PATH}/posts/{post_id}/comments/{comment_id}/like").as_str(),
                &(),
            )
            .await?;
        last_comment_id = Some(comment_id);
    }

    // 4. Delete one comment, then the post
    if let Some(comment_id) = last_comment_id {
        let _response = user
            .delete_request(
                "comment-delete",
                format!("{BASE_PATH}/posts/{post_id}/comments/{comment_id}").as_str(),
            )
            .await?;
    }

    let _response = user
        .delete_request("post-delete", format!("{BASE_PATH}/posts/{post_id}").as_str())
        .await?;

    Ok(())
}

async fn record_ride_and_check_in(user: &mut GooseUser) -> TransactionResult {
    let Some(rider) = rider(user) else {
        return Ok(());
    };
    let user_id = rider.user_id;

    let _response = user
        .post_request(
            "ride-record",
            format!("{BASE_PATH}/users/{user_id}/rides").as_str(),
            &data::rand_ride(),
        )
        .await?;

    let _response = user
        .post_request(
            "check-in",
            format!("{BASE_PATH}/users/{user_id}/check-ins").as_str(),
            &data::rand_check_in(),
        )
        .await?;

    Ok(())
}

async fn follow_and_unfollow(user: &mut GooseUser) -> TransactionResult {
    let Some(rider) = rider(user) else {
        return Ok(());
    };
    let user_id = rider.user_id;
    let other_id = data::rand_user_id();
    if other_id == user_id {
        return Ok(());
    }

    let path = format!("{BASE_PATH}/users/{user_id}/following/{other_id}");
    let _response = user.put_request("follow", path.as_str(), &()).await?;
    let _response = user.delete_request("unfollow", path.as_str()).await?;

    Ok(())
}
