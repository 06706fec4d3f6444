pub use common_lib::api::{
    AuthResponse, CommentView, CreateComment, CreatePost, OkResult, PostView, SignInRequest,
    SignUpRequest,
};
pub use common_lib::likes::LikeStatus;

/// Credentials of the rider a goose user plays, kept as session data.
#[derive(Clone, Debug)]
pub struct BenchRider {
    pub user_id: String,
    pub access_token: String,
}
