use crate::domain::BenchRider;
use async_trait::async_trait;
use goose::goose::{GooseMethod, GooseRequest, GooseResponse, GooseUser, TransactionError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, HOST};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[async_trait]
pub trait GooseRequestExt {
    async fn get_request(
        &mut self,
        name: &str,
        path: &str,
    ) -> Result<GooseResponse, Box<TransactionError>>;

    async fn post_request<T: Serialize + Send + Sync>(
        &mut self,
        name: &str,
        path: &str,
        json: &T,
    ) -> Result<GooseResponse, Box<TransactionError>>;

    async fn put_request<T: Serialize + Send + Sync>(
        &mut self,
        name: &str,
        path: &str,
        json: &T,
    ) -> Result<GooseResponse, Box<TransactionError>>;

    async fn delete_request(
        &mut self,
        name: &str,
        path: &str,
    ) -> Result<GooseResponse, Box<TransactionError>>;
}

#[async_trait]
impl GooseRequestExt for GooseUser {
    async fn get_request(
        &mut self,
        name: &str,
        path: &str,
    ) -> Result<GooseResponse, Box<TransactionError>> {
        let request_builder = request_builder(self, &GooseMethod::Get, path)?;
        send(self, name, request_builder).await
    }

    async fn post_request<T: Serialize + Send + Sync>(
        &mut self,
        name: &str,
        path: &str,
        json: &T,
    ) -> Result<GooseResponse, Box<TransactionError>> {
        let request_builder = request_builder(self, &GooseMethod::Post, path)?.json(json);
        send(self, name, request_builder).await
    }

    async fn put_request<T: Serialize + Send + Sync>(
        &mut self,
        name: &str,
        path: &str,
        json: &T,
    ) -> Result<GooseResponse, Box<TransactionError>> {
        let request_builder = request_builder(self, &GooseMethod::Put, path)?.json(json);
        send(self, name, request_builder).await
    }

    async fn delete_request(
        &mut self,
        name: &str,
        path: &str,
    ) -> Result<GooseResponse, Box<TransactionError>> {
        let request_builder = request_builder(self, &GooseMethod::Delete, path)?;
        send(self, name, request_builder).await
    }
}

/// Builder with the JSON headers and, once signed in, the rider's token.
fn request_builder(
    user: &GooseUser,
    method: &GooseMethod,
    path: &str,
) -> Result<RequestBuilder, Box<TransactionError>> {
    let builder = user.get_request_builder(method, path)?.headers(get_headers());

    match user.get_session_data::<BenchRider>() {
        Some(rider) => Ok(builder.bearer_auth(&rider.access_token)),
        None => Ok(builder),
    }
}

async fn send(
    user: &mut GooseUser,
    name: &str,
    request_builder: RequestBuilder,
) -> Result<GooseResponse, Box<TransactionError>> {
    user.request(
        GooseRequest::builder().set_request_builder(request_builder).name(name).build(),
    )
    .await
}

fn get_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(host) = std::env::var("API_HOST").ok().and_then(|h| h.parse().ok()) {
        headers.insert(HOST, host);
    }
    headers
}

#[async_trait]
pub trait GooseResponseExt {
    async fn json<T: DeserializeOwned>(self) -> Result<T, Box<TransactionError>>;
}

#[async_trait]
impl GooseResponseExt for GooseResponse {
    async fn json<T: DeserializeOwned>(self) -> Result<T, Box<TransactionError>> {
        match self.response {
            Ok(response) => response.json().await.map_err(|e| Box::new(e.into())),
            Err(e) => Err(Box::new(e.into())),
        }
    }
}
