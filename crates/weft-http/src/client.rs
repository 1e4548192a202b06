use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::HttpError;

/// A response body delivered chunk by chunk, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// Client bound to one backend base URL.
///
/// Endpoints are addressed by path segments so ids are percent-encoded and
/// any path prefix on the base URL is kept.
#[derive(Debug, Clone)]
pub struct HttpClient {
  client: Client,
  base: Url,
}

impl HttpClient {
  pub fn new(base_url: &str) -> Result<Self, HttpError> {
    Self::with_client(Client::new(), base_url)
  }

  pub fn with_client(client: Client, base_url: &str) -> Result<Self, HttpError> {
    let base = Url::parse(base_url).map_err(|source| HttpError::InvalidUrl {
      url: base_url.to_string(),
      source,
    })?;
    if base.cannot_be_a_base() {
      return Err(HttpError::NotABase(base_url.to_string()));
    }
    Ok(Self { client, base })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  /// Absolute URL for the given path segments.
  pub fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    // Checked in the constructor, so this always succeeds.
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  /// POST and return the raw response without checking its status.
  pub async fn post_raw<B: Serialize + ?Sized>(
    &self,
    segments: &[&str],
    body: Option<&B>,
  ) -> Result<Response, HttpError> {
    let url = self.endpoint(segments);
    debug!(url = %url, "http_post");
    let mut request = self.client.post(url);
    if let Some(body) = body {
      request = request.json(body);
    }
    Ok(request.send().await?)
  }

  /// GET a JSON document.
  pub async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, HttpError> {
    let url = self.endpoint(segments);
    debug!(url = %url, "http_get");
    let response = self.client.get(url).send().await?;
    decode(check(response).await?).await
  }

  /// POST a JSON body and decode a JSON reply.
  pub async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T, HttpError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let response = self.post_raw(segments, Some(body)).await?;
    decode(check(response).await?).await
  }

  /// POST with no body and decode a JSON reply.
  pub async fn post_empty<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, HttpError> {
    let response = self.post_raw::<()>(segments, None).await?;
    decode(check(response).await?).await
  }

  /// POST a JSON body and hand back the response body as a byte stream.
  ///
  /// Fails before yielding anything if the response status is not a success.
  pub async fn post_stream<B: Serialize + ?Sized>(
    &self,
    segments: &[&str],
    body: &B,
  ) -> Result<ByteStream, HttpError> {
    let response = check(self.post_raw(segments, Some(body)).await?).await?;
    Ok(
      response
        .bytes_stream()
        .map_err(HttpError::Request)
        .boxed(),
    )
  }
}

/// Turn a non-success response into [`HttpError::Status`].
pub async fn check(response: Response) -> Result<Response, HttpError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let url = response.url().to_string();
  let body = response.text().await.unwrap_or_default();
  Err(HttpError::Status {
    url,
    status: status.as_u16(),
    body,
  })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, HttpError> {
  let url = response.url().to_string();
  let bytes = response.bytes().await?;
  serde_json::from_slice(&bytes).map_err(|source| HttpError::Decode { url, source })
}
