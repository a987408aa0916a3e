//! Route handlers and the response envelope they share.

pub mod account;
pub mod admin;
pub mod comments;
pub mod posts;

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Body of every successful response.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub message: String,
  pub status:  &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:    Option<T>,
}

pub fn reply<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
  let body = Envelope { message: message.to_owned(), status: "success", data: Some(data) };
  (status, Json(body)).into_response()
}

pub fn ok<T: Serialize>(message: &str, data: T) -> Response {
  reply(StatusCode::OK, message, data)
}

pub fn created<T: Serialize>(message: &str, data: T) -> Response {
  reply(StatusCode::CREATED, message, data)
}

/// A success response with no payload.
pub fn done(message: &str) -> Response {
  let body = Envelope::<()> { message: message.to_owned(), status: "success", data: None };
  (StatusCode::OK, Json(body)).into_response()
}

pub fn with_etag(mut res: Response, etag: &str) -> Response {
  if let Ok(value) = HeaderValue::from_str(etag) {
    res.headers_mut().insert(header::ETAG, value);
  }
  res
}

/// Parse a path or body id; anything but a UUID is a 400.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw.trim())
    .map_err(|_| ApiError::InvalidInput(format!("{what} {raw:?} is not a valid id")))
}

/// Unwrap a JSON body, turning axum's rejection into our error shape.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
  payload
    .map(|Json(body)| body)
    .map_err(|e| ApiError::InvalidInput(e.body_text()))
}

pub async fn welcome() -> Response { done("Welcome to the Agora API.") }
