use crate::api::v1::handler::ApiResponse;
use crate::application_port::FriendError;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(err) = err.find::<ApiErrorCode>() {
        let json = warp::reply::json(&ApiResponse::<()>::err(err.clone(), err.to_string()));
        Ok(warp::reply::with_status(json, StatusCode::OK))
    } else {
        let json = warp::reply::json(&ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ApiError {
                code: ApiErrorCode::InternalError,
                message: format!("Unhandled error: {:?}", err),
            }),
        });
        Ok(warp::reply::with_status(
            json,
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Missing or invalid parameter")]
    InvalidParameter,
    #[error("User or application not found")]
    NotFound,
    #[error("Cannot send a friend application to yourself")]
    ApplySelf,
    #[error("You are already friends with this user")]
    AlreadyFriend,
    #[error("Too many unresolved applications to this user")]
    ApplyTooOften,
    #[error("Missing caller identity")]
    MissingIdentity,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    /// Store faults are logged here with their context; the caller only ever
    /// sees the generic code.
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<FriendError> for ApiErrorCode {
    fn from(error: FriendError) -> Self {
        match error {
            FriendError::InvalidParameter => ApiErrorCode::InvalidParameter,
            FriendError::NotFound => ApiErrorCode::NotFound,
            FriendError::ApplySelf => ApiErrorCode::ApplySelf,
            FriendError::AlreadyFriend => ApiErrorCode::AlreadyFriend,
            FriendError::ApplyRateLimited => ApiErrorCode::ApplyTooOften,
            FriendError::Store(e) => ApiErrorCode::internal(e),
        }
    }
}
