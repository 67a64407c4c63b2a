use super::error::*;
use crate::application_port::{FriendApplyService, FriendDeleteService, FriendQueryService};
use crate::domain_model::*;
use crate::logger::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub user_id: String,
}

pub async fn friend_profile(
    query: ProfileQuery,
    requester: UserId,
    query_service: Arc<dyn FriendQueryService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!("api.friend.profile requester={} target={}", requester, query.user_id);

    let joined = query_service
        .profile(&requester, &query.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(joined)))
}

#[derive(Debug, Deserialize)]
pub struct FriendListQuery {
    pub user_id: String,
}

pub async fn friend_list(
    query: FriendListQuery,
    requester: UserId,
    query_service: Arc<dyn FriendQueryService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!("api.friend.list requester={}", requester);

    let friends = query_service
        .list(&requester, &UserId::new(query.user_id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(friends)))
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub friend_id: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse;

pub async fn friend_apply(
    body: ApplyRequest,
    requester: UserId,
    apply_service: Arc<dyn FriendApplyService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!("api.friend.apply from={} to={}", requester, body.friend_id);

    apply_service
        .apply(&requester, &UserId::new(body.friend_id), &body.reason)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(ApplyResponse)))
}

pub async fn friend_apply_list(
    requester: UserId,
    apply_service: Arc<dyn FriendApplyService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!("api.friend.apply_list user={}", requester);

    let applies = apply_service
        .apply_list(&requester)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(applies)))
}

#[derive(Debug, Serialize)]
pub struct ApplyCountResponse {
    pub count: i64,
}

pub async fn friend_apply_count(
    requester: UserId,
    apply_service: Arc<dyn FriendApplyService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let count = apply_service
        .apply_count(&requester)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(ApplyCountResponse {
        count,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ApplyResultRequest {
    pub friend_id: String,
    pub agree: bool,
}

#[derive(Debug, Serialize)]
pub struct ApplyResultResponse;

pub async fn friend_apply_result(
    body: ApplyResultRequest,
    requester: UserId,
    apply_service: Arc<dyn FriendApplyService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!(
        "api.friend.apply_result responder={} applicant={} agree={}",
        requester, body.friend_id, body.agree
    );

    apply_service
        .apply_result(&requester, &UserId::new(body.friend_id), body.agree)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(ApplyResultResponse)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub friend_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse;

pub async fn friend_delete(
    body: DeleteRequest,
    requester: UserId,
    delete_service: Arc<dyn FriendDeleteService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!("api.friend.delete owner={} friend={}", requester, body.friend_id);

    delete_service
        .delete(&requester, &UserId::new(body.friend_id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(DeleteResponse)))
}
