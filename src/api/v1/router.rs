use super::error::*;
use super::handler;
use super::handler::{ApplyRequest, ApplyResultRequest, DeleteRequest, FriendListQuery, ProfileQuery};
use crate::domain_model::UserId;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

/// Set by the authenticating gateway in front of this service.
const IDENTITY_HEADER: &str = "x-user-id";

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let profile = warp::get()
        .and(warp::path("friend"))
        .and(warp::path("profile"))
        .and(warp::path::end())
        .and(warp::query::<ProfileQuery>())
        .and(with_identity())
        .and(with(server.friend_query_service.clone()))
        .and_then(handler::friend_profile);

    let list = warp::get()
        .and(warp::path("friend"))
        .and(warp::path("list"))
        .and(warp::path::end())
        .and(warp::query::<FriendListQuery>())
        .and(with_identity())
        .and(with(server.friend_query_service.clone()))
        .and_then(handler::friend_list);

    let apply = warp::post()
        .and(warp::path("friend"))
        .and(warp::path("apply"))
        .and(warp::path::end())
        .and(warp::body::json::<ApplyRequest>())
        .and(with_identity())
        .and(with(server.friend_apply_service.clone()))
        .and_then(handler::friend_apply);

    let apply_list = warp::get()
        .and(warp::path("friend"))
        .and(warp::path("apply_list"))
        .and(warp::path::end())
        .and(with_identity())
        .and(with(server.friend_apply_service.clone()))
        .and_then(handler::friend_apply_list);

    let apply_count = warp::get()
        .and(warp::path("friend"))
        .and(warp::path("apply_count"))
        .and(warp::path::end())
        .and(with_identity())
        .and(with(server.friend_apply_service.clone()))
        .and_then(handler::friend_apply_count);

    let apply_result = warp::post()
        .and(warp::path("friend"))
        .and(warp::path("apply_result"))
        .and(warp::path::end())
        .and(warp::body::json::<ApplyResultRequest>())
        .and(with_identity())
        .and(with(server.friend_apply_service.clone()))
        .and_then(handler::friend_apply_result);

    let delete = warp::post()
        .and(warp::path("friend"))
        .and(warp::path("delete"))
        .and(warp::path::end())
        .and(warp::body::json::<DeleteRequest>())
        .and(with_identity())
        .and(with(server.friend_delete_service.clone()))
        .and_then(handler::friend_delete);

    profile
        .or(list)
        .or(apply)
        .or(apply_list)
        .or(apply_count)
        .or(apply_result)
        .or(delete)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_identity() -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::<String>(IDENTITY_HEADER).and_then(|id: String| async move {
        let user_id = UserId::new(id);
        if user_id.is_empty() {
            Err(reject::custom(ApiErrorCode::MissingIdentity))
        } else {
            Ok(user_id)
        }
    })
}
