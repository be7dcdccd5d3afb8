use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Json, Extension};
use tracing::{debug, info};

use crate::api::rest::dto::{RegisterReq, RegisterResp, UserDto};
use crate::api::rest::error::ApiError;
use crate::domain::service::Service;

pub const MSG_CREATED: &str = "Usuário criado com sucesso";

/// Register a new user
pub async fn register(
    Extension(svc): Extension<Arc<Service>>,
    body: Result<Json<RegisterReq>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResp>), ApiError> {
    // An undecodable body carries no usable credentials.
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Unreadable registration body");
            RegisterReq::default()
        }
    };
    info!("Register request: {:?}", req);

    let user = svc.register(req.email, req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResp {
            message: MSG_CREATED.to_string(),
            user: UserDto::from(user),
        }),
    ))
}
