/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 保護されるルートごとに必要 permission を Guard で指定する
 */
use std::sync::Arc;

use axum::{
    Router,
    handler::Handler,
    middleware::from_fn_with_state,
    routing::{get, patch},
};

use crate::api::v1::handlers::drinks::{
    create_drink, delete_drink, drinks_detail, list_drinks, update_drink,
};
use crate::middleware::auth::{Guard, check_access};
use crate::services::auth::AuthService;
use crate::state::AppState;

pub fn routes(auth: &Arc<AuthService>) -> Router<AppState> {
    let guard =
        |permission: &'static str| from_fn_with_state(Guard::new(auth, permission), check_access);

    Router::new()
        .route(
            "/drinks",
            get(list_drinks).post(create_drink.layer(guard("post:drinks"))),
        )
        .route(
            "/drinks-detail",
            get(drinks_detail.layer(guard("get:drinks-detail"))),
        )
        .route(
            "/drinks/{drink_id}",
            patch(update_drink.layer(guard("patch:drinks")))
                .delete(delete_drink.layer(guard("delete:drinks"))),
        )
}
