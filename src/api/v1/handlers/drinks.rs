/*
 * Responsibility
 * - /drinks 系 CRUD handler
 * - 公開一覧は short、保護された detail / 書き込み系は long を返す
 * - 認可そのものは middleware (Guard) が済ませている前提
 */
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::{
    api::v1::{
        dto::drinks::{CreateDrinkRequest, Ingredient, ShortIngredient, UpdateDrinkRequest},
        extractors::AccessClaims,
    },
    error::AppError,
    repos::drink_repo::{self, DrinkRow},
    state::AppState,
};

// Recipes live in the row as a JSON string; a row we cannot parse back is a
// server-side data problem, not a client error.
fn parse_recipe(row: &DrinkRow) -> Result<Vec<Ingredient>, AppError> {
    serde_json::from_str(&row.recipe).map_err(|e| {
        error!(error = %e, drink_id = row.drink_id, "stored recipe is not valid JSON");
        AppError::Internal
    })
}

fn long_drink(row: &DrinkRow) -> Result<Value, AppError> {
    let recipe = parse_recipe(row)?;
    Ok(json!({"id": row.drink_id, "title": row.title, "recipe": recipe}))
}

fn short_drink(row: &DrinkRow) -> Result<Value, AppError> {
    let recipe: Vec<ShortIngredient> = parse_recipe(row)?
        .into_iter()
        .map(ShortIngredient::from)
        .collect();
    Ok(json!({"id": row.drink_id, "title": row.title, "recipe": recipe}))
}

pub async fn list_drinks(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let rows = drink_repo::list(&state.db).await.map_err(|e| {
        error!(error = %e, "failed to list drinks");
        AppError::Internal
    })?;

    let drinks = rows
        .iter()
        .map(short_drink)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(json!({"success": true, "drinks": drinks})))
}

pub async fn drinks_detail(
    State(state): State<AppState>,
    AccessClaims(claims): AccessClaims,
) -> Result<Json<Value>, AppError> {
    debug!(sub = ?claims.sub, "serving drink details");

    let rows = drink_repo::list(&state.db).await.map_err(|e| {
        error!(error = %e, "failed to list drinks");
        AppError::Internal
    })?;

    let drinks = rows.iter().map(long_drink).collect::<Result<Vec<_>, _>>()?;

    Ok(Json(json!({"success": true, "drinks": drinks})))
}

pub async fn create_drink(
    State(state): State<AppState>,
    AccessClaims(claims): AccessClaims,
    Json(req): Json<CreateDrinkRequest>,
) -> Result<Json<Value>, AppError> {
    req.validate().map_err(|_| AppError::BadRequest)?;

    let recipe = serde_json::to_string(&req.recipe).map_err(|_| AppError::Internal)?;

    let row = drink_repo::create(&state.db, &req.title, &recipe)
        .await
        .map_err(|e| {
            // Unique-title violations land here as well.
            error!(error = %e, "failed to create drink");
            AppError::Unprocessable
        })?;

    debug!(sub = ?claims.sub, drink_id = row.drink_id, "drink created");

    Ok(Json(json!({"success": true, "drinks": long_drink(&row)?})))
}

pub async fn update_drink(
    State(state): State<AppState>,
    AccessClaims(claims): AccessClaims,
    Path(drink_id): Path<i64>,
    Json(req): Json<UpdateDrinkRequest>,
) -> Result<Json<Value>, AppError> {
    req.validate().map_err(|_| AppError::BadRequest)?;

    let recipe = match &req.recipe {
        Some(recipe) => Some(serde_json::to_string(recipe).map_err(|_| AppError::Internal)?),
        None => None,
    };

    let row = drink_repo::update(&state.db, drink_id, req.title.as_deref(), recipe.as_deref())
        .await
        .map_err(|e| {
            error!(error = %e, drink_id, "failed to update drink");
            AppError::Unprocessable
        })?
        .ok_or(AppError::NotFound)?;

    debug!(sub = ?claims.sub, drink_id, "drink updated");

    Ok(Json(json!({"success": true, "drinks": [long_drink(&row)?]})))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    AccessClaims(claims): AccessClaims,
    Path(drink_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let row = drink_repo::delete(&state.db, drink_id)
        .await
        .map_err(|e| {
            error!(error = %e, drink_id, "failed to delete drink");
            AppError::Unprocessable
        })?
        .ok_or(AppError::NotFound)?;

    debug!(sub = ?claims.sub, drink_id, "drink deleted");

    Ok(Json(json!({"success": true, "drinks": long_drink(&row)?})))
}
