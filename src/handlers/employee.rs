//! Employee handlers
//!
//! Thin HTTP wrappers around [`EmployeeService`](crate::hierarchy::EmployeeService):
//! role check, input validation, envelope.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};
use crate::hierarchy::service::{
    MSG_CREATED, MSG_DELETED, MSG_FETCHED, MSG_LISTED, MSG_SUBORDINATES, MSG_UPDATED,
};
use crate::hierarchy::{Employee, EmployeeChanges, NewEmployee, Paginated, SubordinatesView};
use crate::middleware::CurrentUser;
use crate::permission::policy;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Longest accepted name or position
pub const MAX_TEXT_LEN: usize = 255;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub manager_id: Option<i64>,
}

/// Partial update; `"managerId": null` moves the employee to the top level
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub manager_id: Option<Option<i64>>,
}

/// Distinguish an explicit `null` from an absent field
fn present<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

fn validate_text(field: &str, value: String) -> AppResult<String> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_TEXT_LEN
        )));
    }
    Ok(value)
}

impl CreateEmployeeRequest {
    fn validate(self) -> AppResult<NewEmployee> {
        Ok(NewEmployee {
            name: validate_text("name", self.name)?,
            position: validate_text("position", self.position)?,
            manager_id: self.manager_id,
        })
    }
}

impl UpdateEmployeeRequest {
    fn validate(self) -> AppResult<EmployeeChanges> {
        Ok(EmployeeChanges {
            name: self.name.map(|v| validate_text("name", v)).transpose()?,
            position: self.position.map(|v| validate_text("position", v)).transpose()?,
            manager_id: self.manager_id,
        })
    }
}

/// POST /api/employees
pub async fn create_employee(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateEmployeeRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Employee>>)> {
    user.require(policy::CREATE_EMPLOYEE)?;
    let employee = state.employees.create(req.validate()?).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MSG_CREATED, employee)),
    ))
}

/// GET /api/employees?page=&limit=
pub async fn list_employees(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Paginated<Employee>>>> {
    user.require(policy::LIST_EMPLOYEES)?;
    let page = state.employees.find_all(query.page, query.limit).await?;
    Ok(Json(ApiResponse::success(MSG_LISTED, page)))
}

/// GET /api/employees/:id
pub async fn get_employee(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Employee>>> {
    user.require(policy::READ_EMPLOYEE)?;
    let employee = state.employees.find_one(id).await?;
    Ok(Json(ApiResponse::success(MSG_FETCHED, employee)))
}

/// GET /api/employees/:id/subordinates
pub async fn get_subordinates(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<SubordinatesView>>> {
    user.require(policy::READ_SUBORDINATES)?;
    let view = state.employees.find_all_subordinates(id).await?;
    Ok(Json(ApiResponse::success(MSG_SUBORDINATES, view)))
}

/// PATCH /api/employees/:id
pub async fn update_employee(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> AppResult<Json<ApiResponse<Employee>>> {
    user.require(policy::UPDATE_EMPLOYEE)?;
    let employee = state.employees.update(id, req.validate()?).await?;
    Ok(Json(ApiResponse::success(MSG_UPDATED, employee)))
}

/// DELETE /api/employees/:id
pub async fn delete_employee(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    user.require(policy::DELETE_EMPLOYEE)?;
    state.employees.remove(id).await?;
    Ok(Json(ApiResponse::success_msg(MSG_DELETED)))
}
