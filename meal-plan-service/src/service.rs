//! HTTP surface: router construction and request handlers.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use chrono::{Duration, Local, NaiveDate, Utc};
use meal_pipeline::{
    ConsumptionSummary, analyze_consumption, format_for_presentation, parse_meal_plan,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, info};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::llm;
use crate::profile::target_calories;
use crate::prompt;
use crate::storage::{
    InMemoryPlanStorage, InMemoryTrackingStorage, MealTrackingRecord, PlanStorage, StoredMealPlan,
    TrackingStorage,
};
use crate::types::{
    DateType, GeneratePlanRequest, GeneratePlanResponse, LlmInfo, TrackMealRequest,
};

type ApiResult<T> = Result<Json<T>, ApiError>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "id": id
        })),
    )
}

fn service_error(error: &ServiceError) -> ApiError {
    let status = match error {
        ServiceError::LlmUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::LlmRequest(_) => StatusCode::BAD_GATEWAY,
        ServiceError::PlanNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": error.to_string() })))
}

#[derive(Clone)]
pub struct AppState {
    pub plan_storage: Arc<dyn PlanStorage>,
    pub tracking_storage: Arc<dyn TrackingStorage>,
}

pub fn create_app() -> Router {
    let app_state = AppState {
        plan_storage: Arc::new(InMemoryPlanStorage::new()),
        tracking_storage: Arc::new(InMemoryTrackingStorage::new()),
    };
    build_router(app_state)
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/plans/generate", post(generate_plan))
        .route("/plans", get(list_plans))
        .route("/plans/{id}", get(get_plan))
        .route("/trackings", post(track_meal).get(list_trackings))
        .route("/summary", get(consumption_summary))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    request.headers_mut().insert(
        "x-correlation-id",
        HeaderValue::from_str(&correlation_id).unwrap(),
    );

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Meal Plan Service",
        "version": "0.1.0",
        "description": "LLM-backed meal plan generation with adaptive next-day prompts",
        "endpoints": {
            "POST /plans/generate": "Generate a meal plan (today or next_day)",
            "GET /plans": "List a user's stored plans",
            "GET /plans/{id}": "Get a stored plan",
            "POST /trackings": "Record a meal consumption event",
            "GET /trackings": "List a user's events for a day",
            "GET /summary": "Consumption summary for a past day",
        }
    }))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn generate_plan(
    State(state): State<AppState>,
    Json(request): Json<GeneratePlanRequest>,
) -> ApiResult<GeneratePlanResponse> {
    if request.user_id.trim().is_empty() {
        return Err(bad_request_error("user_id must not be empty"));
    }

    info!(
        user_id = %request.user_id,
        plan_type = request.plan_type.as_str(),
        date_type = ?request.date_type,
        "processing generate request"
    );

    match request.date_type {
        DateType::Today => generate_today(state, request).await,
        DateType::NextDay => generate_next_day(state, request).await,
    }
}

async fn generate_today(
    state: AppState,
    request: GeneratePlanRequest,
) -> ApiResult<GeneratePlanResponse> {
    let user_prompt = match &request.feedback {
        Some(feedback) => {
            prompt::build_feedback_prompt(&request.profile, feedback, request.plan_type)
        }
        None => prompt::build_meal_plan_prompt(&request.profile, request.plan_type),
    };
    let target = target_calories(&request.profile);

    finish_generation(state, request, user_prompt, target, DateType::Today).await
}

async fn generate_next_day(
    state: AppState,
    request: GeneratePlanRequest,
) -> ApiResult<GeneratePlanResponse> {
    let yesterday = Local::now().date_naive() - Duration::days(1);

    let trackings = state
        .tracking_storage
        .list_for_date(&request.user_id, yesterday)
        .await
        .map_err(|e| service_error(&e))?;

    // Yesterday's plan carries the target the user was actually held to.
    let target = match state
        .plan_storage
        .active_plan_for(&request.user_id, yesterday)
        .await
        .map_err(|e| service_error(&e))?
    {
        Some(plan) => plan.target_calories,
        None => target_calories(&request.profile),
    };

    let events: Vec<_> = trackings
        .iter()
        .map(MealTrackingRecord::to_tracked_meal)
        .collect();
    let summary = analyze_consumption(&yesterday.to_string(), &events, target as f64);

    info!(
        user_id = %request.user_id,
        consumed = summary.consumed_calories,
        deficit = summary.deficit,
        skipped = summary.skipped_meals.len(),
        "built consumption summary for adaptive prompt"
    );

    let user_prompt = prompt::build_next_day_prompt(
        &request.profile,
        &summary,
        request.feedback.as_ref(),
        request.plan_type,
    );

    finish_generation(state, request, user_prompt, target, DateType::NextDay).await
}

/// Shared tail of both generation paths: call the model, normalize the
/// response, persist the plan, shape the API response.
async fn finish_generation(
    state: AppState,
    request: GeneratePlanRequest,
    user_prompt: String,
    target: i64,
    date_type: DateType,
) -> ApiResult<GeneratePlanResponse> {
    let raw = llm::generate(prompt::SYSTEM_PREAMBLE, &user_prompt)
        .await
        .map_err(|e| service_error(&e))?;

    let plan = parse_meal_plan(&raw);
    let parsing_method = plan.parsing_method;

    info!(
        user_id = %request.user_id,
        parsing_method = ?parsing_method,
        days = plan.days.len(),
        "parsed meal plan"
    );

    let start_date = Local::now().date_naive();
    let end_date = start_date + Duration::days(i64::from(request.plan_type.days_spanned()) - 1);

    let stored = StoredMealPlan {
        id: Uuid::new_v4().to_string(),
        user_id: request.user_id.clone(),
        plan_type: request.plan_type,
        start_date,
        end_date,
        target_calories: target,
        plan: plan.clone(),
        model: llm::model_name(),
        created_at: Utc::now(),
    };
    state
        .plan_storage
        .save(stored.clone())
        .await
        .map_err(|e| service_error(&e))?;

    let formatted_plan = format_for_presentation(&plan, request.plan_type.as_str());

    Ok(Json(GeneratePlanResponse {
        plan_id: stored.id,
        date_type,
        meal_plan: plan,
        formatted_plan,
        target_calories: target,
        llm_info: LlmInfo {
            model: stored.model,
            parsing_method,
        },
    }))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StoredMealPlan> {
    match state.plan_storage.get(&id).await.map_err(|e| service_error(&e))? {
        Some(plan) => Ok(Json(plan)),
        None => Err(not_found_error("meal plan not found", &id)),
    }
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    user_id: String,
}

async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<StoredMealPlan>> {
    let plans = state
        .plan_storage
        .list_for_user(&query.user_id)
        .await
        .map_err(|e| service_error(&e))?;
    Ok(Json(plans))
}

async fn track_meal(
    State(state): State<AppState>,
    Json(request): Json<TrackMealRequest>,
) -> ApiResult<MealTrackingRecord> {
    if request.user_id.trim().is_empty() {
        return Err(bad_request_error("user_id must not be empty"));
    }

    let record = MealTrackingRecord {
        id: Uuid::new_v4().to_string(),
        user_id: request.user_id,
        tracking_date: request.tracking_date,
        meal_type: request.meal_type,
        dish_name: request.dish_name,
        calories: request.calories,
        consumed_calories: request.consumed_calories,
        status: request.status,
        suggested_time: request.suggested_time,
        actual_time: request.actual_time,
        modifications: request.modifications,
        portion_size: request.portion_size,
    };
    state
        .tracking_storage
        .save(record.clone())
        .await
        .map_err(|e| service_error(&e))?;

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct TrackingQuery {
    user_id: String,
    date: NaiveDate,
}

async fn list_trackings(
    State(state): State<AppState>,
    Query(query): Query<TrackingQuery>,
) -> ApiResult<Vec<MealTrackingRecord>> {
    let records = state
        .tracking_storage
        .list_for_date(&query.user_id, query.date)
        .await
        .map_err(|e| service_error(&e))?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    user_id: String,
    date: NaiveDate,
    /// Overrides the stored plan's target when supplied.
    target_calories: Option<f64>,
}

/// Compute the consumption summary for a past day on demand. The summary
/// is never persisted; this recomputes from the stored events each call.
async fn consumption_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<ConsumptionSummary> {
    let records = state
        .tracking_storage
        .list_for_date(&query.user_id, query.date)
        .await
        .map_err(|e| service_error(&e))?;

    let target = match query.target_calories {
        Some(target) => target,
        None => state
            .plan_storage
            .active_plan_for(&query.user_id, query.date)
            .await
            .map_err(|e| service_error(&e))?
            .map(|plan| plan.target_calories as f64)
            .unwrap_or(0.0),
    };

    let events: Vec<_> = records
        .iter()
        .map(MealTrackingRecord::to_tracked_meal)
        .collect();
    Ok(Json(analyze_consumption(
        &query.date.to_string(),
        &events,
        target,
    )))
}
