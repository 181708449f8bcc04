use crate::api::{encode_component, Params};
use crate::auth::{self, SessionError};
use crate::cache::Resource;
use crate::calendar::{activities_on, build_view, date_key, parse_date, CalendarCursor, CalendarView, ViewMode};
use crate::errors::AppError;
use crate::filters::{BehaviorFilter, ClientFilter, GoalFilter, ShiftFilter};
use crate::forms::{
    ActivityForm, ActivityLogForm, BehaviorForm, ClientForm, EntityForm, GoalForm, LoginForm,
    ShiftForm,
};
use crate::models::{Activity, Entity, MediaUpload, Page, User};
use crate::state::AppState;
use crate::stats::{build_activity_trend_at, ActivityTrend, BehaviorStats, GoalStats};
use crate::ui;
use crate::validation::ValidationErrors;
use crate::views::{ModalKind, ModalQuery, ModalState, Notice};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, warn};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn results<T>(resource: &Resource<Page<T>>) -> &[T] {
    resource
        .data
        .as_deref()
        .map(|page| page.results.as_slice())
        .unwrap_or(&[])
}

/// Fills the error banner from the first failed read unless one is already set.
fn with_error<const N: usize>(mut notice: Notice, errors: [Option<String>; N]) -> Notice {
    if notice.error.is_none() {
        notice.error = errors.into_iter().flatten().next();
    }
    notice
}

fn render(state: &AppState, title: &str, user: Option<&User>, notice: &Notice, content: &str) -> Html<String> {
    Html(ui::render_page(
        title,
        user,
        &state.config.environment,
        notice,
        content,
    ))
}

fn redirect_with(page: &str, key: &str, message: &str) -> Response {
    let separator = if page.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{page}{separator}{key}={}", encode_component(message))).into_response()
}

/// Signed-in user of a page request; anything else is answered directly.
async fn signed_in(state: &AppState) -> Result<Arc<User>, Response> {
    match auth::current_user(&state.resources).await {
        Ok(user) => Ok(user),
        Err(SessionError::SignedOut) => Err(Redirect::to("/login").into_response()),
        Err(SessionError::Upstream(err)) => {
            warn!("profile lookup failed: {err}");
            let html = render(
                state,
                "Unavailable",
                None,
                &Notice::default(),
                &ui::render_error(&err.to_string()),
            );
            Err((StatusCode::BAD_GATEWAY, html).into_response())
        }
    }
}

fn unavailable<T>(resource: &Resource<T>) -> AppError {
    match &resource.error {
        Some(err) => AppError::from(err.as_ref()),
        None => AppError {
            status: StatusCode::BAD_GATEWAY,
            message: "no data returned".to_string(),
        },
    }
}

pub async fn dashboard(State(state): State<AppState>, Query(notice): Query<Notice>) -> Response {
    let user = match signed_in(&state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let today = today();
    let resources = &state.resources;
    let all = Params::new();
    let todays = Params::new()
        .with("start_date", date_key(today))
        .with("end_date", date_key(today));

    let (stats, critical, schedule, behaviors, goals, activities) = tokio::join!(
        resources.dashboard_stats(),
        resources.critical_behaviors(),
        resources.todays_schedule(today),
        resources.behaviors(&all),
        resources.goals(&all),
        resources.activities(&todays),
    );
    let behavior_summary = resources.behavior_stats(&all, &behaviors, today);
    let goal_summary = resources.goal_stats(&all, &goals, today);
    let todays_activities = activities_on(results(&activities), today);

    let notice = with_error(
        notice,
        [
            stats.error_message(),
            critical.error_message(),
            schedule.error_message(),
            behaviors.error_message(),
            goals.error_message(),
            activities.error_message(),
        ],
    );
    let content = ui::render_dashboard(
        stats.data.as_deref(),
        behavior_summary.as_deref(),
        goal_summary.as_deref(),
        results(&critical),
        results(&schedule),
        &todays_activities,
    );
    render(&state, "Dashboard", Some(&user), &notice, &content).into_response()
}

pub async fn clients(
    State(state): State<AppState>,
    Query(filter): Query<ClientFilter>,
    Query(modal_query): Query<ModalQuery>,
    Query(notice): Query<Notice>,
) -> Response {
    let user = match signed_in(&state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let page = state.resources.clients(&filter.to_params()).await;
    let all = results(&page);
    let shown = filter.apply(all);
    let total = page.data.as_ref().map(|page| page.count).unwrap_or(0);

    let modal = ui::render_modal::<ClientForm>(&ModalState::from_query(&modal_query, all), None);
    let notice = with_error(notice, [page.error_message()]);
    let content = ui::render_clients(&shown, total, &filter, &modal);
    render(&state, "Clients", Some(&user), &notice, &content).into_response()
}

pub async fn behaviors(
    State(state): State<AppState>,
    Query(filter): Query<BehaviorFilter>,
    Query(modal_query): Query<ModalQuery>,
    Query(notice): Query<Notice>,
) -> Response {
    let user = match signed_in(&state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let params = filter.to_params();
    let page = state.resources.behaviors(&params).await;
    let summary = state.resources.behavior_stats(&params, &page, today());
    let all = results(&page);
    let shown = filter.apply(all);

    let modal = ui::render_modal::<BehaviorForm>(&ModalState::from_query(&modal_query, all), None);
    let notice = with_error(notice, [page.error_message()]);
    let content = ui::render_behaviors(&shown, summary.as_deref(), &filter, &modal);
    render(&state, "Behaviors", Some(&user), &notice, &content).into_response()
}

pub async fn goals(
    State(state): State<AppState>,
    Query(filter): Query<GoalFilter>,
    Query(modal_query): Query<ModalQuery>,
    Query(notice): Query<Notice>,
) -> Response {
    let user = match signed_in(&state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let params = filter.to_params();
    let page = state.resources.goals(&params).await;
    let summary = state.resources.goal_stats(&params, &page, today());
    let all = results(&page);
    let shown = filter.apply(all);

    let modal = ui::render_modal::<GoalForm>(&ModalState::from_query(&modal_query, all), None);
    let notice = with_error(notice, [page.error_message()]);
    let content = ui::render_goals(&shown, summary.as_deref(), &filter, &modal);
    render(&state, "Goals", Some(&user), &notice, &content).into_response()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarQuery {
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl CalendarQuery {
    fn cursor(&self, today: NaiveDate) -> CalendarCursor {
        let mode = ViewMode::parse(self.view.as_deref().unwrap_or_default());
        let date = self.date.as_deref().and_then(parse_date).unwrap_or(today);
        CalendarCursor::new(mode, date)
    }
}

async fn calendar_view(state: &AppState, query: &CalendarQuery) -> (CalendarView, Resource<Page<Activity>>) {
    let today = today();
    let cursor = query.cursor(today);
    let (first, last) = cursor.range();
    let params = Params::new()
        .with("start_date", date_key(first))
        .with("end_date", date_key(last));
    let activities = state.resources.activities(&params).await;
    let view = build_view(cursor, today, results(&activities));
    (view, activities)
}

pub async fn scheduler(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
    Query(modal_query): Query<ModalQuery>,
    Query(notice): Query<Notice>,
) -> Response {
    let user = match signed_in(&state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let (view, activities) = calendar_view(&state, &query).await;
    let modal = ModalState::from_query(&modal_query, results(&activities));
    let modal = match (modal.kind(), modal.selected()) {
        (Some(ModalKind::Edit), Some(activity)) => ui::render_activity_modal(activity),
        _ => ui::render_modal::<ActivityForm>(&modal, None),
    };

    let notice = with_error(notice, [activities.error_message()]);
    let content = ui::render_scheduler(&view, &modal);
    render(&state, "Scheduler", Some(&user), &notice, &content).into_response()
}

pub async fn shifts(
    State(state): State<AppState>,
    Query(filter): Query<ShiftFilter>,
    Query(modal_query): Query<ModalQuery>,
    Query(notice): Query<Notice>,
) -> Response {
    let user = match signed_in(&state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let params = filter.to_params();
    let carers = Params::new();
    let (page, users) = tokio::join!(
        state.resources.shifts(&params),
        state.resources.users(&carers),
    );
    let all = results(&page);
    let shown = filter.apply(all);

    let modal = ui::render_modal::<ShiftForm>(&ModalState::from_query(&modal_query, all), None);
    let notice = with_error(notice, [page.error_message(), users.error_message()]);
    let content = ui::render_shifts(&shown, results(&users), &filter, &modal);
    render(&state, "Shifts", Some(&user), &notice, &content).into_response()
}

/// Shows a rejected submit again, inputs preserved, over an otherwise empty page.
fn rejected(state: &AppState, user: &User, status: StatusCode, dialog: String, error: Option<String>) -> Response {
    let notice = Notice { notice: None, error };
    (status, render(state, "Review changes", Some(user), &notice, &dialog)).into_response()
}

pub async fn create<F: EntityForm>(State(state): State<AppState>, Form(form): Form<F>) -> Response {
    let user = match signed_in(&state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(errors) => {
            let dialog = ui::render_add_modal(&form, &errors);
            return rejected(&state, &user, StatusCode::UNPROCESSABLE_ENTITY, dialog, None);
        }
    };

    match state.resources.create::<F::Entity, _>(&payload).await {
        Ok(entity) => {
            let name = <F::Entity as Entity>::NAME;
            info!(entity = name, id = entity.id(), "created");
            redirect_with(F::PAGE, "notice", &format!("{} created", F::TITLE))
        }
        Err(err) if err.is_unauthorized() => Redirect::to("/login").into_response(),
        Err(err) => {
            let dialog = ui::render_add_modal(&form, &ValidationErrors::new());
            let status = AppError::from(&err).status;
            rejected(&state, &user, status, dialog, Some(err.to_string()))
        }
    }
}

pub async fn update<F: EntityForm>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<F>,
) -> Response {
    let user = match signed_in(&state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(errors) => {
            let dialog = ui::render_edit_modal(id, &form, &errors);
            return rejected(&state, &user, StatusCode::UNPROCESSABLE_ENTITY, dialog, None);
        }
    };

    match state.resources.update::<F::Entity, _>(id, &payload).await {
        Ok(_) => {
            let name = <F::Entity as Entity>::NAME;
            info!(entity = name, id, "updated");
            redirect_with(F::PAGE, "notice", &format!("{} updated", F::TITLE))
        }
        Err(err) if err.is_unauthorized() => Redirect::to("/login").into_response(),
        Err(err) => {
            let dialog = ui::render_edit_modal(id, &form, &ValidationErrors::new());
            let status = AppError::from(&err).status;
            rejected(&state, &user, status, dialog, Some(err.to_string()))
        }
    }
}

pub async fn delete<F: EntityForm>(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    if let Err(response) = signed_in(&state).await {
        return response;
    }
    match state.resources.delete::<F::Entity>(id).await {
        Ok(()) => {
            let name = <F::Entity as Entity>::NAME;
            info!(entity = name, id, "deleted");
            redirect_with(F::PAGE, "notice", &format!("{} deleted", F::TITLE))
        }
        Err(err) if err.is_unauthorized() => Redirect::to("/login").into_response(),
        Err(err) => redirect_with(F::PAGE, "error", &err.to_string()),
    }
}

pub async fn log_activity(State(state): State<AppState>, Form(form): Form<ActivityLogForm>) -> Response {
    if let Err(response) = signed_in(&state).await {
        return response;
    }
    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(errors) => return redirect_with(ActivityForm::PAGE, "error", &errors.to_string()),
    };
    match state.resources.log_activity(&payload).await {
        Ok(_) => redirect_with(ActivityForm::PAGE, "notice", "Activity logged"),
        Err(err) if err.is_unauthorized() => Redirect::to("/login").into_response(),
        Err(err) => redirect_with(ActivityForm::PAGE, "error", &err.to_string()),
    }
}

pub async fn login_page(State(state): State<AppState>, Query(notice): Query<Notice>) -> Response {
    if auth::current_user(&state.resources).await.is_ok() {
        return Redirect::to("/").into_response();
    }
    let content = ui::render_login("", &ValidationErrors::new());
    render(&state, "Sign in", None, &notice, &content).into_response()
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    if let Err(errors) = form.validate() {
        let content = ui::render_login(&form.username, &errors);
        let html = render(&state, "Sign in", None, &Notice::default(), &content);
        return (StatusCode::UNPROCESSABLE_ENTITY, html).into_response();
    }

    match auth::sign_in(&state.resources, &form.username, &form.password).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(err) => {
            warn!(username = form.username.trim(), "sign in failed: {}", err.message);
            let notice = Notice {
                notice: None,
                error: Some(err.message),
            };
            let content = ui::render_login(&form.username, &ValidationErrors::new());
            (err.status, render(&state, "Sign in", None, &notice, &content)).into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>) -> Redirect {
    if let Err(err) = auth::sign_out(&state.resources).await {
        warn!("failed to clear session: {}", err.message);
    }
    Redirect::to("/login")
}

pub async fn calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarView>, AppError> {
    auth::current_user(&state.resources).await?;
    let (view, activities) = calendar_view(&state, &query).await;
    if activities.data.is_none() {
        return Err(unavailable(&activities));
    }
    Ok(Json(view))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub client: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub behaviors: BehaviorStats,
    pub goals: GoalStats,
    pub activity_trend: ActivityTrend,
}

pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    auth::current_user(&state.resources).await?;
    let today = today();
    let resources = &state.resources;
    let mut params = Params::new();
    if let Some(client) = query.client {
        params.set("client", client);
    }

    let (behaviors, goals, logs) = tokio::join!(
        resources.behaviors(&params),
        resources.goals(&params),
        resources.activity_logs(&params),
    );
    let behavior_summary = resources
        .behavior_stats(&params, &behaviors, today)
        .ok_or_else(|| unavailable(&behaviors))?;
    let goal_summary = resources
        .goal_stats(&params, &goals, today)
        .ok_or_else(|| unavailable(&goals))?;
    if logs.data.is_none() {
        return Err(unavailable(&logs));
    }

    Ok(Json(StatsResponse {
        behaviors: (*behavior_summary).clone(),
        goals: (*goal_summary).clone(),
        activity_trend: build_activity_trend_at(today, results(&logs)),
    }))
}

pub async fn report(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    auth::current_user(&state.resources).await?;
    let mut params = Params::new();
    for (key, value) in &query {
        params.set(key, value);
    }
    let report = state
        .resources
        .report(&name, &params)
        .await
        .into_result()
        .map_err(|err| AppError::from(err.as_ref()))?;
    Ok(Json((*report).clone()))
}

#[derive(Debug, Deserialize)]
pub struct MutateRequest {
    pub key: String,
}

/// Forces revalidation of one cached read. Keys may be full URLs or API paths.
pub async fn mutate(
    State(state): State<AppState>,
    Json(payload): Json<MutateRequest>,
) -> Result<Json<Value>, AppError> {
    auth::current_user(&state.resources).await?;
    let key = payload.key.trim();
    if key.is_empty() {
        return Err(AppError::bad_request("key must not be empty"));
    }
    let key = if key.starts_with('/') {
        state.resources.api().url(key, &Params::new())
    } else {
        key.to_string()
    };
    let revalidated = state.resources.mutate(&key);
    Ok(Json(json!({ "key": key, "revalidated": revalidated })))
}

pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MediaUpload>, AppError> {
    auth::current_user(&state.resources).await?;
    let mut file = None;
    let mut metadata = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            "metadata" => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                let value = serde_json::from_str::<Value>(&text)
                    .map_err(|err| AppError::bad_request(format!("metadata must be JSON: {err}")))?;
                metadata = Some(value);
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| AppError::bad_request("missing file field"))?;
    let upload = state
        .resources
        .upload_media(&file_name, &content_type, bytes, metadata.as_ref())
        .await?;
    Ok(Json(upload))
}

pub async fn healthz(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "environment": state.config.environment,
        "api_url": state.resources.api().base_url(),
    }))
}
