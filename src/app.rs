use crate::forms::{ActivityForm, BehaviorForm, ClientForm, EntityForm, GoalForm, ShiftForm};
use crate::handlers;
use crate::models::Entity;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(handlers::dashboard))
        .route("/clients", get(handlers::clients))
        .route("/behaviors", get(handlers::behaviors))
        .route("/goals", get(handlers::goals))
        .route("/scheduler", get(handlers::scheduler))
        .route("/shifts", get(handlers::shifts))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/activities/logs/new", post(handlers::log_activity))
        .route("/api/calendar", get(handlers::calendar))
        .route("/api/stats", get(handlers::stats))
        .route("/api/reports/:name", get(handlers::report))
        .route("/api/cache/mutate", post(handlers::mutate))
        .route("/api/media", post(handlers::upload_media))
        .route("/healthz", get(handlers::healthz));

    let router = entity_routes::<ClientForm>(router);
    let router = entity_routes::<BehaviorForm>(router);
    let router = entity_routes::<GoalForm>(router);
    let router = entity_routes::<ActivityForm>(router);
    let router = entity_routes::<ShiftForm>(router);

    router.with_state(state)
}

/// Create, edit and delete form posts under the entity's collection path.
fn entity_routes<F: EntityForm>(router: Router<AppState>) -> Router<AppState> {
    let base = <F::Entity as Entity>::PATH;
    router
        .route(&format!("{base}/new"), post(handlers::create::<F>))
        .route(&format!("{base}/:id/edit"), post(handlers::update::<F>))
        .route(&format!("{base}/:id/delete"), post(handlers::delete::<F>))
}
