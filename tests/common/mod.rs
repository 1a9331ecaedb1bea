use std::sync::Arc;

use axum::Router;
use chrono::{Local, NaiveDate, TimeZone, Utc};
use forecast_api::{
    config::AppConfig,
    db,
    entities::{contact, customer, customer_order_forecast, order, product, CompanySize},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use tokio::sync::mpsc;

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Same, with the forecast job endpoint pointed at a test server.
    pub async fn with_forecast_job_url(url: impl Into<String>) -> Self {
        Self::build(Some(url.into())).await
    }

    async fn build(forecast_job_url: Option<String>) -> Self {
        // Minimal configuration suitable for tests. A single pooled
        // connection keeps the in-memory database shared.
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.forecast_job_url = forecast_job_url;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()), &cfg);
        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", forecast_api::api_v1_routes())
            .layer(axum::middleware::from_fn(
                forecast_api::middleware_helpers::request_id::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Timestamp at local noon of the given day, so converting back to the
/// local calendar date is stable in any test timezone.
pub fn local_noon(date: NaiveDate) -> chrono::DateTime<Utc> {
    let naive = date.and_hms_opt(12, 0, 0).expect("valid time of day");
    Local
        .from_local_datetime(&naive)
        .earliest()
        .expect("unambiguous local datetime")
        .with_timezone(&Utc)
}

pub fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid date literal")
}

pub async fn seed_customer(
    app: &TestApp,
    id: i64,
    company_name: Option<&str>,
    company_size: Option<CompanySize>,
) {
    customer::ActiveModel {
        id: Set(id),
        company_name: Set(company_name.map(String::from)),
        contact_name: Set(None),
        company_size: Set(company_size),
        created_at: Set(Utc::now()),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed customer");
}

pub async fn seed_contact(app: &TestApp, id: i64, customer_id: Option<i64>) {
    contact::ActiveModel {
        id: Set(id),
        customer_id: Set(customer_id),
        name: Set(None),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed contact");
}

pub async fn seed_product(app: &TestApp, id: i64, selling_price: Option<Decimal>) {
    product::ActiveModel {
        id: Set(id),
        name: Set(format!("Product {id}")),
        selling_price: Set(selling_price),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed product");
}

pub async fn seed_order(
    app: &TestApp,
    contact_id: i64,
    product_id: i64,
    order_date: NaiveDate,
    quantity: i32,
) {
    order::ActiveModel {
        id: NotSet,
        contact_id: Set(contact_id),
        product_id: Set(product_id),
        order_date: Set(local_noon(order_date)),
        quantity: Set(quantity),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed order");
}

pub async fn seed_forecast(
    app: &TestApp,
    customer_id: i64,
    predicted_date: NaiveDate,
    predicted_quantity: Decimal,
    mape: Option<f64>,
) -> i64 {
    let inserted = customer_order_forecast::ActiveModel {
        cof_id: NotSet,
        customer_id: Set(customer_id),
        predicted_date: Set(predicted_date),
        predicted_quantity: Set(predicted_quantity),
        mape: Set(mape),
        prediction_model: Set("prophet".to_string()),
        probability: Set(Some(0.8)),
        forecast_generation_datetime: Set(Utc::now()),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed forecast");

    inserted.cof_id
}
