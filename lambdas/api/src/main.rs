use aws_config::BehaviorVersion;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::{medicines, transfers, users};

mod auth;
mod error;
mod handlers;
mod scan;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&config);

    let users_repo = users::cqrs::init_repo(dynamodb_client.clone());
    let users_cqrs = users::cqrs::init(dynamodb_client.clone(), users_repo.clone());

    let medicines_repo = medicines::cqrs::init_repo(dynamodb_client.clone());
    let medicines_cqrs = medicines::cqrs::init(dynamodb_client.clone(), medicines_repo.clone());

    let transfers_repo = transfers::cqrs::init_repo(dynamodb_client.clone());
    let transfers_cqrs = transfers::cqrs::init(dynamodb_client.clone(), transfers_repo.clone());

    let state = AppState {
        dynamodb: dynamodb_client,
        users_repo,
        users_cqrs,
        medicines_repo,
        medicines_cqrs,
        transfers_repo,
        transfers_cqrs,
        token_key: auth::TokenKey::from_env()?,
    };

    let protected = Router::new()
        .route(
            "/api/inventory",
            get(handlers::inventory::list_inventory).post(handlers::inventory::add_medicine),
        )
        .route("/api/inventory/:id", get(handlers::inventory::get_medicine))
        .route(
            "/api/inventory/:id/status",
            put(handlers::inventory::update_status),
        )
        .route(
            "/api/inventory/:id/redistribute",
            post(handlers::redistribute::list_medicine),
        )
        .route(
            "/api/redistribute/market",
            get(handlers::redistribute::market),
        )
        .route(
            "/api/redistribute/request",
            post(handlers::redistribute::request),
        )
        .route(
            "/api/transactions/pending",
            get(handlers::transactions::pending),
        )
        .route("/api/transactions/:id", put(handlers::transactions::respond))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let app = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .merge(protected)
        .with_state(state);

    let app = tower::ServiceBuilder::new()
        .layer(axum_aws_lambda::LambdaLayer::default())
        .service(app);

    lambda_http::run(app).await?;
    Ok(())
}
