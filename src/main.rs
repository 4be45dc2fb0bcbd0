// Aula backend - membership-gated video course platform

mod api;
mod error;
mod features;
mod models;
mod routes;
mod utils;

use std::env;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::auth::AuthVerifier;
use crate::api::firestore::FirestoreClient;
use crate::routes::AppState;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "aula_rs=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let credentials_path =
        env::var("FIREBASE_CREDENTIALS").unwrap_or_else(|_| "firebase-key.json".to_string());
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    info!("Starting Aula backend...");

    // Build HTTP client for external API calls
    let http_client = reqwest::Client::builder()
        .user_agent("Aula-Backend/1.0")
        .build()
        .expect("Failed to create HTTP client");

    // Initialize Firestore client
    let firestore = FirestoreClient::from_file(http_client.clone(), &credentials_path)
        .expect("Failed to load Firebase credentials");
    let project_id = firestore.project_id().to_string();
    let firestore = Arc::new(firestore);
    info!("Firestore client initialized for project {}", project_id);

    // ID token verifier against the same project
    let auth = Arc::new(AuthVerifier::new(http_client.clone(), project_id));

    let state = AppState {
        firestore,
        auth,
        http: http_client,
    };

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listen address");
    info!("Listening on {}", bind_addr);

    // Run with graceful shutdown
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to register Ctrl+C handler");
        info!("Shutting down...");
    });

    if let Err(why) = server.await {
        error!("Server error: {:?}", why);
    }

    info!("Goodbye!");
}
