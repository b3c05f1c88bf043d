//! Redis session store example
//!
//! Sessions are stored under their identifier with a TTL equal to the
//! configured max age, so several server instances can share them.

use salvo::prelude::*;
use salvo_session_store::{
    IdGenerator, IdStrategy, RedisStore, SessionConfig, SessionDepotExt, SessionError,
    SessionHandler,
};
use serde::Serialize;

#[derive(Serialize, Default)]
struct JsonResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    counter: Option<i64>,
    #[serde(rename = "sessionId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
}

fn internal(e: SessionError) -> StatusError {
    tracing::error!(error = %e, "Session error");
    StatusError::internal_server_error()
}

#[handler]
async fn health() -> Json<JsonResponse> {
    Json(JsonResponse {
        status: Some("ok"),
        ..Default::default()
    })
}

#[handler]
async fn get_session_info(depot: &mut Depot) -> Result<Json<serde_json::Value>, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    let data = session.fetch().await.map_err(internal)?.clone();

    Ok(Json(serde_json::json!({
        "sessionId": session.id(),
        "createdAt": session.created_at(),
        "updatedAt": session.updated_at(),
        "data": data
    })))
}

#[handler]
async fn set_data(req: &mut Request, depot: &mut Depot) -> Result<Json<JsonResponse>, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    session.fetch().await.map_err(internal)?;

    let key = req
        .query::<String>("key")
        .unwrap_or_else(|| "testKey".to_string());
    let value = req
        .query::<String>("value")
        .unwrap_or_else(|| "testValue".to_string());
    session.set(&key, &value).map_err(internal)?;

    Ok(Json(JsonResponse {
        action: Some("set"),
        key: Some(key),
        value: Some(serde_json::Value::String(value)),
        session_id: Some(session.id().to_string()),
        ..Default::default()
    }))
}

#[handler]
async fn get_data(req: &mut Request, depot: &mut Depot) -> Result<Json<JsonResponse>, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    session.fetch().await.map_err(internal)?;

    let key = req
        .query::<String>("key")
        .unwrap_or_else(|| "testKey".to_string());

    Ok(Json(JsonResponse {
        action: Some("get"),
        value: session.get(&key).cloned(),
        key: Some(key),
        session_id: Some(session.id().to_string()),
        ..Default::default()
    }))
}

#[handler]
async fn counter(depot: &mut Depot) -> Result<Json<JsonResponse>, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    session.fetch().await.map_err(internal)?;

    let count = session.get_int("counter") + 1;
    session.set("counter", count).map_err(internal)?;

    Ok(Json(JsonResponse {
        counter: Some(count),
        session_id: Some(session.id().to_string()),
        ..Default::default()
    }))
}

#[handler]
async fn clear_session(depot: &mut Depot) -> Result<Json<JsonResponse>, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    session.destroy().await.map_err(internal)?;

    Ok(Json(JsonResponse {
        action: Some("clear"),
        ..Default::default()
    }))
}

#[tokio::main]
async fn main() {
    // Set up logging
    tracing_subscriber::fmt::init();

    // Get Redis URL from environment or use default
    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());

    println!("Connecting to Redis at {}", redis_url);

    // Create Redis store
    let store = RedisStore::from_url(&redis_url)
        .await
        .expect("Failed to connect to Redis");

    let secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| "keyboard cat".to_string());

    let config = SessionConfig::with_keys([secret])
        .with_key("sess")
        .with_max_age(86400) // 1 day in seconds
        .with_id_generator(IdGenerator::new(IdStrategy::TimeOrdered).with_prefix("s-"));

    // Create session handler
    let session_handler = SessionHandler::new(store, config);

    // Build router
    let router = Router::new()
        .push(Router::with_path("health").get(health))
        .push(
            Router::new()
                .hoop(session_handler)
                .get(get_session_info)
                .push(Router::with_path("set").get(set_data))
                .push(Router::with_path("get").get(get_data))
                .push(Router::with_path("counter").get(counter))
                .push(Router::with_path("clear").get(clear_session)),
        );

    // Get port from environment or use default
    let port = std::env::var("PORT").unwrap_or_else(|_| "5800".to_string());
    let addr = format!("127.0.0.1:{}", port);

    // Start server
    let acceptor = TcpListener::new(addr.clone()).bind().await;
    println!("Server running at http://{}", addr);
    println!();
    println!("Endpoints:");
    println!("  GET /health     - Health check (no session)");
    println!("  GET /           - Session info");
    println!("  GET /set        - Set data (key=x&value=y)");
    println!("  GET /get        - Get data (key=x)");
    println!("  GET /counter    - Increment counter");
    println!("  GET /clear      - Destroy session");

    Server::new(acceptor).serve(router).await;
}
