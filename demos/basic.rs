//! Basic example using the in-memory session store

use salvo::prelude::*;
use salvo_session_store::{
    MemoryStore, SessionConfig, SessionDepotExt, SessionError, SessionHandler,
};

fn internal(e: SessionError) -> StatusError {
    tracing::error!(error = %e, "Session error");
    StatusError::internal_server_error()
}

#[handler]
async fn index(depot: &mut Depot) -> Result<String, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    session.fetch().await.map_err(internal)?;

    // Increment view count
    let views = session.get_int("views") + 1;
    session.set("views", views).map_err(internal)?;

    Ok(format!(
        "Hello! You have viewed this page {} time(s).\nCreated at: {}",
        views,
        session.created_at()
    ))
}

#[handler]
async fn get_user(depot: &mut Depot) -> Result<String, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    session.fetch().await.map_err(internal)?;

    match session.get_string("user").as_str() {
        "" => Ok("Not logged in".to_string()),
        user => Ok(format!("Logged in as: {}", user)),
    }
}

#[handler]
async fn set_user(req: &mut Request, depot: &mut Depot) -> Result<String, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    session.fetch().await.map_err(internal)?;

    // Get username from query parameter
    let username = req
        .query::<String>("name")
        .unwrap_or_else(|| "anonymous".to_string());
    session.set("user", &username).map_err(internal)?;

    Ok(format!("User set to: {}", username))
}

#[handler]
async fn logout(depot: &mut Depot) -> Result<&'static str, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    session.fetch().await.map_err(internal)?;
    session.remove("user").map_err(internal)?;

    Ok("Logged out successfully")
}

#[handler]
async fn destroy_session(depot: &mut Depot) -> Result<&'static str, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    session.destroy().await.map_err(internal)?;

    Ok("Session destroyed")
}

#[handler]
async fn refresh_session(depot: &mut Depot) -> Result<String, StatusError> {
    let session = depot.session_mut().expect("Session not found");
    session.fetch().await.map_err(internal)?;
    session.refresh().map_err(internal)?;

    Ok(format!("Session refreshed at {}", session.updated_at()))
}

#[tokio::main]
async fn main() {
    // Set up logging
    tracing_subscriber::fmt::init();

    // Create memory store
    let store = MemoryStore::new(10_000).expect("capacity is non-zero");

    // Configure session
    let config = SessionConfig::with_keys(["your-super-secret-key-change-in-production"])
        .with_key("sess")
        .with_max_age(3600); // 1 hour

    // Create session handler
    let session_handler = SessionHandler::new(store, config);

    // Build router
    let router = Router::new()
        .hoop(session_handler)
        .get(index)
        .push(Router::with_path("user").get(get_user))
        .push(Router::with_path("login").get(set_user))
        .push(Router::with_path("logout").get(logout))
        .push(Router::with_path("destroy").get(destroy_session))
        .push(Router::with_path("refresh").get(refresh_session));

    // Start server
    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    println!("Try these endpoints:");
    println!("  GET /           - View counter");
    println!("  GET /user       - Get current user");
    println!("  GET /login?name=alice - Set user");
    println!("  GET /logout     - Remove user");
    println!("  GET /destroy    - Destroy session");
    println!("  GET /refresh    - Extend session cookie");

    Server::new(acceptor).serve(router).await;
}
