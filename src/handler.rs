//! Session middleware handler for Salvo

use std::sync::Arc;

use async_trait::async_trait;
use salvo_core::http::{Request, Response};
use salvo_core::{Depot, FlowCtrl, Handler};

use crate::config::SessionConfig;
use crate::cookies::Cookies;
use crate::depot_ext::SESSION_KEY;
use crate::session::Session;
use crate::store::SessionStore;

/// Session middleware for Salvo
///
/// Puts a fresh, unfetched [`Session`] into the depot for every request.
/// Downstream handlers fetch and mutate it through
/// [`SessionDepotExt`](crate::SessionDepotExt); once they are done the
/// handler commits it and writes the session cookies to the response.
pub struct SessionHandler {
    store: Arc<dyn SessionStore>,
    config: Arc<SessionConfig>,
}

impl SessionHandler {
    /// Create a new session handler
    pub fn new<S: SessionStore>(store: S, config: SessionConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a handler over a store shared with other code
    pub fn with_shared_store(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// The handler configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Build the session for one request
    pub fn session_for(&self, req: &Request) -> Session {
        let cookies = Cookies::from_request(req, self.config.cookie.clone());
        Session::new(Arc::clone(&self.store), cookies, Arc::clone(&self.config))
    }
}

impl Clone for SessionHandler {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

#[async_trait]
impl Handler for SessionHandler {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        depot.insert(SESSION_KEY, self.session_for(req));

        ctrl.call_next(req, depot, res).await;

        let mut session = match depot.remove::<Session>(SESSION_KEY) {
            Ok(session) => session,
            Err(_) => {
                tracing::warn!("Session missing from depot after request");
                return;
            }
        };

        if let Err(e) = session.commit().await {
            tracing::error!(session_id = %session.id(), error = %e, "Failed to commit session");
        }
        session.into_cookies().apply(res);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depot_ext::SessionDepotExt;
    use crate::id::IdGenerator;
    use crate::store::MemoryStore;
    use salvo::http::header::COOKIE;
    use salvo::prelude::*;
    use salvo::test::{ResponseExt, TestClient};

    #[handler]
    async fn views(depot: &mut Depot) -> String {
        let Some(session) = depot.session_mut() else {
            return "no session".to_string();
        };
        if session.fetch().await.is_err() {
            return "fetch failed".to_string();
        }
        let count = session.get_int("views") + 1;
        if session.set("views", count).is_err() {
            return "set failed".to_string();
        }
        count.to_string()
    }

    #[handler]
    async fn peek(depot: &mut Depot) -> String {
        match depot.session() {
            Some(session) => format!("{:?}", session.lifecycle()),
            None => "no session".to_string(),
        }
    }

    /// Cookies the response asks the client to store, as `name=value` pairs
    /// encoded for a `Cookie` request header.
    ///
    /// Read from the response jar: the test client folds the jar into a
    /// single `Set-Cookie` header, so only the last cookie would survive there.
    fn response_cookies(res: &Response) -> Vec<String> {
        res.cookies()
            .delta()
            .map(|c| c.encoded().stripped().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_handler_persists_session() {
        let store = MemoryStore::new(64).unwrap();
        let handler = SessionHandler::new(store.clone(), SessionConfig::with_keys(["tree.xie"]));
        let service = Service::new(Router::new().hoop(handler).get(views));

        let mut res = TestClient::get("http://127.0.0.1:5800/").send(&service).await;
        assert_eq!(res.take_string().await.unwrap(), "1");
        let cookies = response_cookies(&res);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.starts_with("sess=")));
        assert!(cookies.iter().any(|c| c.starts_with("sess.sig=")));
        assert_eq!(store.len().unwrap(), 1);

        let mut res = TestClient::get("http://127.0.0.1:5800/")
            .add_header(COOKIE, cookies.join("; "), true)
            .send(&service)
            .await;
        assert_eq!(res.take_string().await.unwrap(), "2");
        // Known session, no new identifier cookie
        assert!(response_cookies(&res).is_empty());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_handler_untouched_session_writes_nothing() {
        let store = MemoryStore::new(64).unwrap();
        let handler = SessionHandler::new(store.clone(), SessionConfig::new());
        let service = Service::new(Router::new().hoop(handler).get(peek));

        let mut res = TestClient::get("http://127.0.0.1:5800/").send(&service).await;
        assert_eq!(res.take_string().await.unwrap(), "Unfetched");
        assert!(response_cookies(&res).is_empty());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_handler_keeps_percent_in_identifier() {
        let store = MemoryStore::new(64).unwrap();
        let config = SessionConfig::with_keys(["tree.xie"])
            .with_id_generator(IdGenerator::custom(|| "a%41b".to_string()));
        let handler = SessionHandler::new(store.clone(), config);
        let service = Service::new(Router::new().hoop(handler).get(views));

        let mut res = TestClient::get("http://127.0.0.1:5800/").send(&service).await;
        assert_eq!(res.take_string().await.unwrap(), "1");
        let cookies = response_cookies(&res);
        assert!(cookies.contains(&"sess=a%2541b".to_string()));
        // Stored under the identifier verbatim
        assert!(!store.get("a%41b").await.unwrap().is_empty());

        let mut res = TestClient::get("http://127.0.0.1:5800/")
            .add_header(COOKIE, cookies.join("; "), true)
            .send(&service)
            .await;
        assert_eq!(res.take_string().await.unwrap(), "2");
        assert!(response_cookies(&res).is_empty());
        assert_eq!(store.len().unwrap(), 1);
    }
}
