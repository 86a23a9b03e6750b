use crate::form::FormKind;
use crate::intake::IntakeHandler;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::Method;
use axum::response::Redirect;
use axum::routing::any;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use url::form_urlencoded;

/// Form endpoints over HTTP. Every request ends in a redirect; nothing else
/// is ever served.
pub struct Server {
    handler: Arc<IntakeHandler>,
}

impl Server {
    pub fn new(handler: IntakeHandler) -> Self {
        Server {
            handler: Arc::new(handler),
        }
    }

    /// One route per form kind. Any method is routed so the intake handler
    /// can turn non-POST requests into a redirect itself.
    pub fn router(&self) -> Router {
        let mut router = Router::new();
        for kind in FormKind::ALL {
            let endpoint = self.handler.config().form(kind).endpoint.clone();
            log::debug!("Routing {endpoint} to the {kind} form");
            router = router.route(
                &endpoint,
                any(
                    move |State(handler): State<Arc<IntakeHandler>>,
                          method: Method,
                          body: Result<Bytes, BytesRejection>| async move {
                        receive(handler, kind, method, body).await
                    },
                ),
            );
        }
        router.with_state(self.handler.clone())
    }

    pub async fn run(&self, listen_address: &str) -> anyhow::Result<()> {
        log::info!("Starting form intake on: {}", listen_address);
        let listener = TcpListener::bind(listen_address).await?;

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for shutdown signal: {}", e);
                }
                log::info!("Received shutdown signal, stopping");
            })
            .await?;
        Ok(())
    }
}

/// Decode an `application/x-www-form-urlencoded` body. Malformed bytes are
/// replaced rather than rejected.
pub fn decode_fields(body: &[u8]) -> Vec<(String, String)> {
    form_urlencoded::parse(body).into_owned().collect()
}

async fn receive(
    handler: Arc<IntakeHandler>,
    kind: FormKind,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Redirect {
    let resolution = match body {
        Ok(body) => {
            let fields = decode_fields(&body);
            handler.handle(kind, method.as_str(), &fields).await
        }
        Err(rejection) => {
            log::warn!("Unreadable {kind} request body: {rejection}");
            handler.refuse(kind, format!("unreadable body ({})", rejection.status()))
        }
    };
    log::debug!(
        "{kind} submission resolved as {:?} -> {}",
        resolution.outcome,
        resolution.redirect.href()
    );
    Redirect::to(&resolution.redirect.href())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transport::DryRunTransport;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    const CONTACT_BODY: &str = "name=%E7%94%B0%E4%B8%AD&email=a%40b.co&phone=&inquiry-type=general\
        &subject=Hello%21%21&message=0123456789&company=";

    fn server(transport: Arc<DryRunTransport>) -> Server {
        Server::new(IntakeHandler::new(Config::default(), transport))
    }

    async fn request(server: &Server, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        (response.status(), location)
    }

    #[test]
    fn test_decode_fields() {
        let fields = decode_fields(CONTACT_BODY.as_bytes());
        assert_eq!(fields[0], ("name".to_string(), "田中".to_string()));
        assert_eq!(fields[1], ("email".to_string(), "a@b.co".to_string()));
        assert_eq!(fields[4], ("subject".to_string(), "Hello!!".to_string()));
    }

    #[tokio::test]
    async fn test_post_redirects_to_thanks() {
        let transport = Arc::new(DryRunTransport::new());
        let server = server(transport.clone());

        let (status, location) = request(&server, "POST", "/contact/send", CONTACT_BODY).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location, "/contact/thanks.html");
        assert_eq!(transport.attempts().len(), 2);
    }

    #[tokio::test]
    async fn test_get_redirects_to_form() {
        let transport = Arc::new(DryRunTransport::new());
        let server = server(transport.clone());

        let (status, location) = request(&server, "GET", "/order/send", "").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location, "/order/index.html");
        assert!(transport.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_honeypot_redirects_to_form() {
        let transport = Arc::new(DryRunTransport::new());
        let server = server(transport.clone());

        let body = CONTACT_BODY.replace("company=", "company=x");
        let (_, location) = request(&server, "POST", "/contact/send", &body).await;
        assert_eq!(location, "/contact/index.html");
        assert!(transport.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_body_redirects_to_form() {
        let transport = Arc::new(DryRunTransport::new());
        let server = server(transport.clone());

        let body = format!("{CONTACT_BODY}&message={}", "a".repeat(3 * 1024 * 1024));
        let (status, location) = request(&server, "POST", "/contact/send", &body).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location, "/contact/index.html");
        assert!(transport.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_routed() {
        let server = server(Arc::new(DryRunTransport::new()));
        let (status, _) = request(&server, "POST", "/newsletter/send", CONTACT_BODY).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
