// GraphQL server implementation for the live auction
// Serves queries, mutations and WebSocket subscriptions from one axum router

use std::net::SocketAddr;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router, Server,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::engine::{
    auction::{AuctionEngine, EngineConfig},
    graphql::{create_schema, AuctionSchema},
};

/// Path of the WebSocket subscription endpoint
pub const SUBSCRIPTION_PATH: &str = "/ws";

/// GraphQL server
pub struct GraphQLServer {
    config: AppConfig,
    engine: AuctionEngine,
}

impl GraphQLServer {
    pub fn new(config: AppConfig) -> Self {
        let engine = AuctionEngine::new(EngineConfig::from(&config.auction));
        Self { config, engine }
    }

    pub fn with_engine(mut self, engine: AuctionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn engine(&self) -> &AuctionEngine {
        &self.engine
    }

    /// Build the axum router without binding a socket
    pub fn router(&self) -> Router {
        let schema = create_schema(self.engine.clone());
        let subscription_service = GraphQLSubscription::new(schema.clone());

        let app = Router::new()
            .route("/", get(graphiql).post(graphql_handler))
            .route("/graphql", post(graphql_handler))
            .route_service(SUBSCRIPTION_PATH, subscription_service)
            .route("/health", get(health_check))
            .with_state(schema);

        if self.config.server.cors_enabled {
            app.layer(CorsLayer::permissive())
        } else {
            app
        }
    }

    /// Serve until Ctrl-C, then stop the pending expiry timer
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr: SocketAddr = self.config.bind_address().parse()?;
        let app = self.router();
        let port = self.config.server.port;

        info!("🚀 GraphQL server running on http://localhost:{}", port);
        info!("📊 GraphiQL interface: http://localhost:{}", port);
        info!("🔗 GraphQL endpoint: http://localhost:{}/graphql", port);
        info!("📡 GraphQL WebSocket: ws://localhost:{}{}", port, SUBSCRIPTION_PATH);

        // Use axum 0.6 syntax
        Server::bind(&addr)
            .serve(app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.engine.shutdown().await;
        info!("Server stopped");
        Ok(())
    }
}

impl Default for GraphQLServer {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

/// Builder for configuring and starting the server
pub struct GraphQLServerBuilder {
    config: AppConfig,
    engine: Option<AuctionEngine>,
}

impl GraphQLServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            engine: None,
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Share an existing engine instead of creating one from the config
    pub fn with_engine(mut self, engine: AuctionEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> GraphQLServer {
        let server = GraphQLServer::new(self.config);
        match self.engine {
            Some(engine) => server.with_engine(engine),
            None => server,
        }
    }

    pub async fn build_and_run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.build().run().await
    }
}

impl Default for GraphQLServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// GraphQL handler
async fn graphql_handler(State(schema): State<AuctionSchema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

// GraphiQL interface with WebSocket support
async fn graphiql() -> impl IntoResponse {
    Html(
        GraphiQLSource::build()
            .endpoint("/graphql")
            .subscription_endpoint(SUBSCRIPTION_PATH)
            .finish(),
    )
}

// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Live auction GraphQL server is running!")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down server...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let app = GraphQLServer::default().router();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_graphql_endpoint_reaches_shared_engine() {
        let server = GraphQLServerBuilder::new().build();
        let app = server.router();

        let request = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"query":"mutation { incrementCounter }"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(server.engine().get_counter().await, 1);
    }

    #[tokio::test]
    async fn test_graphiql_page() {
        let app = GraphQLServer::default().router();

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_builder_overrides_port() {
        let server = GraphQLServerBuilder::new().with_port(4555).build();
        assert_eq!(server.config.bind_address(), "0.0.0.0:4555");
    }
}
