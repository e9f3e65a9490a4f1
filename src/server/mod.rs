// Live Auction Server Implementations

//! # Server Module
//!
//! Exposes the auction engine to network clients. The server layer sits on
//! top of the engine layer:
//! ```text
//! Client (browser, CLI)
//!        ↓ HTTP / WebSocket
//! Server Layer (this module) ← axum router, GraphiQL, health check
//!        ↓ GraphQL execution
//! Engine Layer ← schema, resolvers, AuctionEngine, EventBus
//! ```
//!
//! A single port serves everything: `POST /graphql` for queries and
//! mutations, `/ws` for subscriptions (both the `graphql-ws` and
//! `graphql-transport-ws` subprotocols), `GET /` for GraphiQL.

/// GraphQL HTTP server implementation
pub mod graphql;

pub use graphql::{GraphQLServer, GraphQLServerBuilder};
