//! Web front-end: HTTP API plus the embedded browser client.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, bind, shutdown)    │
//! │ (static) │ <─────── │    └─ api.rs  (route handlers, AppState)     │
//! └──────────┘          │         │                                    │
//!                       │         │ spawn_blocking                     │
//!                       │         v                                    │
//!                       │  discovery::BoardDiscovery  board::BoardStore│
//!                       └──────────────────────────────────────────────┘
//! ```
//!
//! | Module     | Responsibility                                        |
//! |------------|-------------------------------------------------------|
//! | `api`      | JSON endpoints, `ApiError` → status code mapping      |
//! | `server`   | Router assembly, SPA fallback, serve loop             |
//! | `embedded` | Client assets compiled in with `rust-embed`           |
//!
//! ## Typical Request Flow (browse into a directory)
//!
//! 1. `GET /api/directories?path=team/` → typeahead suggestions
//! 2. `GET /api/boards?path=team&recursive=true` → `[{ name, path }]`,
//!    served from the discovery cache when a fresh entry exists
//! 3. `GET /api/boards/<encoded path>` → board content as JSON

pub mod api;
pub mod embedded;
pub mod server;
