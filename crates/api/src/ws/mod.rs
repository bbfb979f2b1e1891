//! WebSocket change feed.
//!
//! Browsers connect to `/api/v1/ws` and receive `db_change` messages telling
//! them which table to refetch. Passing `?token=<jwt>` identifies the
//! connection so private changes (orders, favorites) reach their owner.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
