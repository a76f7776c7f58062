// src/models/mod.rs

pub mod deadstock;
pub mod equipment;
pub mod lab;
pub mod notification;
pub mod request;
pub mod staff;
pub mod status;

pub use deadstock::*;
pub use equipment::*;
pub use lab::*;
pub use notification::*;
pub use request::*;
pub use staff::*;
pub use status::*;

use serde::Serialize;

// ==================== COMMON / SHARED ====================

#[derive(Debug, Serialize)]
pub struct CreatedId {
    pub id: i64,
}
