//! Data Transfer Objects for REST request/response serialization.

pub mod cleanup_dto;
pub mod reschedule_dto;
pub mod sync_dto;
pub mod webhook_dto;

pub use cleanup_dto::*;
pub use reschedule_dto::*;
pub use sync_dto::*;
pub use webhook_dto::*;
