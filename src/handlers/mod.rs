//! HTTP handlers. Each one parses its request, calls a service, and shapes
//! the JSON response; `AppError` does the error mapping.

pub mod bucket_handlers;
pub mod health_handlers;
pub mod item_handlers;
