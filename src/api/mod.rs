pub mod dashboard_handlers;
pub mod handlers;
pub mod openapi;
pub mod responses;
pub mod routes;

pub use dashboard_handlers::DashboardState;
pub use handlers::ApiError;
pub use openapi::ApiDoc;
pub use responses::*;
pub use routes::create_router;
