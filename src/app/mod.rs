pub mod app;
pub(crate) mod app_state;
pub mod input;
pub mod services;

pub use app::App;
