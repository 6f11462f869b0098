// Library surface for headless/integration tests and reuse.
// The terminal front-end lives in main.rs and ui.rs.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod gesture;
pub mod keymap;
pub mod lock;
pub mod record_store;
pub mod runtime;
pub mod score;
pub mod session;
pub mod util;
