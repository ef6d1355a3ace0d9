pub mod add;
pub mod app;
pub mod log;
pub mod status;
pub mod summary;
pub mod sync;
