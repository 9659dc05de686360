pub mod event;
pub mod plan;
pub mod transcript;
