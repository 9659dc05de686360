pub mod calendar_service;
pub mod date_resolver;
pub mod event_service;
pub mod extract;
pub mod openai_service;
pub mod orchestrator;
pub mod plan_service;
pub mod prompts;
pub mod routing;
pub mod summary_service;
