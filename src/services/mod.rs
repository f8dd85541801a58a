pub mod pubsub_service;
pub mod todo_service;
pub mod validation;
