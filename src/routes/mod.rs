pub mod system_routes;
pub mod todo_routes;
pub mod ws_routes;
