pub mod commands;
pub mod handlers;
pub mod interactions;
pub mod middleware;
pub mod routes;

pub use commands::{CommandRegistry, OpenTicketForm, TICKET_COMMAND};
pub use routes::create_router;
