pub mod commands;
pub mod dialog;
pub mod handlers;
pub mod state;
pub mod transport;
