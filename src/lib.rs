pub mod cli;
pub mod gesture;
pub mod hub;
pub mod io;
pub mod model;
pub mod ops;
pub mod tui;
