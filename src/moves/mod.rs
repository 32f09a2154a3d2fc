pub mod execute;
pub mod geometry;
pub mod magic;
pub mod movegen;
pub mod perft;
pub mod san;
pub mod square_control;
pub mod types;
