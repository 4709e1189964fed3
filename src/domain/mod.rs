// Domain layer - Pure data and rules, no I/O
pub mod color;
pub mod error;
pub mod sample;
pub mod series;
pub mod window;
