// Application layer - Use cases and the ports they depend on
pub mod accumulator;
pub mod clock;
pub mod connectivity;
pub mod naming;
pub mod session;
