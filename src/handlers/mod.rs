pub mod drinks;
pub mod system;
