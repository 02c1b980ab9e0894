pub mod caps;
pub mod trace;
pub mod types;
pub mod window;
