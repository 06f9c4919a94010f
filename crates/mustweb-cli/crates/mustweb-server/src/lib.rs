pub mod render;
mod server;

pub use render::PageFn;
pub use server::{serve, serve_on, MustWeb};
