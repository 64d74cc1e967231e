pub mod app_config;
pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;
