pub mod error;
pub mod folder;
pub mod page;
pub mod settings;
pub mod turn;

// Re-export common error type
pub use error::SidefoldError;
