//! Configuration loaded from `.tokenvault.toml`.

pub mod settings;

pub use settings::Settings;
