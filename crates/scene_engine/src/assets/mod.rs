//! Asset management
//!
//! Only raw file access lives here; decoding meshes, textures or audio is up
//! to the code that asked for the bytes.

pub mod resource_loader;

pub use resource_loader::{FileResourceLoader, Resource, ResourceLoader};
