//! Asset Module
//!
//! Asset storage and loading:
//! - [`AssetServer`]: shared handle-based storage for geometries and materials
//! - [`io`]: async byte readers
//! - [`Prefab`]: decoded model data ready to splice into a scene
//! - [`loaders::gltf`]: glTF 2.0 decoding into prefabs

pub mod io;
pub mod loaders;
pub mod prefab;
pub mod server;
pub mod storage;

pub use prefab::{Prefab, PrefabNode, SharedPrefab};
pub use server::{AssetServer, GeometryHandle, MaterialHandle};
pub use storage::AssetStorage;
