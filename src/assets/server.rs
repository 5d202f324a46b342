use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use slotmap::new_key_type;
use tokio::runtime::Runtime;

use crate::assets::io::{AssetReader, FileAssetReader};
use crate::assets::loaders::gltf::GltfLoader;
use crate::assets::prefab::SharedPrefab;
use crate::assets::storage::AssetStorage;
use crate::errors::{ArdentError, Result};
use crate::resources::geometry::Geometry;
use crate::resources::material::Material;

/// Dedicated multi-thread runtime for asset IO and decoding, created on
/// first use and shared process-wide.
pub fn get_asset_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create asset loader runtime"))
}

// Strongly-typed handles
new_key_type! {
    pub struct GeometryHandle;
    pub struct MaterialHandle;
}

/// Shared asset storage.
///
/// Lightweight and freely cloneable; decode tasks hold a clone and insert
/// geometries and materials while the render loop reads through handles.
#[derive(Clone)]
pub struct AssetServer {
    pub geometries: Arc<AssetStorage<GeometryHandle, Geometry>>,
    pub materials: Arc<AssetStorage<MaterialHandle, Material>>,
}

impl Default for AssetServer {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            geometries: Arc::new(AssetStorage::new()),
            materials: Arc::new(AssetStorage::new()),
        }
    }

    pub fn add_geometry(&self, geometry: Geometry) -> GeometryHandle {
        self.geometries.add(geometry)
    }

    pub fn add_material(&self, material: Material) -> MaterialHandle {
        self.materials.add(material)
    }

    pub fn get_geometry(&self, handle: GeometryHandle) -> Option<Arc<Geometry>> {
        self.geometries.get(handle)
    }

    pub fn get_material(&self, handle: MaterialHandle) -> Option<Arc<Material>> {
        self.materials.get(handle)
    }

    /// Reads and decodes a glTF/GLB file into a prefab.
    ///
    /// The file read happens on the asset runtime; decoding runs inline in
    /// the calling task. Geometries and materials land in this server,
    /// node topology and clips in the returned prefab.
    pub async fn load_prefab_async(&self, path: impl AsRef<Path>) -> Result<SharedPrefab> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let reader = FileAssetReader::new(path);
        let bytes = reader
            .read_bytes(&file_name)
            .await
            .map_err(|e| ArdentError::AssetNotFound(format!("{}: {e}", path.display())))?;

        let loader = GltfLoader::new(self.clone());
        let prefab = loader.load_from_bytes(&bytes, &file_name)?;
        Ok(Arc::new(prefab))
    }

    /// Blocking prefab load for startup paths and tests.
    pub fn load_prefab(&self, path: impl AsRef<Path>) -> Result<SharedPrefab> {
        let path: PathBuf = path.as_ref().to_path_buf();
        get_asset_runtime().block_on(self.load_prefab_async(path))
    }
}
