use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use anyhow::Context as _;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Raster image in premultiplied RGBA8 form.
#[derive(Clone)]
pub struct ImageData {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
    pub(crate) pixmap: OnceLock<Arc<vello_cpu::Pixmap>>,
}

impl ImageData {
    /// Wrap premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(width: u32, height: u32, bytes: Vec<u8>) -> ScenecastResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScenecastError::validation("image width/height must be non-zero"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(ScenecastError::validation(format!(
                "image {width}x{height} exceeds the 65535px raster limit"
            )));
        }
        if bytes.len() != (width as usize) * (height as usize) * 4 {
            return Err(ScenecastError::validation(
                "image byte length must equal width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(bytes),
            pixmap: OnceLock::new(),
        })
    }

    /// Premultiply and wrap straight-alpha RGBA8 bytes.
    pub fn from_straight_rgba8(width: u32, height: u32, mut bytes: Vec<u8>) -> ScenecastResult<Self> {
        premultiply_rgba8_in_place(&mut bytes);
        Self::from_premul_rgba8(width, height, bytes)
    }

    /// Decode an encoded image (PNG, JPEG, ...) into premultiplied RGBA8.
    pub fn decode(bytes: &[u8]) -> ScenecastResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_straight_rgba8(width, height, rgba.into_raw())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel bytes in row-major premultiplied RGBA8.
    pub fn data(&self) -> &[u8] {
        &self.rgba8_premul
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Lookup of decoded still images by asset id.
///
/// A missing asset is not an error: nodes referencing it paint nothing.
pub trait AssetProvider: Send + Sync {
    /// Image registered under `id`, if any.
    fn image(&self, id: &str) -> Option<Arc<ImageData>>;
}

/// Lookup of decoded video frames by source id and integer frame index.
pub trait FrameSource: Send + Sync {
    /// Frame `index` of video `src`, if available.
    fn frame(&self, src: &str, index: FrameIndex) -> Option<Arc<ImageData>>;
}

/// In-memory asset provider and frame source.
#[derive(Default, Clone, Debug)]
pub struct AssetStore {
    images: HashMap<String, Arc<ImageData>>,
    frames: HashMap<(String, u64), Arc<ImageData>>,
}

impl AssetStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoded image under `id`.
    pub fn insert_image(&mut self, id: impl Into<String>, image: ImageData) {
        self.images.insert(id.into(), Arc::new(image));
    }

    /// Decode `bytes` and register the result under `id`.
    pub fn insert_encoded(&mut self, id: impl Into<String>, bytes: &[u8]) -> ScenecastResult<()> {
        let id = id.into();
        let image = ImageData::decode(bytes)
            .map_err(|e| ScenecastError::validation(format!("asset '{id}': {e}")))?;
        self.insert_image(id, image);
        Ok(())
    }

    /// Read and decode the file at `path`, registering it under `id`.
    pub fn load_file(
        &mut self,
        id: impl Into<String>,
        path: impl AsRef<std::path::Path>,
    ) -> ScenecastResult<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read asset file '{}'", path.display()))?;
        self.insert_encoded(id, &bytes)
    }

    /// Register frame `index` of video `src`.
    pub fn insert_frame(&mut self, src: impl Into<String>, index: FrameIndex, image: ImageData) {
        self.frames.insert((src.into(), index.0), Arc::new(image));
    }

    /// Number of registered still images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl AssetProvider for AssetStore {
    fn image(&self, id: &str) -> Option<Arc<ImageData>> {
        self.images.get(id).cloned()
    }
}

impl FrameSource for AssetStore {
    fn frame(&self, src: &str, index: FrameIndex) -> Option<Arc<ImageData>> {
        self.frames.get(&(src.to_owned(), index.0)).cloned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
