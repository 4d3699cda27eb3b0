//! External resources the compositor reads: images, video frames, glyphs.

use std::sync::Arc;

use crate::layout::LayoutProvider;
use crate::layout::taffy_bridge::TaffyLayout;

/// Decoded image and video frame lookup.
pub mod store;
/// Glyph metrics trait and line breaking.
pub mod text;

pub use store::{AssetProvider, AssetStore, FrameSource, ImageData};
pub use text::{NoFonts, TextLine, TextShaper};

/// Shared read-only provider handles, cloned into every worker.
#[derive(Clone)]
pub struct RenderResources {
    /// Scene tree to box tree.
    pub layout: Arc<dyn LayoutProvider>,
    /// Still images.
    pub assets: Arc<dyn AssetProvider>,
    /// Video frames.
    pub frames: Arc<dyn FrameSource>,
    /// Glyph metrics and outlines.
    pub text: Arc<dyn TextShaper>,
}

impl RenderResources {
    /// Resources backed by one [`AssetStore`] and `text`, laid out by [`TaffyLayout`].
    pub fn from_store(store: AssetStore, text: Arc<dyn TextShaper>) -> Self {
        let store = Arc::new(store);
        Self {
            layout: Arc::new(TaffyLayout::new(store.clone(), text.clone())),
            assets: store.clone(),
            frames: store,
            text,
        }
    }

    /// Replace the layout provider.
    pub fn with_layout(mut self, layout: Arc<dyn LayoutProvider>) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for RenderResources {
    fn default() -> Self {
        Self::from_store(AssetStore::new(), Arc::new(NoFonts))
    }
}

impl std::fmt::Debug for RenderResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderResources").finish_non_exhaustive()
    }
}
