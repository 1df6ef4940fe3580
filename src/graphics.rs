//! GPU upload boundary.
//!
//! The host owns the real rendering context. It plugs in through
//! [`Graphics`], which is only ever called while the source's gate is held.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Opaque handle to a texture owned by a [`Graphics`] backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Texture management provided by the host rendering context.
///
/// Implementations may assume exclusive access to the rendering context for
/// the duration of each call.
pub trait Graphics: Send {
    /// Create a texture from RGBA8 pixels. `None` if the backend refused.
    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> Option<TextureHandle>;

    /// Replace the contents of an existing texture (next animation frame).
    fn update_texture(&mut self, texture: TextureHandle, pixels: &[u8]);

    /// Destroy a texture. The handle is not used again.
    fn destroy_texture(&mut self, texture: TextureHandle);
}

/// Counters shared between a [`HeadlessGraphics`] and its observers.
#[derive(Debug, Default)]
pub struct GraphicsCounters {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    updates: AtomicUsize,
    uploaded_bytes: AtomicUsize,
}

impl GraphicsCounters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Frame updates pushed into existing textures.
    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes.load(Ordering::SeqCst)
    }

    /// Textures created and not yet destroyed.
    pub fn live_textures(&self) -> usize {
        self.created() - self.destroyed()
    }
}

/// Backend with no GPU behind it: hands out handles and counts traffic.
///
/// Used by the demo binary and by tests.
#[derive(Debug, Default)]
pub struct HeadlessGraphics {
    next_handle: u64,
    counters: Arc<GraphicsCounters>,
}

impl HeadlessGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared counters; stay readable after the backend is boxed away.
    pub fn counters(&self) -> Arc<GraphicsCounters> {
        Arc::clone(&self.counters)
    }
}

impl Graphics for HeadlessGraphics {
    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> Option<TextureHandle> {
        self.next_handle += 1;
        let handle = TextureHandle(self.next_handle);
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        self.counters
            .uploaded_bytes
            .fetch_add(pixels.len(), Ordering::SeqCst);
        log::trace!("Created texture {:?} ({}x{})", handle, width, height);
        Some(handle)
    }

    fn update_texture(&mut self, texture: TextureHandle, pixels: &[u8]) {
        self.counters.updates.fetch_add(1, Ordering::SeqCst);
        self.counters
            .uploaded_bytes
            .fetch_add(pixels.len(), Ordering::SeqCst);
        log::trace!("Updated texture {:?}", texture);
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
        log::trace!("Destroyed texture {:?}", texture);
    }
}
