use std::sync::Arc;

use compositor::FrameBuffer;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::debug;
use winit::window::Window;

/// Owns the window surface and blits compositor frames onto it.
pub(crate) struct Presenter {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl Presenter {
    pub(crate) fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// Frames sized for a stale viewport are dropped; the next render matches again.
    pub(crate) fn present(&mut self, frame: &FrameBuffer) -> Result<(), Error> {
        if frame.width() != self.width || frame.height() != self.height {
            debug!(
                frame_width = frame.width(),
                frame_height = frame.height(),
                surface_width = self.width,
                surface_height = self.height,
                "presenter_frame_size_mismatch"
            );
            return Ok(());
        }
        let target = self.pixels.frame_mut();
        let source = frame.as_bytes();
        if target.len() != source.len() {
            return Ok(());
        }
        target.copy_from_slice(source);
        self.pixels.render()
    }
}
