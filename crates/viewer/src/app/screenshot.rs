use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use compositor::FrameBuffer;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ScreenshotError {
    #[error("frame buffer could not be converted to an image")]
    EmptyFrame,
    #[error("failed to create screenshot directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write screenshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Writes the frame as `isoview-<stamp>.png` under `dir`, creating the directory if needed.
pub(crate) fn save_screenshot(
    frame: &FrameBuffer,
    dir: &Path,
    stamp_ms: u128,
) -> Result<PathBuf, ScreenshotError> {
    let image = frame.to_image().ok_or(ScreenshotError::EmptyFrame)?;
    fs::create_dir_all(dir).map_err(|source| ScreenshotError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(format!("isoview-{stamp_ms}.png"));
    image
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|source| ScreenshotError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
