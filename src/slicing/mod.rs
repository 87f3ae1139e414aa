// Image slicing layout
// Crop, fit and cut arithmetic for turning one image into N tiles

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Space kept free around the tile strip inside the container
pub const CONTAINER_PADDING: f64 = 40.0;

#[derive(Debug, Error, PartialEq)]
pub enum SlicingError {
    #[error("Image has no area ({width}x{height})")]
    EmptyImage { width: f64, height: f64 },

    #[error("Container {width}x{height} leaves no room for tiles")]
    ContainerTooSmall { width: f64, height: f64 },

    #[error("Crop of {extent}px cannot be cut into {count} tiles")]
    TooManyTiles { extent: f64, count: usize },

    #[error("Cannot cut an image into zero tiles")]
    NoTiles,
}

/// Which way the image is cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceDirection {
    /// Side-by-side columns
    #[default]
    Vertical,
    /// Stacked rows
    Horizontal,
}

/// Crop window in percent of the image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for CropArea {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        }
    }
}

impl CropArea {
    /// Offsets are clamped to [0, 50] and extents to [50, 100], then the
    /// extent is shrunk so the window stays inside the image.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let x = x.clamp(0.0, 50.0);
        let y = y.clamp(0.0, 50.0);
        Self {
            x,
            y,
            width: width.clamp(50.0, 100.0).min(100.0 - x),
            height: height.clamp(50.0, 100.0).min(100.0 - y),
        }
    }
}

/// Available drawing area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub width: f64,
    pub height: f64,
}

/// Pixel rectangle in source image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where each tile comes from and how large it is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayout {
    /// Indexed by slice identity
    pub source_rects: Vec<SourceRect>,
    pub display_width: f64,
    pub display_height: f64,
}

impl TileLayout {
    pub fn len(&self) -> usize {
        self.source_rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_rects.is_empty()
    }

    /// Tile size after applying the animation scale percent
    pub fn scaled_size(&self, scale_percent: u32) -> (f64, f64) {
        let scale = f64::from(scale_percent) / 100.0;
        (self.display_width * scale, self.display_height * scale)
    }

    /// Pair every identity with a rendered handle
    pub fn describe<H>(&self, mut render: impl FnMut(usize, &SourceRect) -> H) -> Vec<TileDescriptor<H>> {
        self.source_rects
            .iter()
            .enumerate()
            .map(|(identity, rect)| TileDescriptor {
                handle: render(identity, rect),
                display_width: self.display_width,
                display_height: self.display_height,
            })
            .collect()
    }
}

/// Opaque per-identity tile handed to renderers
#[derive(Debug, Clone, PartialEq)]
pub struct TileDescriptor<H> {
    pub handle: H,
    pub display_width: f64,
    pub display_height: f64,
}

/// Lay out `count` tiles cut from the cropped image
///
/// The crop is fitted into the container minus padding: vertical cuts fit
/// the width first, horizontal cuts the height first, and either shrinks
/// again if the other side overflows. Source tiles are a whole number of
/// pixels wide (or tall), so a few trailing pixels may be dropped.
pub fn layout_tiles(
    image_width: f64,
    image_height: f64,
    crop: CropArea,
    direction: SliceDirection,
    container: Container,
    count: usize,
) -> Result<TileLayout, SlicingError> {
    if count == 0 {
        return Err(SlicingError::NoTiles);
    }
    if !(image_width > 0.0 && image_height > 0.0) {
        return Err(SlicingError::EmptyImage {
            width: image_width,
            height: image_height,
        });
    }

    let max_width = container.width - CONTAINER_PADDING;
    let max_height = container.height - CONTAINER_PADDING;
    if !(max_width > 0.0 && max_height > 0.0) {
        return Err(SlicingError::ContainerTooSmall {
            width: container.width,
            height: container.height,
        });
    }

    let crop_x = crop.x / 100.0 * image_width;
    let crop_y = crop.y / 100.0 * image_height;
    let crop_w = crop.width / 100.0 * image_width;
    let crop_h = crop.height / 100.0 * image_height;
    if !(crop_w > 0.0 && crop_h > 0.0) {
        return Err(SlicingError::EmptyImage {
            width: crop_w,
            height: crop_h,
        });
    }

    let (fit_width, fit_height) = match direction {
        SliceDirection::Vertical => {
            let mut width = crop_w.min(max_width);
            let mut height = crop_h * width / crop_w;
            if height > max_height {
                height = max_height;
                width = crop_w * height / crop_h;
            }
            (width, height)
        }
        SliceDirection::Horizontal => {
            let mut height = crop_h.min(max_height);
            let mut width = crop_w * height / crop_h;
            if width > max_width {
                width = max_width;
                height = crop_h * width / crop_w;
            }
            (width, height)
        }
    };

    let n = count as f64;
    let layout = match direction {
        SliceDirection::Vertical => {
            let tile = (crop_w / n).floor();
            if tile < 1.0 {
                return Err(SlicingError::TooManyTiles { extent: crop_w, count });
            }
            TileLayout {
                source_rects: (0..count)
                    .map(|i| SourceRect {
                        x: crop_x + i as f64 * tile,
                        y: crop_y,
                        width: tile,
                        height: crop_h,
                    })
                    .collect(),
                display_width: fit_width / n,
                display_height: fit_height,
            }
        }
        SliceDirection::Horizontal => {
            let tile = (crop_h / n).floor();
            if tile < 1.0 {
                return Err(SlicingError::TooManyTiles { extent: crop_h, count });
            }
            TileLayout {
                source_rects: (0..count)
                    .map(|i| SourceRect {
                        x: crop_x,
                        y: crop_y + i as f64 * tile,
                        width: crop_w,
                        height: tile,
                    })
                    .collect(),
                display_width: fit_width,
                display_height: fit_height / n,
            }
        }
    };

    log::debug!(
        "Laid out {} {:?} tiles at {:.1}x{:.1}",
        count,
        direction,
        layout.display_width,
        layout.display_height
    );
    Ok(layout)
}
