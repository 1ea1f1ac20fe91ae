//! Immutable RGBA pixel grid shared read-only by every analysis stage.

use image::RgbaImage;

/// One 8-bit RGBA sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Rec. 601 luma on the 0–255 scale: `0.299R + 0.587G + 0.114B`.
    pub fn luminance(&self) -> f32 {
        0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32
    }
}

/// Width × height grid of RGBA samples, origin top-left, row-major.
///
/// Built once per analysis run and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Sample at linear (row-major) pixel index `i`.
    pub fn nth(&self, i: usize) -> Rgba {
        let o = i * 4;
        Rgba::new(self.data[o], self.data[o + 1], self.data[o + 2], self.data[o + 3])
    }

    /// Iterates samples in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Rgba> + '_ {
        self.data
            .chunks_exact(4)
            .map(|p| Rgba::new(p[0], p[1], p[2], p[3]))
    }
}

// Fixture constructors and point reads used by the stage tests.
#[cfg(test)]
impl PixelBuffer {
    /// Wraps raw RGBA8 bytes. Returns `None` when the byte count does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer where every pixel holds the same sample.
    pub fn filled(width: u32, height: u32, fill: Rgba) -> Self {
        Self::from_fn(width, height, |_, _| fill)
    }

    /// Buffer whose pixels are computed by `f(x, y)`.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgba) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let px = f(x, y);
                data.extend_from_slice(&[px.r, px.g, px.b, px.a]);
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Sample at `(x, y)`. Out-of-range reads panic like slice indexing.
    pub fn get(&self, x: u32, y: u32) -> Rgba {
        self.nth(y as usize * self.width as usize + x as usize)
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}
