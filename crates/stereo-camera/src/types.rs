use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PixelFormat {
    Gray8,
    Gray16,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Gray16 => 2,
        }
    }
}

/// Single-channel sample type stored in an [`Image`].
pub trait Pixel: Copy + Default + 'static {
    const FORMAT: PixelFormat;
}

impl Pixel for u8 {
    const FORMAT: PixelFormat = PixelFormat::Gray8;
}

impl Pixel for u16 {
    const FORMAT: PixelFormat = PixelFormat::Gray16;
}

/// Fixed-size single-channel image, row-major.
///
/// Dimensions are set at construction and cannot change afterwards; only the
/// pixel contents are writable.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<P: Pixel> {
    width: u32,
    height: u32,
    data: Vec<P>,
}

impl<P: Pixel> Image<P> {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            width: resolution.width,
            height: resolution.height,
            data: vec![P::default(); resolution.pixel_count()],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn pixel_format(&self) -> PixelFormat {
        P::FORMAT
    }

    /// Size of the pixel storage in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len() * P::FORMAT.bytes_per_pixel()
    }

    pub fn pixels(&self) -> &[P] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [P] {
        &mut self.data
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Sample depth reported by the device. Only 8 and 16 bits are accepted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }
}

impl TryFrom<u32> for BitDepth {
    type Error = u32;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            other => Err(other),
        }
    }
}

/// Capture modes understood by the device firmware.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Rectified left + right
    LeftRight,
    /// Left + disparity
    LeftDisparity,
    /// Left + right + disparity
    #[default]
    LeftRightDisparity,
    /// Left + right at the high-definition resolution
    LeftRightHd,
}

impl CaptureMode {
    /// Firmware mode code.
    pub fn code(self) -> u8 {
        match self {
            CaptureMode::LeftRight => 0,
            CaptureMode::LeftDisparity => 1,
            CaptureMode::LeftRightDisparity => 2,
            CaptureMode::LeftRightHd => 3,
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureMode::LeftRight => "left-right",
            CaptureMode::LeftDisparity => "left-disparity",
            CaptureMode::LeftRightDisparity => "left-right-disparity",
            CaptureMode::LeftRightHd => "left-right-hd",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// Result of one synchronized fetch from the device.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchStatus {
    Success,
    Timeout,
    Failure,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamState {
    Stopped,
    Running,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_eight_and_sixteen_bits_are_valid() {
        assert_eq!(BitDepth::try_from(8), Ok(BitDepth::Eight));
        assert_eq!(BitDepth::try_from(16), Ok(BitDepth::Sixteen));
        assert_eq!(BitDepth::try_from(12), Err(12));
    }

    #[test]
    fn disparity_image_is_twice_as_wide_in_bytes() {
        let res = Resolution::new(10, 4);
        let gray: Image<u8> = Image::new(res);
        let disp: Image<u16> = Image::new(res);
        assert_eq!(gray.pixels().len(), disp.pixels().len());
        assert_eq!(gray.byte_len(), 40);
        assert_eq!(disp.byte_len(), 80);
        assert_eq!(disp.pixel_format(), PixelFormat::Gray16);
    }
}
