//! Color-space conversions for feature vectors
//!
//! Every space is encoded as three `u8` channels so that feature vectors stay
//! compact regardless of the active space. RGB is passed through, YIQ is a
//! fixed linear transform with the chroma axes re-centred on 127.5, and HSV
//! is the usual hexcone model with hue scaled from degrees onto `0..=255`.

/// Color space used for feature vectors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ColorSpace {
    /// Direct channel passthrough
    #[default]
    Rgb,
    /// Luma plus in-phase/quadrature chroma (linear)
    Yiq,
    /// Hue, saturation, value (nonlinear)
    Hsv,
}

// Chroma half-ranges of the YIQ transform for 8-bit input
const I_RANGE: f32 = 0.596 * 255.0;
const Q_RANGE: f32 = 0.523 * 255.0;

impl ColorSpace {
    /// Convert an RGB triple into this color space
    pub fn from_rgb(self, rgb: [u8; 3]) -> [u8; 3] {
        match self {
            Self::Rgb => rgb,
            Self::Yiq => rgb_to_yiq(rgb),
            Self::Hsv => rgb_to_hsv(rgb),
        }
    }

    /// Convert a triple in this color space back to RGB
    ///
    /// Exact for RGB, approximate (within rounding) for the other spaces.
    pub fn to_rgb(self, value: [u8; 3]) -> [u8; 3] {
        match self {
            Self::Rgb => value,
            Self::Yiq => yiq_to_rgb(value),
            Self::Hsv => hsv_to_rgb(value),
        }
    }
}

fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn rgb_to_yiq([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let y = 0.114f32.mul_add(b, 0.299f32.mul_add(r, 0.587 * g));
    let i = 0.322f32.mul_add(-b, 0.596f32.mul_add(r, -0.274 * g));
    let q = 0.312f32.mul_add(b, 0.211f32.mul_add(r, -0.523 * g));

    [
        to_channel(y),
        to_channel((i / I_RANGE).mul_add(127.5, 127.5)),
        to_channel((q / Q_RANGE).mul_add(127.5, 127.5)),
    ]
}

fn yiq_to_rgb([y, i, q]: [u8; 3]) -> [u8; 3] {
    let y = f32::from(y);
    let i = (f32::from(i) - 127.5) / 127.5 * I_RANGE;
    let q = (f32::from(q) - 127.5) / 127.5 * Q_RANGE;

    [
        to_channel(0.621f32.mul_add(q, 0.956f32.mul_add(i, y))),
        to_channel(0.647f32.mul_add(-q, 0.272f32.mul_add(-i, y))),
        to_channel(1.703f32.mul_add(q, 1.106f32.mul_add(-i, y))),
    ]
}

fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = f32::from(max - min);

    if max == 0 || delta == 0.0 {
        return [0, 0, max];
    }

    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let hue = if (r - f32::from(max)).abs() < f32::EPSILON {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if (g - f32::from(max)).abs() < f32::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    [
        to_channel(hue / 360.0 * 255.0),
        to_channel(delta / f32::from(max) * 255.0),
        max,
    ]
}

fn hsv_to_rgb([h, s, v]: [u8; 3]) -> [u8; 3] {
    let value = f32::from(v);
    let chroma = value * f32::from(s) / 255.0;
    let sector = f32::from(h) / 255.0 * 6.0;
    let x = chroma * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = value - chroma;

    [to_channel(r + m), to_channel(g + m), to_channel(b + m)]
}
