//! Tests for color-space conversions

#[cfg(test)]
mod tests {
    use photomosaic::math::color::ColorSpace;

    // Tests RGB passes through unchanged
    // Verified by swapping channels in the RGB branch
    #[test]
    fn test_rgb_identity() {
        let rgb = [12, 200, 99];
        assert_eq!(ColorSpace::Rgb.from_rgb(rgb), rgb);
        assert_eq!(ColorSpace::Rgb.to_rgb(rgb), rgb);
    }

    // Tests HSV of primaries and greys
    // Verified by dropping the hue rescale onto 0..=255
    #[test]
    fn test_hsv_primaries() {
        assert_eq!(ColorSpace::Hsv.from_rgb([255, 0, 0]), [0, 255, 255]);
        assert_eq!(ColorSpace::Hsv.from_rgb([0, 255, 0]), [85, 255, 255]);
        assert_eq!(ColorSpace::Hsv.from_rgb([0, 0, 255]), [170, 255, 255]);
        assert_eq!(ColorSpace::Hsv.from_rgb([128, 128, 128]), [0, 0, 128]);
        assert_eq!(ColorSpace::Hsv.from_rgb([0, 0, 0]), [0, 0, 0]);
    }

    // Tests YIQ luma and centred chroma for greys
    // Verified by removing the 127.5 chroma offset
    #[test]
    fn test_yiq_greys() {
        assert_eq!(ColorSpace::Yiq.from_rgb([0, 0, 0]), [0, 128, 128]);

        let [y, i, q] = ColorSpace::Yiq.from_rgb([255, 255, 255]);
        assert_eq!(y, 255);
        assert!((127..=128).contains(&i));
        assert!((127..=128).contains(&q));
    }

    // Tests conversions back to RGB stay within rounding error
    // Verified by using the forward matrix for the inverse
    #[test]
    fn test_round_trip_is_close() {
        let samples = [
            [255, 0, 0],
            [10, 200, 30],
            [90, 90, 200],
            [240, 240, 16],
            [128, 64, 32],
        ];
        for space in [ColorSpace::Yiq, ColorSpace::Hsv] {
            for rgb in samples {
                let back = space.to_rgb(space.from_rgb(rgb));
                for (a, b) in rgb.iter().zip(back.iter()) {
                    assert!(
                        a.abs_diff(*b) <= 6,
                        "{space:?} round trip of {rgb:?} gave {back:?}"
                    );
                }
            }
        }
    }
}
