//! Tests for image codec access, flips, resampling and row streaming

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use photomosaic::MosaicError;
    use photomosaic::analysis::Orientation;
    use photomosaic::io::image::{
        FilterScaler, ImageRows, RowSource, Scaler, crop, decode_rgb, load_rgb, orient, save_rgb,
    };
    use photomosaic::spatial::PixelRect;
    use std::path::Path;
    use tempfile::TempDir;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, (x + y) as u8]))
    }

    // Tests saving creates directories and loading restores pixels
    // Verified by skipping parent directory creation
    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("nested/out.png");
        let image = gradient(7, 5);

        save_rgb(&image, &path).expect("Failed to save image");
        let loaded = load_rgb(&path).expect("Failed to load image");
        assert_eq!(loaded, image);
    }

    // Tests load and decode failures become image load errors
    // Verified by mapping decode failures to file system errors
    #[test]
    fn test_load_failures() {
        assert!(matches!(
            load_rgb(Path::new("/nonexistent/tile.png")),
            Err(MosaicError::ImageLoad { .. })
        ));
        assert!(matches!(
            decode_rgb(b"not an image", Path::new("bogus.png")),
            Err(MosaicError::ImageLoad { .. })
        ));
    }

    // Tests cropping copies the requested rectangle
    // Verified by swapping origin coordinates in crop
    #[test]
    fn test_crop() {
        let image = gradient(10, 10);
        let part = crop(&image, PixelRect::new(3, 4, 2, 3));
        assert_eq!(part.dimensions(), (2, 3));
        assert_eq!(part.get_pixel(0, 0), image.get_pixel(3, 4));
        assert_eq!(part.get_pixel(1, 2), image.get_pixel(4, 6));
    }

    // Tests each orientation flips the right axis
    // Verified by flipping vertically for the horizontal flag
    #[test]
    fn test_orient() {
        let image = gradient(4, 3);
        assert_eq!(orient(&image, Orientation::IDENTITY), image);

        let horizontal = orient(&image, Orientation::new(true, false));
        assert_eq!(horizontal.get_pixel(0, 0), image.get_pixel(3, 0));

        let vertical = orient(&image, Orientation::new(false, true));
        assert_eq!(vertical.get_pixel(0, 0), image.get_pixel(0, 2));

        let both = orient(&image, Orientation::BOTH);
        assert_eq!(both.get_pixel(0, 0), image.get_pixel(3, 2));
    }

    // Tests scaling produces the requested size and keeps flat colors
    // Verified by returning the source unchanged for every size
    #[test]
    fn test_filter_scaler() {
        let scaler = FilterScaler::default();
        let flat = RgbImage::from_pixel(17, 9, Rgb([40, 80, 120]));

        let scaled = scaler.scale(&flat, 5, 5).expect("Failed to scale image");
        assert_eq!(scaled.dimensions(), (5, 5));
        assert!(scaled.pixels().all(|p| *p == Rgb([40, 80, 120])));

        let same = scaler.scale(&flat, 17, 9).expect("Failed to scale image");
        assert_eq!(same, flat);
    }

    // Tests empty sources and targets are rejected
    // Verified by removing the empty target check
    #[test]
    fn test_filter_scaler_empty() {
        let scaler = FilterScaler::default();
        assert!(scaler.scale(&RgbImage::new(0, 4), 2, 2).is_err());
        assert!(scaler.scale(&gradient(4, 4), 0, 2).is_err());
    }

    // Tests rows are streamed top to bottom without overlap
    // Verified by not advancing the cursor after a read
    #[test]
    fn test_image_rows() {
        let image = gradient(6, 10);
        let mut rows = ImageRows::new(image.clone());
        assert_eq!((rows.width(), rows.height()), (6, 10));

        let first = rows.read_rows(4).expect("Failed to read rows");
        let second = rows.read_rows(6).expect("Failed to read rows");
        assert_eq!(first.dimensions(), (6, 4));
        assert_eq!(second.get_pixel(2, 0), image.get_pixel(2, 4));
        assert_eq!(rows.remaining(), 0);
        assert!(rows.read_rows(1).is_err());
    }
}
