//! Tests for strategy dispatch over a streamed target

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use photomosaic::MosaicError;
    use photomosaic::algorithm::{CollageConfig, MosaicConfig, MosaicExecutor, SearchMethod};
    use photomosaic::analysis::{Candidate, FeatureExtractor, FeatureVector, Pool};
    use photomosaic::io::image::{FilterScaler, ImageRows};
    use photomosaic::io::progress::ProgressReporter;
    use photomosaic::math::color::ColorSpace;
    use photomosaic::spatial::Tiling;
    use std::collections::HashSet;

    fn pool(count: u8) -> Pool {
        let mut pool = Pool::new();
        for n in 0..count {
            let shade = n * (255 / count.max(1));
            pool.push(Candidate::new(
                format!("{n}.png"),
                0,
                &FeatureVector::uniform([shade, shade, 255 - shade]),
                ColorSpace::Rgb,
            ));
        }
        pool
    }

    fn target() -> RgbImage {
        RgbImage::from_fn(40, 40, |x, y| Rgb([(x * 6) as u8, (y * 6) as u8, 90]))
    }

    fn executor(pool: &Pool, method: SearchMethod) -> MosaicExecutor<'_, FilterScaler> {
        let config = MosaicConfig {
            method,
            min_distance: 1,
            ..MosaicConfig::default()
        };
        MosaicExecutor::new(
            pool,
            FeatureExtractor::new(FilterScaler::default(), ColorSpace::Rgb),
            config,
        )
    }

    fn generate(pool: &Pool, method: SearchMethod) -> photomosaic::Result<Vec<usize>> {
        let tiling = Tiling::new(40, 40, 4, 4).expect("Failed to build tiling");
        let mut rows = ImageRows::new(target());
        let map = executor(pool, method).generate(&mut rows, &tiling, &ProgressReporter::hidden())?;
        Ok(map.used_candidates())
    }

    // Tests every grid strategy fills the tiles it is responsible for
    // Verified by returning an empty map from the cube branch
    #[test]
    fn test_methods_fill_grid() {
        let pool = pool(16);
        for method in [SearchMethod::Local, SearchMethod::Global, SearchMethod::Cube] {
            let used = generate(&pool, method).expect("Failed to generate mosaic");
            assert_eq!(used.len(), 16, "{} left tiles empty", method.name());
        }

        let global: HashSet<usize> = generate(&pool, SearchMethod::Global)
            .expect("Failed to generate mosaic")
            .into_iter()
            .collect();
        assert_eq!(global.len(), 16);
    }

    // Tests subset mode defaults to as many tiles as the pool can cover
    // Verified by defaulting the count to the tile count
    #[test]
    fn test_subset_default_count() {
        let pool = pool(5);
        let used = generate(&pool, SearchMethod::Subset).expect("Failed to generate mosaic");
        assert_eq!(used.len(), 5);
        assert_eq!(used.iter().collect::<HashSet<_>>().len(), 5);
    }

    // Tests an empty pool is rejected before any search
    // Verified by removing the empty pool check
    #[test]
    fn test_empty_pool() {
        let pool = Pool::new();
        assert!(matches!(
            generate(&pool, SearchMethod::Local),
            Err(MosaicError::PoolTooSmall {
                strategy: "local",
                ..
            })
        ));

        let collage = executor(&pool, SearchMethod::Local).collage(
            &target(),
            CollageConfig::default(),
            &ProgressReporter::hidden(),
        );
        assert!(matches!(
            collage,
            Err(MosaicError::PoolTooSmall {
                strategy: "collage",
                ..
            })
        ));
    }

    // Tests collage packing through the executor reports pixel progress
    // Verified by resetting progress to the placement count
    #[test]
    fn test_collage_progress() {
        let pool = pool(6);
        let progress = ProgressReporter::hidden();
        let layout = executor(&pool, SearchMethod::Local)
            .collage(&target(), CollageConfig::default(), &progress)
            .expect("Failed to pack collage");

        assert!(!layout.placements.is_empty());
        assert_eq!(progress.position(), 40 * 40);
    }

    // Tests strategy names used in logs and errors
    // Verified by swapping two names
    #[test]
    fn test_method_names() {
        assert_eq!(SearchMethod::default(), SearchMethod::Local);
        assert_eq!(SearchMethod::Global.name(), "global");
        assert_eq!(SearchMethod::Subset.name(), "subset");
        assert_eq!(SearchMethod::Cube.name(), "cube");
    }
}
