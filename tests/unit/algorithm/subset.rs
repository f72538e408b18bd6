//! Tests for bounded best-subset assignment

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use photomosaic::MosaicError;
    use photomosaic::algorithm::SubsetSearch;
    use photomosaic::analysis::{
        Candidate, ChannelWeights, FeatureVector, Matcher, Orientation, Pool,
    };
    use photomosaic::io::progress::ProgressReporter;
    use photomosaic::math::color::ColorSpace;
    use photomosaic::spatial::Tiling;

    fn pool(colors: &[[u8; 3]]) -> Pool {
        let mut pool = Pool::new();
        for (n, &color) in colors.iter().enumerate() {
            pool.push(Candidate::new(
                format!("{n}.png"),
                0,
                &FeatureVector::uniform(color),
                ColorSpace::Rgb,
            ));
        }
        pool
    }

    fn row(colors: &[[u8; 3]]) -> Array2<FeatureVector> {
        let vectors: Vec<FeatureVector> = colors.iter().map(|&c| FeatureVector::uniform(c)).collect();
        Array2::from_shape_vec((1, colors.len()), vectors).expect("Failed to shape features")
    }

    fn matcher(pool: &Pool) -> Matcher<'_> {
        Matcher::new(pool, ChannelWeights::default(), Orientation::IDENTITY)
    }

    // Tests only the best-matching tiles are filled
    // Verified by filling tiles in raster order
    #[test]
    fn test_fills_best_tiles() {
        let pool = pool(&[[100, 100, 100], [0, 0, 0]]);
        let tiling = Tiling::new(30, 10, 3, 1).expect("Failed to build tiling");
        let features = row(&[[60, 60, 60], [0, 0, 0], [100, 100, 100]]);

        let map = SubsetSearch::new(matcher(&pool), 2)
            .run(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run subset search");

        assert_eq!(map.filled_count(), 2);
        assert!(!map.is_filled(0, 0));
        assert_eq!(map.get(1, 0).map(|m| m.candidate), Some(1));
        assert_eq!(map.get(2, 0).map(|m| m.candidate), Some(0));
    }

    // Tests equal scores go to the lowest raster index
    // Verified by preferring later tiles on ties
    #[test]
    fn test_tie_prefers_first_tile() {
        let pool = pool(&[[50, 50, 50], [250, 250, 250]]);
        let tiling = Tiling::new(20, 10, 2, 1).expect("Failed to build tiling");
        let features = row(&[[50, 50, 50], [50, 50, 50]]);

        let map = SubsetSearch::new(matcher(&pool), 1)
            .run(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run subset search");

        assert_eq!(map.get(0, 0).map(|m| m.candidate), Some(0));
        assert!(!map.is_filled(1, 0));
    }

    // Tests a cached best is recomputed once its candidate is taken
    // Verified by keeping stale cached matches
    #[test]
    fn test_cache_invalidated_by_use() {
        let pool = pool(&[[50, 50, 50], [90, 90, 90]]);
        let tiling = Tiling::new(20, 10, 2, 1).expect("Failed to build tiling");
        let features = row(&[[55, 55, 55], [50, 50, 50]]);

        let map = SubsetSearch::new(matcher(&pool), 2)
            .run(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run subset search");

        assert_eq!(map.get(1, 0).map(|m| m.candidate), Some(0));
        assert_eq!(map.get(0, 0).map(|m| m.candidate), Some(1));
    }

    // Tests counts beyond the grid or the pool are rejected
    // Verified by clamping the count instead of failing
    #[test]
    fn test_count_limits() {
        let pool = pool(&[[0, 0, 0], [1, 1, 1]]);
        let tiling = Tiling::new(30, 10, 3, 1).expect("Failed to build tiling");
        let features = row(&[[0, 0, 0]; 3]);
        let progress = ProgressReporter::hidden();

        assert!(matches!(
            SubsetSearch::new(matcher(&pool), 4).run(&features, &tiling, &progress),
            Err(MosaicError::InvalidParameter { .. })
        ));
        assert!(matches!(
            SubsetSearch::new(matcher(&pool), 3).run(&features, &tiling, &progress),
            Err(MosaicError::PoolTooSmall {
                strategy: "subset",
                ..
            })
        ));
        let empty = SubsetSearch::new(matcher(&pool), 0)
            .run(&features, &tiling, &progress)
            .expect("Failed to run empty subset");
        assert_eq!(empty.filled_count(), 0);
    }
}
