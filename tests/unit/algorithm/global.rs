//! Tests for globally sorted one-use assignment

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use photomosaic::MosaicError;
    use photomosaic::algorithm::GlobalSearch;
    use photomosaic::analysis::{
        Candidate, ChannelWeights, FeatureVector, Matcher, Orientation, Pool,
    };
    use photomosaic::io::progress::ProgressReporter;
    use photomosaic::math::color::ColorSpace;
    use photomosaic::spatial::Tiling;
    use std::collections::HashSet;

    fn push(pool: &mut Pool, color: [u8; 3]) -> usize {
        let name = format!("{}.png", pool.len());
        pool.push(Candidate::new(
            name,
            0,
            &FeatureVector::uniform(color),
            ColorSpace::Rgb,
        ))
    }

    fn features(colors: &[[u8; 3]], cols: usize) -> Array2<FeatureVector> {
        let vectors: Vec<FeatureVector> = colors.iter().map(|&c| FeatureVector::uniform(c)).collect();
        Array2::from_shape_vec((colors.len() / cols, cols), vectors)
            .expect("Failed to shape features")
    }

    fn matcher(pool: &Pool) -> Matcher<'_> {
        Matcher::new(pool, ChannelWeights::default(), Orientation::BOTH)
    }

    // Tests each candidate is used at most once and every tile is filled
    // Verified by not marking candidates as used
    #[test]
    fn test_each_candidate_once() {
        let mut pool = Pool::new();
        for n in 0..6u8 {
            push(&mut pool, [n * 40, n * 40, n * 40]);
        }
        let tiling = Tiling::new(30, 20, 3, 2).expect("Failed to build tiling");
        let features = features(&[[0, 0, 0]; 6], 3);

        let map = GlobalSearch::new(matcher(&pool), 0)
            .run(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run global search");

        assert!(map.is_complete());
        let used: HashSet<usize> = map.used_candidates().into_iter().collect();
        assert_eq!(used.len(), 6);
    }

    // Tests the globally best pairings win over raster order
    // Verified by assigning tiles in raster order instead of score order
    #[test]
    fn test_best_pairs_first() {
        let mut pool = Pool::new();
        let dark = push(&mut pool, [10, 10, 10]);
        let light = push(&mut pool, [240, 240, 240]);
        let tiling = Tiling::new(20, 10, 2, 1).expect("Failed to build tiling");
        // The left tile alone would prefer the light candidate
        let features = features(&[[130, 130, 130], [250, 250, 250]], 2);

        let map = GlobalSearch::new(matcher(&pool), 0)
            .run(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run global search");

        assert_eq!(map.get(1, 0).map(|m| m.candidate), Some(light));
        assert_eq!(map.get(0, 0).map(|m| m.candidate), Some(dark));
    }

    // Tests a pool smaller than the grid is rejected up front
    // Verified by removing the pool size check
    #[test]
    fn test_pool_too_small() {
        let mut pool = Pool::new();
        push(&mut pool, [0, 0, 0]);
        let tiling = Tiling::new(20, 10, 2, 1).expect("Failed to build tiling");
        let features = features(&[[0, 0, 0]; 2], 2);

        let result =
            GlobalSearch::new(matcher(&pool), 0).run(&features, &tiling, &ProgressReporter::hidden());
        assert!(matches!(
            result,
            Err(MosaicError::PoolTooSmall {
                required: 2,
                available: 1,
                ..
            })
        ));
    }

    // Tests the anti radius keeps tiles away from their origin first
    // Verified by skipping the restricted pass
    #[test]
    fn test_anti_radius_moves_tiles() {
        let mut pool = Pool::new();
        let black = pool.push(
            Candidate::new("0_0", 0, &FeatureVector::uniform([0, 0, 0]), ColorSpace::Rgb)
                .with_anti(0, 0),
        );
        let white = pool.push(
            Candidate::new(
                "1_0",
                0,
                &FeatureVector::uniform([255, 255, 255]),
                ColorSpace::Rgb,
            )
            .with_anti(1, 0),
        );
        let tiling = Tiling::new(20, 10, 2, 1).expect("Failed to build tiling");
        let features = features(&[[0, 0, 0], [255, 255, 255]], 2);

        let unrestricted = GlobalSearch::new(matcher(&pool), 0)
            .run(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run global search");
        assert_eq!(unrestricted.used_candidates(), vec![black, white]);

        let restricted = GlobalSearch::new(matcher(&pool), 1)
            .run(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run global search");
        assert_eq!(restricted.used_candidates(), vec![white, black]);
    }

    // Tests tiles the restricted pass cannot fill are completed afterwards
    // Verified by returning after the restricted pass
    #[test]
    fn test_anti_radius_falls_back() {
        let mut pool = Pool::new();
        for x in 0..2 {
            pool.push(
                Candidate::new(
                    format!("{x}_0"),
                    0,
                    &FeatureVector::uniform([0, 0, 0]),
                    ColorSpace::Rgb,
                )
                .with_anti(x, 0),
            );
        }
        let tiling = Tiling::new(20, 10, 2, 1).expect("Failed to build tiling");
        let features = features(&[[0, 0, 0]; 2], 2);

        let map = GlobalSearch::new(matcher(&pool), 5)
            .run(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run global search");
        assert!(map.is_complete());
    }

    // Tests features must match the tiling shape
    // Verified by removing the feature shape check
    #[test]
    fn test_feature_shape_checked() {
        let mut pool = Pool::new();
        for _ in 0..4 {
            push(&mut pool, [0, 0, 0]);
        }
        let tiling = Tiling::new(20, 20, 2, 2).expect("Failed to build tiling");
        let features = features(&[[0, 0, 0]; 3], 3);

        let result =
            GlobalSearch::new(matcher(&pool), 0).run(&features, &tiling, &ProgressReporter::hidden());
        assert!(matches!(result, Err(MosaicError::InvalidParameter { .. })));
    }
}
