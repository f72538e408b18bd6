//! Tests for greedy raster-order assignment

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use ndarray::Array2;
    use photomosaic::MosaicError;
    use photomosaic::algorithm::LocalSearch;
    use photomosaic::analysis::{
        Candidate, ChannelWeights, FeatureExtractor, FeatureVector, Matcher, Orientation, Pool,
    };
    use photomosaic::io::image::{FilterScaler, ImageRows};
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

    fn uniform_features(rows: usize, cols: usize, color: [u8; 3]) -> Array2<FeatureVector> {
        Array2::from_elem((rows, cols), FeatureVector::uniform(color))
    }

    fn matcher(pool: &Pool) -> Matcher<'_> {
        Matcher::new(pool, ChannelWeights::default(), Orientation::IDENTITY)
    }

    // Tests every tile takes its best match when reuse is unrestricted
    // Verified by excluding the tile's own position at distance 0
    #[test]
    fn test_distance_zero_reuses_best() {
        let pool = pool(&[[0, 0, 0], [200, 200, 200]]);
        let tiling = Tiling::new(30, 30, 3, 3).expect("Failed to build tiling");
        let features = uniform_features(3, 3, [10, 10, 10]);

        let map = LocalSearch::new(matcher(&pool), 0)
            .run_with_features(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run local search");

        assert!(map.is_complete());
        assert!(map.used_candidates().iter().all(|&c| c == 0));
    }

    // Tests a too-small pool fails at the first starved tile
    // Verified by skipping tiles without a match instead of failing
    #[test]
    fn test_neighborhood_exhausts_pool() {
        let pool = pool(&[[0, 0, 0], [10, 10, 10], [20, 20, 20]]);
        let tiling = Tiling::new(20, 20, 2, 2).expect("Failed to build tiling");
        let features = uniform_features(2, 2, [0, 0, 0]);

        let result = LocalSearch::new(matcher(&pool), 1).run_with_features(
            &features,
            &tiling,
            &ProgressReporter::hidden(),
        );

        assert!(matches!(result, Err(MosaicError::NoMatchFound { x: 1, y: 1 })));
    }

    // Tests neighbors within the radius never share a candidate
    // Verified by limiting the neighborhood to the previous row only
    #[test]
    fn test_neighbors_distinct() {
        let colors: Vec<[u8; 3]> = (0..12).map(|n| [n * 20, n * 20, n * 20]).collect();
        let pool = pool(&colors);
        let tiling = Tiling::new(50, 40, 5, 4).expect("Failed to build tiling");
        let features = uniform_features(4, 5, [0, 0, 0]);
        let distance = 1;

        let map = LocalSearch::new(matcher(&pool), distance)
            .run_with_features(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run local search");

        for (x, y) in tiling.tiles() {
            let here = map.get(x, y).map(|m| m.candidate);
            for (nx, ny) in tiling.tiles() {
                let chebyshev = x.abs_diff(nx).max(y.abs_diff(ny));
                if (nx, ny) != (x, y) && chebyshev <= distance {
                    assert_ne!(here, map.get(nx, ny).map(|m| m.candidate));
                }
            }
        }
        assert_eq!(map.get(0, 0).map(|m| m.candidate), Some(0));
    }

    // Tests four candidates suffice for a 2x2 grid at distance 1
    // Verified by counting the tile itself twice in the exclusion list
    #[test]
    fn test_four_candidates_fill_square() {
        let pool = pool(&[[0, 0, 0], [10, 10, 10], [20, 20, 20], [30, 30, 30]]);
        let tiling = Tiling::new(20, 20, 2, 2).expect("Failed to build tiling");
        let features = uniform_features(2, 2, [0, 0, 0]);

        let map = LocalSearch::new(matcher(&pool), 1)
            .run_with_features(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run local search");

        assert_eq!(map.used_candidates(), vec![0, 1, 2, 3]);
    }

    // Tests streaming the target gives the same map as precomputed features
    // Verified by reading rows from the top for every tile row
    #[test]
    fn test_streaming_matches_features() {
        let colors: Vec<[u8; 3]> = (0..8).map(|n| [n * 30, 255 - n * 30, 100]).collect();
        let pool = pool(&colors);
        let target = RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, (255 - y * 8) as u8, 100])
        });
        let tiling = Tiling::new(40, 30, 4, 3).expect("Failed to build tiling");
        let extractor = FeatureExtractor::new(FilterScaler::default(), ColorSpace::Rgb);
        let search = LocalSearch::new(matcher(&pool), 1);

        let mut rows = ImageRows::new(target.clone());
        let streamed = search
            .run(&mut rows, &tiling, &extractor, &ProgressReporter::hidden())
            .expect("Failed to run streamed search");

        let mut rows = ImageRows::new(target);
        let features = extractor
            .extract_tiles(&mut rows, &tiling)
            .expect("Failed to extract tiles");
        let precomputed = search
            .run_with_features(&features, &tiling, &ProgressReporter::hidden())
            .expect("Failed to run search");

        assert_eq!(streamed.used_candidates(), precomputed.used_candidates());
        assert_eq!(streamed.layout(), precomputed.layout());
    }

    // Tests a target that does not match the tiling is rejected
    // Verified by removing the size check before streaming
    #[test]
    fn test_run_rejects_wrong_size() {
        let pool = pool(&[[0, 0, 0]]);
        let tiling = Tiling::new(40, 30, 4, 3).expect("Failed to build tiling");
        let extractor = FeatureExtractor::new(FilterScaler::default(), ColorSpace::Rgb);
        let mut rows = ImageRows::new(RgbImage::new(41, 30));

        let result = LocalSearch::new(matcher(&pool), 0).run(
            &mut rows,
            &tiling,
            &extractor,
            &ProgressReporter::hidden(),
        );
        assert!(matches!(result, Err(MosaicError::InvalidParameter { .. })));
    }
}
