//! Tests for pruned scoring and pool searches

#[cfg(test)]
mod tests {
    use photomosaic::analysis::features::FEATURE_LEN;
    use photomosaic::analysis::matcher::score;
    use photomosaic::analysis::{
        Candidate, ChannelWeights, FeatureVector, Match, Matcher, Orientation, Pool,
    };
    use photomosaic::math::color::ColorSpace;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_vector(rng: &mut StdRng) -> FeatureVector {
        let mut values = [0u8; FEATURE_LEN];
        rng.fill(&mut values);
        FeatureVector::from_values(values)
    }

    fn uniform_pool(colors: &[[u8; 3]]) -> Pool {
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

    /// Exhaustive reference search without pruning
    fn naive_best(pool: &Pool, query: &FeatureVector, weights: &ChannelWeights) -> Option<Match> {
        let mut best: Option<Match> = None;
        for candidate in pool.candidates() {
            for orientation in candidate.orientations().allowed_variants() {
                let total = score(
                    query,
                    candidate.features(),
                    orientation,
                    weights,
                    f32::INFINITY,
                )
                .expect("Failed to score without bound");
                if best.is_none_or(|m| total < m.score) {
                    best = Some(Match {
                        candidate: candidate.index(),
                        orientation,
                        score: total,
                    });
                }
            }
        }
        best
    }

    // Tests the weighted squared distance of uniform vectors
    // Verified by dropping the channel weight from the sum
    #[test]
    fn test_score_uniform() {
        let weights = ChannelWeights::new([1.0, 2.0, 0.0]).expect("Failed to build weights");
        let a = FeatureVector::uniform([10, 10, 10]);
        let b = FeatureVector::uniform([13, 14, 200]);

        let total = score(&a, &b, Orientation::IDENTITY, &weights, f32::INFINITY);
        assert_eq!(total, Some(25.0 * (9.0 + 2.0 * 16.0)));
    }

    // Tests the early exit once the bound is reached
    // Verified by comparing with a strict greater-than
    #[test]
    fn test_score_bound() {
        let weights = ChannelWeights::default();
        let a = FeatureVector::uniform([0, 0, 0]);
        let b = FeatureVector::uniform([1, 0, 0]);

        assert_eq!(score(&a, &b, Orientation::IDENTITY, &weights, 26.0), Some(25.0));
        assert_eq!(score(&a, &b, Orientation::IDENTITY, &weights, 25.0), None);
        assert_eq!(score(&a, &a, Orientation::IDENTITY, &weights, 0.0), None);
    }

    // Tests orientations compare against the flipped grid
    // Verified by ignoring the orientation when scoring
    #[test]
    fn test_score_flipped() {
        let mut values = [0u8; FEATURE_LEN];
        if let Some(first) = values.get_mut(0) {
            *first = 100;
        }
        let tile = FeatureVector::from_values(values);
        let mut flipped = [0u8; FEATURE_LEN];
        if let Some(corner) = flipped.get_mut(4) {
            *corner = 100;
        }
        let query = FeatureVector::from_values(flipped);
        let weights = ChannelWeights::default();

        let horizontal = Orientation::new(true, false);
        assert_eq!(
            score(&query, &tile, horizontal, &weights, f32::INFINITY),
            Some(0.0)
        );
        assert_eq!(
            score(&query, &tile, Orientation::IDENTITY, &weights, f32::INFINITY),
            Some(20000.0)
        );
    }

    // Tests weights must be finite and non-negative
    // Verified by accepting negative weights
    #[test]
    fn test_weights_validation() {
        assert!(ChannelWeights::new([1.0, -0.5, 1.0]).is_err());
        assert!(ChannelWeights::new([1.0, f32::NAN, 1.0]).is_err());
        assert!(ChannelWeights::new([0.0, 0.0, 3.0]).is_ok());
    }

    // Tests pruned search agrees with exhaustive search
    // Verified by passing a stale bound to the scorer
    #[test]
    fn test_best_matches_naive() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = Pool::new();
        for n in 0..40 {
            let vector = random_vector(&mut rng);
            pool.push(Candidate::new(format!("{n}"), 0, &vector, ColorSpace::Rgb));
        }
        let weights = ChannelWeights::new([1.0, 0.5, 2.0]).expect("Failed to build weights");
        let matcher = Matcher::new(&pool, weights, Orientation::BOTH);

        for _ in 0..20 {
            let query = random_vector(&mut rng);
            let pruned = matcher.best(&query, &[], |_| true);
            let naive = naive_best(&pool, &query, &weights);
            assert_eq!(pruned, naive);
        }
    }

    // Tests exclusion lists and predicates are honored
    // Verified by checking admissibility before any improvement
    #[test]
    fn test_best_respects_exclusions() {
        let pool = uniform_pool(&[[10, 10, 10], [20, 20, 20], [30, 30, 30]]);
        let matcher = Matcher::new(&pool, ChannelWeights::default(), Orientation::IDENTITY);
        let query = FeatureVector::uniform([11, 11, 11]);

        assert_eq!(matcher.best(&query, &[], |_| true).map(|m| m.candidate), Some(0));
        assert_eq!(matcher.best(&query, &[0], |_| true).map(|m| m.candidate), Some(1));
        assert_eq!(
            matcher
                .best(&query, &[0], |c| c.index() != 1)
                .map(|m| m.candidate),
            Some(2)
        );
        assert!(matcher.best(&query, &[0, 1, 2], |_| true).is_none());
    }

    // Tests ties keep the earliest candidate
    // Verified by replacing the best on equal scores
    #[test]
    fn test_best_tie_keeps_first() {
        let pool = uniform_pool(&[[50, 50, 50], [50, 50, 50]]);
        let matcher = Matcher::new(&pool, ChannelWeights::default(), Orientation::BOTH);
        let best = matcher
            .best(&FeatureVector::uniform([0, 0, 0]), &[], |_| true)
            .expect("Failed to find match");

        assert_eq!(best.candidate, 0);
        assert_eq!(best.orientation, Orientation::IDENTITY);
    }

    // Tests per-candidate orientation masks limit the search
    // Verified by ignoring the candidate mask
    #[test]
    fn test_candidate_mask_limits_flips() {
        let mut values = [0u8; FEATURE_LEN];
        if let Some(first) = values.get_mut(0) {
            *first = 255;
        }
        let mut pool = Pool::new();
        pool.push(
            Candidate::new("corner", 0, &FeatureVector::from_values(values), ColorSpace::Rgb)
                .with_orientations(Orientation::IDENTITY),
        );
        let mut flipped = [0u8; FEATURE_LEN];
        if let Some(corner) = flipped.get_mut(24) {
            *corner = 255;
        }

        let matcher = Matcher::new(&pool, ChannelWeights::default(), Orientation::BOTH);
        let best = matcher
            .best(&FeatureVector::from_values(flipped), &[], |_| true)
            .expect("Failed to find match");
        assert_eq!(best.orientation, Orientation::IDENTITY);
        assert!(best.score > 0.0);
    }

    // Tests best_k returns the k smallest scores in order
    // Verified by truncating before inserting the new match
    #[test]
    fn test_best_k_ranking() {
        let pool = uniform_pool(&[[40, 40, 40], [0, 0, 0], [20, 20, 20], [10, 10, 10]]);
        let matcher = Matcher::new(&pool, ChannelWeights::default(), Orientation::IDENTITY);
        let query = FeatureVector::uniform([0, 0, 0]);

        let top: Vec<usize> = matcher
            .best_k(&query, 3)
            .iter()
            .map(|m| m.candidate)
            .collect();
        assert_eq!(top, vec![1, 3, 2]);

        assert!(matcher.best_k(&query, 0).is_empty());
        assert_eq!(matcher.best_k(&query, 10).len(), 4);
        assert_eq!(matcher.orientation_multiplier(), 1);
    }

    // Tests best_k enumerates every orientation when asked for all
    // Verified by scoring only the identity orientation
    #[test]
    fn test_best_k_all_orientations() {
        let pool = uniform_pool(&[[1, 2, 3], [4, 5, 6]]);
        let matcher = Matcher::new(&pool, ChannelWeights::default(), Orientation::BOTH);
        let k = pool.len() * matcher.orientation_multiplier();
        let ranked = matcher.best_k(&FeatureVector::uniform([0, 0, 0]), k);

        assert_eq!(ranked.len(), 8);
        assert!(ranked.windows(2).all(|pair| match pair {
            [a, b] => a.score <= b.score,
            _ => true,
        }));
    }
}
