pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("rating must be between 0 and 5, got {0}")]
    OutOfRange(f64),
}

/// Folds one more review into a running average:
/// `(average * count + rating) / (count + 1)`.
pub fn fold_rating(average: f64, count: i32, rating: f64) -> Result<(f64, i32), RatingError> {
    if !(0.0..=MAX_RATING).contains(&rating) {
        return Err(RatingError::OutOfRange(rating));
    }
    let count = count.max(0);
    let total = average * f64::from(count) + rating;
    let count = count + 1;
    Ok((total / f64::from(count), count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_review_sets_average() {
        assert_eq!(fold_rating(0.0, 0, 4.0), Ok((4.0, 1)));
    }

    #[test]
    fn running_average() {
        let (avg, n) = fold_rating(4.0, 1, 5.0).unwrap();
        assert_eq!(n, 2);
        assert!((avg - 4.5).abs() < f64::EPSILON);

        let (avg, n) = fold_rating(avg, n, 3.0).unwrap();
        assert_eq!(n, 3);
        assert!((avg - 4.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(fold_rating(3.0, 2, 5.5).is_err());
        assert!(fold_rating(3.0, 2, -1.0).is_err());
        assert!(fold_rating(3.0, 2, f64::NAN).is_err());
    }
}
