// Rating Aggregator - running per-dimension means over a review collection
//
// Insert is an incremental weighted update; delete is always a full recompute
// from the remaining reviews so the stored aggregate never drifts from them.

/// A review contributing to a rating aggregate.
pub trait RatedReview {
    /// One value per dimension, in the aggregate's dimension order.
    /// `None` marks an omitted dimension.
    fn rating_values(&self) -> Vec<Option<f64>>;
}

/// Per-dimension running means plus the review count, embedded in the owning document.
pub trait RatingAggregate {
    /// Current means, one per dimension.
    fn means(&self) -> Vec<f64>;

    fn total_reviews(&self) -> u64;

    /// Store new (already rounded) means and count. Derived scalars are refreshed here.
    fn apply(&mut self, means: &[f64], total_reviews: u64);
}

/// Round to two decimal places, the precision every stored mean is kept at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Floor of the mean of the given dimension means; 0 for an empty slice.
pub fn floor_of_mean(means: &[f64]) -> u32 {
    if means.is_empty() {
        return 0;
    }
    let mean = means.iter().sum::<f64>() / means.len() as f64;
    mean.floor().max(0.0) as u32
}

/// Fold one new review into the aggregate:
/// `new_mean = (old_mean * old_count + value) / (old_count + 1)`.
///
/// An omitted dimension contributes 0 to the numerator but still counts in the
/// denominator, so it pulls that dimension's mean toward zero. This matches the
/// stored data produced so far and is a known precision quirk.
pub fn on_insert<A, R>(aggregate: &mut A, review: &R)
where
    A: RatingAggregate + ?Sized,
    R: RatedReview + ?Sized,
{
    let old_count = aggregate.total_reviews();
    let values = review.rating_values();
    let new_count = old_count + 1;

    let means: Vec<f64> = aggregate
        .means()
        .iter()
        .enumerate()
        .map(|(i, old_mean)| {
            let value = values.get(i).copied().flatten().unwrap_or(0.0);
            round2((old_mean * old_count as f64 + value) / new_count as f64)
        })
        .collect();

    aggregate.apply(&means, new_count);
}

/// Recompute the aggregate from scratch over the remaining reviews.
/// An empty collection resets every dimension to zero.
pub fn on_delete<A, R>(aggregate: &mut A, remaining: &[R])
where
    A: RatingAggregate + ?Sized,
    R: RatedReview,
{
    let dimensions = aggregate.means().len();

    if remaining.is_empty() {
        aggregate.apply(&vec![0.0; dimensions], 0);
        return;
    }

    let mut sums = vec![0.0; dimensions];
    for review in remaining {
        let values = review.rating_values();
        for (i, sum) in sums.iter_mut().enumerate() {
            *sum += values.get(i).copied().flatten().unwrap_or(0.0);
        }
    }

    let count = remaining.len() as f64;
    let means: Vec<f64> = sums.into_iter().map(|sum| round2(sum / count)).collect();
    aggregate.apply(&means, remaining.len() as u64);
}
