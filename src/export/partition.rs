//! Train/validation split of the image list.

use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
}

impl<T> Partition<T> {
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.val.is_empty()
    }
}

/// Number of items that go to the training split: `floor(n * fraction)`.
pub fn train_count(n: usize, train_fraction: f64) -> usize {
    ((n as f64) * train_fraction.clamp(0.0, 1.0)).floor() as usize
}

/// Shuffle `items` with `rng` and split off the first `floor(n * fraction)`
/// as training data.
pub fn partition_with<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    train_fraction: f64,
    rng: &mut R,
) -> Partition<T> {
    items.shuffle(rng);
    let val = items.split_off(train_count(items.len(), train_fraction));
    Partition { train: items, val }
}

/// Unseeded shuffle split.
pub fn partition<T>(items: Vec<T>, train_fraction: f64) -> Partition<T> {
    let mut rng = rand::thread_rng();
    partition_with(items, train_fraction, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_count_floors() {
        assert_eq!(train_count(10, 0.8), 8);
        assert_eq!(train_count(7, 0.5), 3);
        assert_eq!(train_count(3, 0.0), 0);
        assert_eq!(train_count(3, 1.0), 3);
    }
}
