use crate::model::structures::component::Metric;
use serde::{Deserialize, Serialize};

/// Observed values of one metric across the comparison population, sorted ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDistribution {
    pub metric: Metric,
    pub higher_is_better: bool,
    values: Vec<f64>
}

impl ReferenceDistribution {
    /// Sorts `values` ascending and drops non-finite entries.
    pub fn from_unsorted(metric: Metric, mut values: Vec<f64>) -> ReferenceDistribution {
        values.retain(|v| v.is_finite());
        values.sort_by(|a, b| a.total_cmp(b));

        ReferenceDistribution {
            metric,
            higher_is_better: metric.higher_is_better(),
            values
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::structures::{component::Metric, reference_distribution::ReferenceDistribution};

    #[test]
    fn test_sorted_ascending_and_tagged() {
        let dist = ReferenceDistribution::from_unsorted(Metric::Fip, vec![4.1, f64::NAN, 2.9, 3.5]);

        assert_eq!(dist.values(), &[2.9, 3.5, 4.1]);
        assert!(!dist.higher_is_better);
        assert_eq!(dist.min(), Some(2.9));
        assert_eq!(dist.max(), Some(4.1));
    }
}
