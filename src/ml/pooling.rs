// ============================================================
// Layer 5 — Pooling Strategies
// ============================================================
// Reduces a convolution output [batch, n_filters, H] to a
// fixed-width vector per channel. The strategy is a MODEL
// HYPERPARAMETER: it is parsed from its string identifier
// exactly once when the scoring head is constructed, and the
// same variant is used at train and inference time. An
// unrecognised identifier is a configuration error raised
// before any convolution or pooling math executes.
//
// The four strategies and the width each contributes per
// filter (k_eff = min(k, H), H = seq_len - filter_width + 1):
//
//   max    single max over the sequence axis     n_filters
//   avg    mean over the sequence axis           n_filters
//   k-max  top-k values, descending              k_eff * n_filters
//   mix    top-k then bottom-k (ascending)       2 * k_eff * n_filters
//
// Reference: Kalchbrenner et al. (2014) A Convolutional Neural
//            Network for Modelling Sentences (k-max pooling)

use anyhow::{bail, Result};
use burn::prelude::*;

/// The pooling strategy applied to each convolution branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pooling {
    Max,
    Avg,
    KMax,
    Mix,
}

impl Pooling {
    /// Parse the external string identifier.
    /// Fails fast on anything outside {max, avg, k-max, mix}.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "max"   => Ok(Pooling::Max),
            "avg"   => Ok(Pooling::Avg),
            "k-max" => Ok(Pooling::KMax),
            "mix"   => Ok(Pooling::Mix),
            other   => bail!("This pooling method is not supported: '{other}'"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Pooling::Max  => "max",
            Pooling::Avg  => "avg",
            Pooling::KMax => "k-max",
            Pooling::Mix  => "mix",
        }
    }

    /// The clamped k actually used for a filter with H valid
    /// window positions.
    pub fn effective_k(k: usize, valid_windows: usize) -> usize {
        k.min(valid_windows)
    }

    /// Output width this strategy contributes for ONE filter
    /// width, given its effective k.
    pub fn pooled_width(&self, k_eff: usize, n_filters: usize) -> usize {
        match self {
            Pooling::Max | Pooling::Avg => n_filters,
            Pooling::KMax               => k_eff * n_filters,
            Pooling::Mix                => 2 * k_eff * n_filters,
        }
    }

    /// Pool one convolution branch output [batch, n_filters, H]
    /// down to [batch, width] where width = pooled_width(k_eff).
    ///
    /// k_eff is ignored by max/avg. For k-max/mix the caller has
    /// already clamped it to H.
    pub fn apply<B: Backend>(&self, conved: Tensor<B, 3>, k_eff: usize) -> Tensor<B, 2> {
        let [batch_size, n_filters, _h] = conved.dims();

        match self {
            Pooling::Max => conved.max_dim(2).squeeze::<2>(2),
            Pooling::Avg => conved.mean_dim(2).squeeze::<2>(2),
            Pooling::KMax => conved
                .topk(k_eff, 2)
                .reshape([batch_size, n_filters * k_eff]),
            Pooling::Mix => {
                // top-k descending alongside bottom-k ascending,
                // flattened channel-major like the k-max case
                let top = conved
                    .clone()
                    .topk(k_eff, 2)
                    .reshape([batch_size, n_filters * k_eff]);
                let bottom = conved
                    .sort(2)
                    .slice([0..batch_size, 0..n_filters, 0..k_eff])
                    .reshape([batch_size, n_filters * k_eff]);
                Tensor::cat(vec![top, bottom], 1)
            }
        }
    }
}

impl std::fmt::Display for Pooling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    /// One batch element, one channel, H=3: values [3, 1, 2]
    fn branch() -> Tensor<TestBackend, 3> {
        Tensor::<TestBackend, 1>::from_floats([3.0, 1.0, 2.0], &Default::default())
            .reshape([1, 1, 3])
    }

    fn to_vec(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    #[test]
    fn test_parse_accepts_the_four_strategies() {
        assert_eq!(Pooling::parse("max").unwrap(),   Pooling::Max);
        assert_eq!(Pooling::parse("avg").unwrap(),   Pooling::Avg);
        assert_eq!(Pooling::parse("k-max").unwrap(), Pooling::KMax);
        assert_eq!(Pooling::parse("mix").unwrap(),   Pooling::Mix);
    }

    #[test]
    fn test_parse_rejects_unknown_identifier() {
        let err = Pooling::parse("bogus").unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_effective_k_is_clamped_to_window_count() {
        assert_eq!(Pooling::effective_k(5, 1), 1);
        assert_eq!(Pooling::effective_k(5, 2), 2);
        assert_eq!(Pooling::effective_k(2, 7), 2);
    }

    #[test]
    fn test_pooled_widths() {
        assert_eq!(Pooling::Max.pooled_width(3, 50),  50);
        assert_eq!(Pooling::Avg.pooled_width(3, 50),  50);
        assert_eq!(Pooling::KMax.pooled_width(3, 50), 150);
        assert_eq!(Pooling::Mix.pooled_width(3, 50),  300);
    }

    #[test]
    fn test_max_takes_the_maximum() {
        assert_eq!(to_vec(Pooling::Max.apply(branch(), 0)), vec![3.0]);
    }

    #[test]
    fn test_avg_takes_the_mean() {
        assert_eq!(to_vec(Pooling::Avg.apply(branch(), 0)), vec![2.0]);
    }

    #[test]
    fn test_k_max_is_descending() {
        assert_eq!(to_vec(Pooling::KMax.apply(branch(), 2)), vec![3.0, 2.0]);
    }

    #[test]
    fn test_mix_concatenates_top_and_bottom() {
        // top-1 = [3], bottom-1 = [1]
        assert_eq!(to_vec(Pooling::Mix.apply(branch(), 1)), vec![3.0, 1.0]);
        // top-2 = [3, 2], bottom-2 ascending = [1, 2]
        assert_eq!(to_vec(Pooling::Mix.apply(branch(), 2)), vec![3.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_multi_channel_flattening_is_channel_major() {
        // Two channels: [5, 4, 0] and [1, 9, 2]
        let t = Tensor::<TestBackend, 1>::from_floats(
            [5.0, 4.0, 0.0, 1.0, 9.0, 2.0],
            &Default::default(),
        )
        .reshape([1, 2, 3]);

        // k=2 → channel 0 gives [5, 4], channel 1 gives [9, 2]
        assert_eq!(
            to_vec(Pooling::KMax.apply(t, 2)),
            vec![5.0, 4.0, 9.0, 2.0]
        );
    }
}
