// ============================================================
// Layer 5 — Convolutional Scoring Heads
// ============================================================
// Three variants of the same algorithm, mapping a sequence of
// per-position feature vectors to a probability output:
//
//   SymptomHead      [batch, num_symptom, hidden_dim]
//   EncodedTextHead  [batch, seq_len, embedding_dim]
//   FusionHead       both of the above, concatenated after pooling
//
// Shared shape, per variant:
//   1. one Conv2d per filter width w, kernel (w, feature_dim) —
//      functionally a bank of 1D convolutions over the sequence
//      axis with n_filters output channels each
//   2. ReLU
//   3. pooling (see pooling.rs) — fixed at construction
//   4. concat across filter widths (and branches)
//   5. dropout on the concatenated vector
//   6. one linear projection to output_dim
//   7. sigmoid if output_dim == 1, softmax otherwise
//   8. return (probabilities, pre-projection concat vector)
//
// Weight init: Xavier-normal for every conv kernel and the
// final linear weight; constant 0.1 for every bias.
//
// Reference: Kim (2014) Convolutional Neural Networks for
//            Sentence Classification
//            Glorot & Bengio (2010) Xavier initialisation

use anyhow::{bail, Result};
use burn::{
    module::Ignored,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Dropout, DropoutConfig, Initializer, Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid, softmax},
};
use serde::{Deserialize, Serialize};

use crate::ml::pooling::Pooling;

// ─── Shared construction helpers ──────────────────────────────────────────────

/// Clamp each configured filter width to the sequence length it
/// will slide over. A kernel taller than the input has no valid
/// window position at all.
fn clamp_filter_sizes(filter_sizes: &[usize], seq_len: usize) -> Vec<usize> {
    filter_sizes
        .iter()
        .map(|&width| width.min(seq_len))
        .collect()
}

/// The per-width effective k: min(k, H) with H = seq_len - w + 1.
/// Expects already-clamped widths, so H >= 1.
fn effective_ks(clamped_widths: &[usize], seq_len: usize, k: usize) -> Vec<usize> {
    clamped_widths
        .iter()
        .map(|&width| Pooling::effective_k(k, seq_len - width + 1))
        .collect()
}

/// Preconditions common to all three variants, checked at
/// construction so misconfiguration surfaces as a clear error
/// instead of a shape mismatch deep inside the forward pass.
fn validate_common(
    feature_dim:  usize,
    n_filters:    usize,
    filter_sizes: &[usize],
    output_dim:   usize,
    dropout:      f64,
    pool:         Pooling,
    k:            usize,
) -> Result<()> {
    if feature_dim == 0 {
        bail!("feature dimension must be positive");
    }
    if n_filters == 0 {
        bail!("n_filters must be positive");
    }
    if filter_sizes.is_empty() {
        bail!("at least one filter size is required");
    }
    if filter_sizes.contains(&0) {
        bail!("filter sizes must be positive");
    }
    if output_dim == 0 {
        bail!("output_dim must be at least 1");
    }
    // The interval is half-open: dropout = 1.0 would zero every
    // activation and divide by zero in the keep-probability
    // rescale. 0.0 disables dropout and is allowed.
    if !(0.0..1.0).contains(&dropout) {
        bail!("dropout must lie in [0, 1), got {dropout}");
    }
    if matches!(pool, Pooling::KMax | Pooling::Mix) && k == 0 {
        bail!("k must be at least 1 for {pool} pooling");
    }
    Ok(())
}

/// One conv of the bank: kernel (width, feature_dim), so each
/// output channel produces one scalar per sliding window position.
/// Xavier-normal weight, constant 0.1 bias.
fn head_conv<B: Backend>(
    width:       usize,
    feature_dim: usize,
    n_filters:   usize,
    device:      &B::Device,
) -> Conv2d<B> {
    let mut conv = Conv2dConfig::new([1, n_filters], [width, feature_dim])
        .with_initializer(Initializer::XavierNormal { gain: 1.0 })
        .init(device);
    conv.bias = conv
        .bias
        .map(|bias| bias.map(|t| Tensor::full(t.dims(), 0.1, &t.device())));
    conv
}

/// The final projection: Xavier-normal weight, constant 0.1 bias.
fn head_linear<B: Backend>(d_in: usize, d_out: usize, device: &B::Device) -> Linear<B> {
    let mut linear = LinearConfig::new(d_in, d_out)
        .with_initializer(Initializer::XavierNormal { gain: 1.0 })
        .init(device);
    linear.bias = linear
        .bias
        .map(|bias| bias.map(|t| Tensor::full(t.dims(), 0.1, &t.device())));
    linear
}

/// Run one conv bank: unsqueeze a channel axis, convolve each
/// filter, ReLU, and drop the collapsed feature axis.
/// Returns one [batch, n_filters, H_i] tensor per filter width.
fn convolve_bank<B: Backend>(convs: &[Conv2d<B>], input: Tensor<B, 3>) -> Vec<Tensor<B, 3>> {
    let input = input.unsqueeze_dim::<4>(1); // [batch, 1, seq, feature_dim]
    convs
        .iter()
        .map(|conv| relu(conv.forward(input.clone())).squeeze::<3>(3))
        .collect()
}

/// Step 7: sigmoid for a scalar output, softmax over the class
/// axis otherwise.
fn to_probabilities<B: Backend>(logits: Tensor<B, 2>, output_dim: usize) -> Tensor<B, 2> {
    if output_dim == 1 {
        sigmoid(logits)
    } else {
        softmax(logits, 1)
    }
}

// ─── SymptomHead ──────────────────────────────────────────────────────────────

/// Configuration for the symptom-sequence variant.
/// Filter widths are clamped to num_symptom; k is clamped per
/// width to that width's valid window count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomHeadConfig {
    pub hidden_dim:   usize,
    pub n_filters:    usize,
    pub filter_sizes: Vec<usize>,
    pub output_dim:   usize,
    pub dropout:      f64,
    pub num_symptom:  usize,
    pub pool:         String,
    pub k:            usize,
}

impl Default for SymptomHeadConfig {
    fn default() -> Self {
        Self {
            hidden_dim:   5,
            n_filters:    50,
            filter_sizes: vec![2, 3, 4, 5, 6],
            output_dim:   1,
            dropout:      0.2,
            num_symptom:  9,
            pool:         "k-max".to_string(),
            k:            5,
        }
    }
}

impl SymptomHeadConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<SymptomHead<B>> {
        let pool = Pooling::parse(&self.pool)?;
        validate_common(
            self.hidden_dim,
            self.n_filters,
            &self.filter_sizes,
            self.output_dim,
            self.dropout,
            pool,
            self.k,
        )?;
        if self.num_symptom == 0 {
            bail!("num_symptom must be positive");
        }

        let filter_sizes = clamp_filter_sizes(&self.filter_sizes, self.num_symptom);
        let max_k        = effective_ks(&filter_sizes, self.num_symptom, self.k);

        let concat_width: usize = max_k
            .iter()
            .map(|&k_eff| pool.pooled_width(k_eff, self.n_filters))
            .sum();

        let convs = filter_sizes
            .iter()
            .map(|&width| head_conv(width, self.hidden_dim, self.n_filters, device))
            .collect();

        Ok(SymptomHead {
            convs,
            fc:           head_linear(concat_width, self.output_dim, device),
            dropout:      DropoutConfig::new(self.dropout).init(),
            pool:         Ignored(pool),
            max_k:        Ignored(max_k),
            output_dim:   self.output_dim,
            concat_width,
        })
    }
}

/// Scores a questionnaire-embedding sequence
/// [batch, num_symptom, hidden_dim].
#[derive(Module, Debug)]
pub struct SymptomHead<B: Backend> {
    convs:        Vec<Conv2d<B>>,
    fc:           Linear<B>,
    dropout:      Dropout,
    pool:         Ignored<Pooling>,
    max_k:        Ignored<Vec<usize>>,
    output_dim:   usize,
    concat_width: usize,
}

impl<B: Backend> SymptomHead<B> {
    /// Width of the pre-projection concat vector
    pub fn concat_width(&self) -> usize {
        self.concat_width
    }

    /// The per-filter effective k values actually in use
    pub fn effective_k(&self) -> &[usize] {
        &self.max_k
    }

    /// Returns (probabilities [batch, output_dim],
    ///          pre-projection concat [batch, concat_width]).
    pub fn forward(&self, symptom_output: Tensor<B, 3>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let conved = convolve_bank(&self.convs, symptom_output);

        let pooled: Vec<Tensor<B, 2>> = conved
            .into_iter()
            .zip(self.max_k.iter())
            .map(|(branch, &k_eff)| self.pool.apply(branch, k_eff))
            .collect();

        let concat = Tensor::cat(pooled, 1);
        let output = self.fc.forward(self.dropout.forward(concat.clone()));
        (to_probabilities(output, self.output_dim), concat)
    }
}

// ─── EncodedTextHead ──────────────────────────────────────────────────────────

/// Configuration for the encoder-output variant. Operates on
/// full-length hidden states, so k is used unclamped — text
/// sequences are long enough that k <= H always holds for the
/// configured filter widths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedTextHeadConfig {
    pub embedding_dim: usize,
    pub n_filters:     usize,
    pub filter_sizes:  Vec<usize>,
    pub output_dim:    usize,
    pub dropout:       f64,
    pub pool:          String,
    pub k:             usize,
}

impl Default for EncodedTextHeadConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 768,
            n_filters:     50,
            filter_sizes:  vec![2, 3, 4, 5, 6],
            output_dim:    1,
            dropout:       0.5,
            pool:          "k-max".to_string(),
            k:             5,
        }
    }
}

impl EncodedTextHeadConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<EncodedTextHead<B>> {
        let pool = Pooling::parse(&self.pool)?;
        validate_common(
            self.embedding_dim,
            self.n_filters,
            &self.filter_sizes,
            self.output_dim,
            self.dropout,
            pool,
            self.k,
        )?;

        let concat_width = self.filter_sizes.len() * pool.pooled_width(self.k, self.n_filters);

        let convs = self
            .filter_sizes
            .iter()
            .map(|&width| head_conv(width, self.embedding_dim, self.n_filters, device))
            .collect();

        Ok(EncodedTextHead {
            convs,
            fc:           head_linear(concat_width, self.output_dim, device),
            dropout:      DropoutConfig::new(self.dropout).init(),
            pool:         Ignored(pool),
            k:            self.k,
            output_dim:   self.output_dim,
            concat_width,
        })
    }
}

/// Scores transformer hidden states [batch, seq_len, embedding_dim].
#[derive(Module, Debug)]
pub struct EncodedTextHead<B: Backend> {
    convs:        Vec<Conv2d<B>>,
    fc:           Linear<B>,
    dropout:      Dropout,
    pool:         Ignored<Pooling>,
    k:            usize,
    output_dim:   usize,
    concat_width: usize,
}

impl<B: Backend> EncodedTextHead<B> {
    pub fn concat_width(&self) -> usize {
        self.concat_width
    }

    /// Returns (probabilities [batch, output_dim],
    ///          pre-projection concat [batch, concat_width]).
    pub fn forward(&self, encoded_output: Tensor<B, 3>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let conved = convolve_bank(&self.convs, encoded_output);

        let pooled: Vec<Tensor<B, 2>> = conved
            .into_iter()
            .map(|branch| self.pool.apply(branch, self.k))
            .collect();

        let concat = Tensor::cat(pooled, 1);
        let output = self.fc.forward(self.dropout.forward(concat.clone()));
        (to_probabilities(output, self.output_dim), concat)
    }
}

// ─── FusionHead ───────────────────────────────────────────────────────────────

/// Configuration for the two-input variant: an encoder-output
/// branch and a questionnaire branch, pooled separately and
/// concatenated before the projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionHeadConfig {
    pub embedding_dim: usize,
    pub hidden_dim:    usize,
    pub n_filters:     usize,
    pub filter_sizes:  Vec<usize>,
    pub output_dim:    usize,
    pub dropout:       f64,
    pub num_symptom:   usize,
    pub pool:          String,
    pub k:             usize,
}

impl Default for FusionHeadConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 768,
            hidden_dim:    5,
            n_filters:     50,
            filter_sizes:  vec![2, 3, 4, 5, 6],
            output_dim:    1,
            dropout:       0.2,
            num_symptom:   9,
            pool:          "k-max".to_string(),
            k:             5,
        }
    }
}

impl FusionHeadConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<FusionHead<B>> {
        let pool = Pooling::parse(&self.pool)?;
        validate_common(
            self.hidden_dim,
            self.n_filters,
            &self.filter_sizes,
            self.output_dim,
            self.dropout,
            pool,
            self.k,
        )?;
        if self.embedding_dim == 0 {
            bail!("embedding dimension must be positive");
        }
        if self.num_symptom == 0 {
            bail!("num_symptom must be positive");
        }

        let filter_sizes = clamp_filter_sizes(&self.filter_sizes, self.num_symptom);
        let max_k        = effective_ks(&filter_sizes, self.num_symptom, self.k);

        // Encoder branch is always max-pooled (see forward), so it
        // contributes n_filters per width no matter the strategy.
        let text_width = filter_sizes.len() * self.n_filters;
        let symptom_width: usize = max_k
            .iter()
            .map(|&k_eff| pool.pooled_width(k_eff, self.n_filters))
            .sum();
        let concat_width = text_width + symptom_width;

        let text_convs = filter_sizes
            .iter()
            .map(|&width| head_conv(width, self.embedding_dim, self.n_filters, device))
            .collect();
        let symptom_convs = filter_sizes
            .iter()
            .map(|&width| head_conv(width, self.hidden_dim, self.n_filters, device))
            .collect();

        Ok(FusionHead {
            text_convs,
            symptom_convs,
            fc:           head_linear(concat_width, self.output_dim, device),
            dropout:      DropoutConfig::new(self.dropout).init(),
            pool:         Ignored(pool),
            max_k:        Ignored(max_k),
            output_dim:   self.output_dim,
            concat_width,
        })
    }
}

/// Scores encoder hidden states and a questionnaire sequence
/// jointly. The encoder branch is unconditionally max-pooled
/// while the questionnaire branch honours the configured
/// strategy.
#[derive(Module, Debug)]
pub struct FusionHead<B: Backend> {
    text_convs:    Vec<Conv2d<B>>,
    symptom_convs: Vec<Conv2d<B>>,
    fc:            Linear<B>,
    dropout:       Dropout,
    pool:          Ignored<Pooling>,
    max_k:         Ignored<Vec<usize>>,
    output_dim:    usize,
    concat_width:  usize,
}

impl<B: Backend> FusionHead<B> {
    pub fn concat_width(&self) -> usize {
        self.concat_width
    }

    /// Returns (probabilities [batch, output_dim],
    ///          pre-projection concat [batch, concat_width]).
    pub fn forward(
        &self,
        encoded_output: Tensor<B, 3>,
        symptom_output: Tensor<B, 3>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let text_conved    = convolve_bank(&self.text_convs, encoded_output);
        let symptom_conved = convolve_bank(&self.symptom_convs, symptom_output);

        // Encoder branch: unconditional max pooling
        let text_pooled: Vec<Tensor<B, 2>> = text_conved
            .into_iter()
            .map(|branch| Pooling::Max.apply(branch, 0))
            .collect();

        // Questionnaire branch: configured strategy with clamped k
        let symptom_pooled: Vec<Tensor<B, 2>> = symptom_conved
            .into_iter()
            .zip(self.max_k.iter())
            .map(|(branch, &k_eff)| self.pool.apply(branch, k_eff))
            .collect();

        let text_concat    = Tensor::cat(text_pooled, 1);
        let symptom_concat = Tensor::cat(symptom_pooled, 1);
        let concat         = Tensor::cat(vec![text_concat, symptom_concat], 1);

        let output = self.fc.forward(self.dropout.forward(concat.clone()));
        (to_probabilities(output, self.output_dim), concat)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    fn random_input(batch: usize, seq: usize, dim: usize) -> Tensor<TestBackend, 3> {
        Tensor::random(
            [batch, seq, dim],
            Distribution::Uniform(-1.0, 1.0),
            &Default::default(),
        )
    }

    #[test]
    fn test_unknown_pool_fails_before_any_math() {
        let config = SymptomHeadConfig {
            pool: "bogus".to_string(),
            ..Default::default()
        };
        let err = config.init::<TestBackend>(&Default::default()).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_invalid_dropout_is_a_config_error() {
        let config = EncodedTextHeadConfig {
            dropout: 1.5,
            ..Default::default()
        };
        assert!(config.init::<TestBackend>(&Default::default()).is_err());
    }

    #[test]
    fn test_dropout_interval_is_half_open() {
        // 0.0 disables dropout and must construct fine
        let zero = EncodedTextHeadConfig {
            embedding_dim: 8,
            n_filters:     2,
            filter_sizes:  vec![2],
            dropout:       0.0,
            k:             1,
            ..Default::default()
        };
        assert!(zero.init::<TestBackend>(&Default::default()).is_ok());

        // 1.0 would zero every activation; rejected up front
        let one = EncodedTextHeadConfig {
            dropout: 1.0,
            ..Default::default()
        };
        let err = one.init::<TestBackend>(&Default::default()).unwrap_err();
        assert!(err.to_string().contains("[0, 1)"));
    }

    #[test]
    fn test_effective_k_clamping_scenario() {
        // filter widths (2, 3) over 3 symptoms with k=5:
        //   width 2 → H = 2 → k_eff = 2
        //   width 3 → H = 1 → k_eff = 1
        // total pooled width = (2 + 1) * n_filters
        let config = SymptomHeadConfig {
            hidden_dim:   5,
            n_filters:    4,
            filter_sizes: vec![2, 3],
            num_symptom:  3,
            pool:         "k-max".to_string(),
            k:            5,
            ..Default::default()
        };
        let head = config.init::<TestBackend>(&Default::default()).unwrap();

        assert_eq!(head.effective_k(), &[2, 1]);
        assert_eq!(head.concat_width(), (2 + 1) * 4);

        let (probs, concat) = head.forward(random_input(2, 3, 5));
        assert_eq!(probs.dims(),  [2, 1]);
        assert_eq!(concat.dims(), [2, 12]);
    }

    #[test]
    fn test_filter_sizes_clamp_to_symptom_count() {
        // widths 4, 5, 6 all clamp to 3 → every branch has H = 1
        let config = SymptomHeadConfig {
            hidden_dim:   5,
            n_filters:    2,
            filter_sizes: vec![2, 3, 4, 5, 6],
            num_symptom:  3,
            pool:         "max".to_string(),
            ..Default::default()
        };
        let head = config.init::<TestBackend>(&Default::default()).unwrap();

        // max pooling: n_filters per width regardless of k
        assert_eq!(head.concat_width(), 5 * 2);
        let (_, concat) = head.forward(random_input(1, 3, 5));
        assert_eq!(concat.dims(), [1, 10]);
    }

    #[test]
    fn test_mix_width_is_twice_k_max_width() {
        let base = SymptomHeadConfig {
            hidden_dim:   5,
            n_filters:    3,
            filter_sizes: vec![2],
            num_symptom:  4,
            k:            2,
            ..Default::default()
        };

        let kmax = SymptomHeadConfig { pool: "k-max".to_string(), ..base.clone() }
            .init::<TestBackend>(&Default::default())
            .unwrap();
        let mix = SymptomHeadConfig { pool: "mix".to_string(), ..base }
            .init::<TestBackend>(&Default::default())
            .unwrap();

        assert_eq!(mix.concat_width(), 2 * kmax.concat_width());
    }

    #[test]
    fn test_binary_output_is_a_probability() {
        let config = EncodedTextHeadConfig {
            embedding_dim: 16,
            n_filters:     4,
            filter_sizes:  vec![2, 3],
            output_dim:    1,
            k:             2,
            ..Default::default()
        };
        let head = config.init::<TestBackend>(&Default::default()).unwrap();

        let (probs, _) = head.forward(random_input(3, 10, 16));
        let values: Vec<f32> = probs.into_data().to_vec().unwrap();

        assert_eq!(values.len(), 3);
        for v in values {
            assert!(v > 0.0 && v < 1.0, "sigmoid output out of range: {v}");
        }
    }

    #[test]
    fn test_multiclass_output_sums_to_one() {
        let config = EncodedTextHeadConfig {
            embedding_dim: 16,
            n_filters:     4,
            filter_sizes:  vec![2],
            output_dim:    3,
            pool:          "avg".to_string(),
            ..Default::default()
        };
        let head = config.init::<TestBackend>(&Default::default()).unwrap();

        let (probs, _) = head.forward(random_input(2, 10, 16));
        assert_eq!(probs.dims(), [2, 3]);

        let values: Vec<f32> = probs.into_data().to_vec().unwrap();
        for row in values.chunks(3) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "softmax row sums to {sum}");
        }
    }

    #[test]
    fn test_biases_initialise_to_constant() {
        let config = EncodedTextHeadConfig {
            embedding_dim: 8,
            n_filters:     2,
            filter_sizes:  vec![2],
            k:             1,
            ..Default::default()
        };
        let head = config.init::<TestBackend>(&Default::default()).unwrap();

        let bias: Vec<f32> = head.fc.bias.as_ref().unwrap().val().into_data().to_vec().unwrap();
        assert!(bias.iter().all(|&b| (b - 0.1).abs() < 1e-6));

        let conv_bias: Vec<f32> =
            head.convs[0].bias.as_ref().unwrap().val().into_data().to_vec().unwrap();
        assert!(conv_bias.iter().all(|&b| (b - 0.1).abs() < 1e-6));
    }

    #[test]
    fn test_fusion_text_branch_is_always_max_pooled() {
        // avg pooling configured: symptom branch contributes
        // n_filters per width (avg), text branch n_filters per
        // width (forced max) → widths are equal here
        let config = FusionHeadConfig {
            embedding_dim: 16,
            hidden_dim:    5,
            n_filters:     4,
            filter_sizes:  vec![2, 3],
            num_symptom:   4,
            pool:          "avg".to_string(),
            ..Default::default()
        };
        let head = config.init::<TestBackend>(&Default::default()).unwrap();
        assert_eq!(head.concat_width(), 2 * 4 + 2 * 4);

        let (probs, concat) = head.forward(random_input(2, 10, 16), random_input(2, 4, 5));
        assert_eq!(probs.dims(),  [2, 1]);
        assert_eq!(concat.dims(), [2, 16]);
    }

    #[test]
    fn test_fusion_k_max_width() {
        // symptom branch: widths (2, 3) over 4 symptoms, k=5 →
        // k_eff = (3, 2) → (3+2)*n; text branch: 2 widths * n
        let config = FusionHeadConfig {
            embedding_dim: 16,
            hidden_dim:    5,
            n_filters:     4,
            filter_sizes:  vec![2, 3],
            num_symptom:   4,
            pool:          "k-max".to_string(),
            k:             5,
            ..Default::default()
        };
        let head = config.init::<TestBackend>(&Default::default()).unwrap();
        assert_eq!(head.concat_width(), 2 * 4 + (3 + 2) * 4);
    }
}
