// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `prepare`, and
// `evaluate`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

/// The three top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the symptom scoring model on a JSON corpus
    Train(TrainArgs),

    /// Tokenize the corpus and write feature caches, no training
    Prepare(PrepareArgs),

    /// Score a trained checkpoint on one dataset split
    Evaluate(EvalArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing the raw {task}_{fold}_{split}.json files
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory for tokenized feature caches (defaults to data dir)
    #[arg(long)]
    pub cache_dir: Option<String>,

    /// Path to the HuggingFace tokenizer.json file
    #[arg(long, default_value = "data/tokenizer.json")]
    pub tokenizer_path: String,

    /// Directory to save model checkpoints and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Task name, the first component of raw data file names
    #[arg(long, default_value = "depression")]
    pub task_name: String,

    /// Cross-validation fold number
    #[arg(long, default_value_t = 0)]
    pub fold: usize,

    /// Number of classes; labels must be "0" .. "num_labels - 1"
    #[arg(long, default_value_t = 2)]
    pub num_labels: usize,

    /// Maximum number of tokens per input sequence
    /// Shorter posts are padded, longer ones truncated
    #[arg(long, default_value_t = 512)]
    pub max_seq_len: usize,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// How fast the model learns — too high causes instability,
    /// too low causes slow convergence
    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    /// Total number of unique tokens the model can recognise
    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,

    /// Hidden dimension of the transformer (d_model in the paper)
    /// Every token is represented as a vector of this size
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// Number of attention heads in multi-head attention
    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Number of stacked encoder layers
    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    /// Typically 4x d_model
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    /// Dropout probability inside the encoder
    #[arg(long, default_value_t = 0.1)]
    pub encoder_dropout: f64,

    /// Number of convolutional filters per window width
    #[arg(long, default_value_t = 50)]
    pub n_filters: usize,

    /// Comma-separated convolution window widths, e.g. 2,3,4,5,6
    #[arg(long, value_delimiter = ',', default_value = "2,3,4,5,6")]
    pub filter_sizes: Vec<usize>,

    /// Output dimension: 1 → sigmoid, >1 → softmax over classes
    #[arg(long, default_value_t = 1)]
    pub output_dim: usize,

    /// Dropout probability in the scoring head
    #[arg(long, default_value_t = 0.5)]
    pub head_dropout: f64,

    /// Pooling strategy: max, avg, k-max, or mix
    #[arg(long, default_value = "k-max")]
    pub pool: String,

    /// The k for k-max and mix pooling (clamped per window width)
    #[arg(long, default_value_t = 5)]
    pub k: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:        a.data_dir,
            cache_dir:       a.cache_dir,
            tokenizer_path:  a.tokenizer_path,
            checkpoint_dir:  a.checkpoint_dir,
            task_name:       a.task_name,
            fold:            a.fold,
            num_labels:      a.num_labels,
            max_seq_len:     a.max_seq_len,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            lr:              a.lr,
            vocab_size:      a.vocab_size,
            d_model:         a.d_model,
            num_heads:       a.num_heads,
            num_layers:      a.num_layers,
            d_ff:            a.d_ff,
            encoder_dropout: a.encoder_dropout,
            n_filters:       a.n_filters,
            filter_sizes:    a.filter_sizes,
            output_dim:      a.output_dim,
            head_dropout:    a.head_dropout,
            pool:            a.pool,
            k:               a.k,
        }
    }
}

/// All arguments for the `prepare` command.
/// Reuses the training flags so the cache fingerprint matches
/// what a subsequent `train` run will look for.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Which splits to cache (comma-separated: train,valid,test)
    #[arg(long, value_delimiter = ',', default_value = "train,valid")]
    pub modes: Vec<String>,

    #[command(flatten)]
    pub train: TrainArgs,
}

/// All arguments for the `evaluate` command.
/// The model architecture and data locations come from the
/// train_config.json saved next to the checkpoint, so only the
/// checkpoint directory and the split are configurable here.
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Which split to score (train, valid, or test)
    #[arg(long, default_value = "valid")]
    pub split: String,
}
