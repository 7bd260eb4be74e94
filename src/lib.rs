//! LSTM sequence autoencoder on top of burn.

pub mod data;
pub mod error;
pub mod inference;
pub mod models;
pub mod training;
pub mod utils;

pub use error::{AutoencoderError, AutoencoderResult};
pub use models::lstm_ae::{
    autoencode, AutoencoderOutput, DecodePolicy, LstmAutoencoder, LstmAutoencoderConfig,
    LstmState, Reconstruct, RecurrentCell,
};
pub use training::{adam_trainer, ReconstructionTrainer, TrainingConfig};
