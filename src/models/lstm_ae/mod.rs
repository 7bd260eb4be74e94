pub mod cell;
pub mod decoder;
pub mod encoder;
pub mod model;

pub use cell::{LstmState, RecurrentCell};
pub use decoder::DecodePolicy;
pub use encoder::Encoding;
pub use model::{
    autoencode, check_steps, AutoencoderOutput, LstmAutoencoder, LstmAutoencoderConfig, Reconstruct,
};
