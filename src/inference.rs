use burn::config::Config;
use burn::module::Module;
use burn::record::{CompactRecorder, Recorder};
use burn::tensor::backend::Backend;
use burn::tensor::ElementConversion;
use tracing::info;

use crate::data::sequenceitem::SequenceItem;
use crate::error::{AutoencoderError, AutoencoderResult};
use crate::models::lstm_ae::{AutoencoderOutput, LstmAutoencoder, LstmState};
use crate::training::TrainingConfig;

/// Reloads the config and weights written by [`crate::training::train`].
pub fn load_model<B: Backend>(
    artifact_dir: &str,
    device: &B::Device,
) -> AutoencoderResult<(TrainingConfig, LstmAutoencoder<B>)> {
    let config = TrainingConfig::load(format!("{artifact_dir}/config.json"))
        .map_err(|err| AutoencoderError::Config(format!("{err:?}")))?;

    let record = CompactRecorder::new()
        .load(format!("{artifact_dir}/model").into())
        .map_err(|err| AutoencoderError::Record(format!("{err:?}")))?;

    let model = config.model.init::<B>().load_record(record).to_device(device);

    info!(artifact_dir, num_params = model.num_params(), "loaded lstm autoencoder");

    Ok((config, model))
}

pub fn reconstruct<B: Backend>(
    model: &LstmAutoencoder<B>,
    item: &SequenceItem,
    device: &B::Device,
) -> AutoencoderResult<AutoencoderOutput<B>> {
    let steps = item.to_steps(device)?;
    model.forward(&steps)
}

/// Mean squared reconstruction error of a whole item.
pub fn reconstruction_error<B: Backend>(
    model: &LstmAutoencoder<B>,
    item: &SequenceItem,
    device: &B::Device,
) -> AutoencoderResult<f32> {
    let output = reconstruct(model, item, device)?;
    Ok(output.loss.into_scalar().elem::<f32>())
}

/// Final encoder state of a whole item, the learned code for the sequence.
pub fn encode<B: Backend>(
    model: &LstmAutoencoder<B>,
    item: &SequenceItem,
    device: &B::Device,
) -> AutoencoderResult<LstmState<B>> {
    let steps = item.to_steps(device)?;
    Ok(model.encode(&steps)?.state)
}
