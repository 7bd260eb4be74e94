use std::marker::PhantomData;

use burn::config::Config;
use burn::data::dataloader::DataLoaderBuilder;
use burn::data::dataset::{Dataset, InMemDataset};
use burn::module::{AutodiffModule, Module};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::record::CompactRecorder;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use burn::train::metric::LossMetric;
use burn::train::LearnerBuilder;
use tracing::{debug, info, warn};

use crate::data::sequenceitem::{SequenceBatcher, SequenceItem};
use crate::error::{AutoencoderError, AutoencoderResult};
use crate::models::lstm_ae::{LstmAutoencoder, LstmAutoencoderConfig, Reconstruct};

#[derive(Config)]
pub struct TrainingConfig {
    pub model: LstmAutoencoderConfig,
    pub optimizer: AdamConfig,
    pub seq_len: usize,

    #[config(default = 50)]
    pub num_epochs: usize,

    #[config(default = 32)]
    pub batch_size: usize,

    #[config(default = 1)]
    pub num_workers: usize,

    #[config(default = 42)]
    pub seed: u64,

    #[config(default = 1.0e-3)]
    pub learning_rate: f64,
}

impl TrainingConfig {
    pub fn validate(&self) -> AutoencoderResult<()> {
        self.model.validate()?;

        if self.seq_len == 0 {
            return Err(AutoencoderError::invalid_config("seq_len must be positive"));
        }
        if self.batch_size == 0 {
            return Err(AutoencoderError::invalid_config("batch_size must be positive"));
        }
        Ok(())
    }
}

/// Owns a model and its optimizer and applies one minimisation step of the
/// reconstruction loss per call.
pub struct ReconstructionTrainer<B: AutodiffBackend, O, M = LstmAutoencoder<B>> {
    model: M,
    optim: O,
    learning_rate: f64,
    steps: usize,
    backend: PhantomData<B>,
}

impl<B, O, M> ReconstructionTrainer<B, O, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Reconstruct<B>,
    O: Optimizer<M, B>,
{
    pub fn new(model: M, optim: O, learning_rate: f64) -> Self {
        Self {
            model,
            optim,
            learning_rate,
            steps: 0,
            backend: PhantomData,
        }
    }

    /// Updates every learned parameter (both cells and the projection) and
    /// returns the loss measured before the update.
    pub fn step(&mut self, inputs: &[Tensor<B, 2>]) -> AutoencoderResult<f32> {
        let loss = self.model.reconstruct(inputs)?.loss;
        let value = loss.clone().into_scalar().elem::<f32>();

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self
            .optim
            .step(self.learning_rate, self.model.clone(), grads);
        self.steps += 1;

        debug!(step = self.steps, loss = value, "reconstruction step");

        Ok(value)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// Trainer using Adam with burn's default moments.
pub fn adam_trainer<B, M>(
    model: M,
    learning_rate: f64,
) -> ReconstructionTrainer<B, impl Optimizer<M, B>, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Reconstruct<B>,
{
    let optim = AdamConfig::new().init::<B, M>();
    ReconstructionTrainer::new(model, optim, learning_rate)
}

/// Keeps the items that yield a full `seq_len` window of `elem_num` features,
/// so the batcher never sees a batch it has to empty.
fn usable_items(
    dataset: InMemDataset<SequenceItem>,
    split: &'static str,
    seq_len: usize,
    elem_num: usize,
) -> AutoencoderResult<InMemDataset<SequenceItem>> {
    let total = dataset.len();
    let items: Vec<SequenceItem> = dataset
        .iter()
        .filter(|item| match item.check(seq_len) {
            Ok(width) if width == elem_num => true,
            Ok(width) => {
                warn!(split, item_id = %item.item_id, width, elem_num, "dropping sequence item");
                false
            }
            Err(err) => {
                warn!(split, item_id = %item.item_id, %err, "dropping sequence item");
                false
            }
        })
        .collect();

    if items.is_empty() {
        return Err(AutoencoderError::EmptyDataset(split));
    }
    if items.len() < total {
        info!(split, kept = items.len(), total, "filtered sequence items");
    }

    Ok(InMemDataset::new(items))
}

pub fn train<B: AutodiffBackend>(
    artifact_dir: &str,
    config: TrainingConfig,
    device: B::Device,
    train_set: InMemDataset<SequenceItem>,
    valid_set: InMemDataset<SequenceItem>,
) -> AutoencoderResult<LstmAutoencoder<B>> {
    config.validate()?;

    let elem_num = config.model.elem_num();
    let train_set = usable_items(train_set, "train", config.seq_len, elem_num)?;
    let valid_set = usable_items(valid_set, "valid", config.seq_len, elem_num)?;

    std::fs::create_dir_all(artifact_dir)?;
    config.save(format!("{artifact_dir}/config.json"))?;

    B::seed(config.seed);

    let batcher_train = SequenceBatcher::<B>::new(device.clone(), config.seq_len, config.seed);
    let batcher_valid =
        SequenceBatcher::<B::InnerBackend>::new(device.clone(), config.seq_len, config.seed);

    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(train_set);

    let dataloader_valid = DataLoaderBuilder::new(batcher_valid)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(valid_set);

    let learner = LearnerBuilder::new(artifact_dir)
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .with_file_checkpointer(CompactRecorder::new())
        .devices(vec![device])
        .num_epochs(config.num_epochs)
        .build(
            config.model.init::<B>(),
            config.optimizer.init(),
            config.learning_rate,
        );

    info!(
        artifact_dir,
        num_epochs = config.num_epochs,
        batch_size = config.batch_size,
        seq_len = config.seq_len,
        "training lstm autoencoder"
    );

    let model_trained = learner.fit(dataloader_train, dataloader_valid);

    model_trained
        .clone()
        .save_file(format!("{artifact_dir}/model"), &CompactRecorder::new())
        .map_err(|err| AutoencoderError::Record(format!("{err:?}")))?;

    info!(artifact_dir, "saved trained model");

    Ok(model_trained)
}
