use burn::config::Config;
use burn::module::{Module, Param};
use burn::nn::{Linear, LinearConfig, Lstm, LstmConfig};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{backend::Backend, Tensor};
use burn::train::{RegressionOutput, TrainOutput, TrainStep, ValidStep};
use tracing::{debug, trace};

use crate::data::batchitem::SequenceBatch;
use crate::error::{AutoencoderError, AutoencoderResult};
use crate::utils::{mean_squared_error, stack_batch_major, truncated_normal};

use super::cell::{LstmState, RecurrentCell};
use super::decoder::{self, DecodePolicy};
use super::encoder::{self, Encoding};

/// Sequence autoencoder: an LSTM encoder compresses `T` steps into its final
/// state, an LSTM decoder unrolls that state back into `T` steps through a
/// shared linear projection.
#[derive(Module, Debug)]
pub struct LstmAutoencoder<B: Backend> {
    elem_num: usize,
    hidden_num: usize,
    reverse: bool,
    decode_without_input: bool,
    encoder_cell: Lstm<B>,
    // None when the decoder runs on the encoder's cell
    decoder_cell: Option<Lstm<B>>,
    projection: Linear<B>,
}

/// Everything a forward pass produces.
#[derive(Clone, Debug)]
pub struct AutoencoderOutput<B: Backend, S = LstmState<B>> {
    pub reconstruction: Tensor<B, 3>, // [N, T, D]
    pub target: Tensor<B, 3>,         // [N, T, D]
    pub loss: Tensor<B, 1>,           // [1]
    pub encoder_outputs: Vec<Tensor<B, 2>>,
    pub encoder_state: S,
}

/// A model scored by how well it reproduces its input sequence.
pub trait Reconstruct<B: Backend> {
    type State;

    fn reconstruct(
        &self,
        inputs: &[Tensor<B, 2>],
    ) -> AutoencoderResult<AutoencoderOutput<B, Self::State>>;
}

/// Checks that `inputs` is a non-empty run of `[N, elem_num]` steps and
/// returns that shape.
pub fn check_steps<B: Backend>(
    inputs: &[Tensor<B, 2>],
    elem_num: usize,
) -> AutoencoderResult<[usize; 2]> {
    let first = inputs.first().ok_or(AutoencoderError::EmptySequence)?;
    let expected = first.dims();

    if expected[1] != elem_num {
        return Err(AutoencoderError::FeatureMismatch {
            expected: elem_num,
            got: expected[1],
        });
    }

    for (step, input) in inputs.iter().enumerate().skip(1) {
        let got = input.dims();
        if got != expected {
            return Err(AutoencoderError::StepShapeMismatch {
                step,
                expected,
                got,
            });
        }
    }

    Ok(expected)
}

/// Encodes `inputs` with `encoder_cell`, decodes the final state with
/// `decoder_cell` through `projection` and scores the result against the
/// inputs. Pass the same cell twice to share its weights.
pub fn autoencode<B: Backend, C: RecurrentCell<B>>(
    encoder_cell: &C,
    decoder_cell: &C,
    projection: &Linear<B>,
    inputs: &[Tensor<B, 2>],
    policy: DecodePolicy,
    reverse: bool,
) -> AutoencoderResult<AutoencoderOutput<B, C::State>> {
    let [_, elem_num] = projection.weight.val().dims();
    check_steps(inputs, elem_num)?;

    let Encoding {
        outputs: encoder_outputs,
        state,
    } = encoder::encode(encoder_cell, inputs).ok_or(AutoencoderError::EmptySequence)?;

    let mut decoded = decoder::decode(
        decoder_cell,
        projection,
        state.clone(),
        &inputs[0],
        inputs.len(),
        policy,
    );

    if reverse {
        decoded.reverse();
    }

    let reconstruction = stack_batch_major(decoded);
    let target = stack_batch_major(inputs.to_vec());
    let loss = mean_squared_error(target.clone(), reconstruction.clone());

    trace!(steps = inputs.len(), ?policy, reverse, "reconstructed sequence");

    Ok(AutoencoderOutput {
        reconstruction,
        target,
        loss,
        encoder_outputs,
        encoder_state: state,
    })
}

impl<B: Backend> LstmAutoencoder<B> {
    pub fn elem_num(&self) -> usize {
        self.elem_num
    }

    pub fn hidden_num(&self) -> usize {
        self.hidden_num
    }

    pub fn reverse(&self) -> bool {
        self.reverse
    }

    pub fn policy(&self) -> DecodePolicy {
        DecodePolicy::from_flag(self.decode_without_input)
    }

    pub fn shares_cell(&self) -> bool {
        self.decoder_cell.is_none()
    }

    fn decoder_cell(&self) -> &Lstm<B> {
        self.decoder_cell.as_ref().unwrap_or(&self.encoder_cell)
    }

    pub fn check_inputs(&self, inputs: &[Tensor<B, 2>]) -> AutoencoderResult<[usize; 2]> {
        check_steps(inputs, self.elem_num)
    }

    pub fn encode(&self, inputs: &[Tensor<B, 2>]) -> AutoencoderResult<Encoding<B, LstmState<B>>> {
        self.check_inputs(inputs)?;
        encoder::encode(&self.encoder_cell, inputs).ok_or(AutoencoderError::EmptySequence)
    }

    pub fn forward(&self, inputs: &[Tensor<B, 2>]) -> AutoencoderResult<AutoencoderOutput<B>> {
        autoencode(
            &self.encoder_cell,
            self.decoder_cell(),
            &self.projection,
            inputs,
            self.policy(),
            self.reverse,
        )
    }

    pub fn forward_regression(&self, batch: SequenceBatch<B>) -> RegressionOutput<B> {
        let output = match self.forward(&batch.steps) {
            Ok(output) => output,
            Err(err) => panic!("Invalid sequence batch: {err}"),
        };

        let [batch_size, seq_len, elem_num] = output.reconstruction.dims();
        let output_pred = output
            .reconstruction
            .reshape([batch_size, seq_len * elem_num]);
        let output_targets = output.target.reshape([batch_size, seq_len * elem_num]);

        RegressionOutput::new(output.loss, output_pred, output_targets)
    }
}

impl<B: Backend> Reconstruct<B> for LstmAutoencoder<B> {
    type State = LstmState<B>;

    fn reconstruct(&self, inputs: &[Tensor<B, 2>]) -> AutoencoderResult<AutoencoderOutput<B>> {
        self.forward(inputs)
    }
}

impl<B: AutodiffBackend> TrainStep<SequenceBatch<B>, RegressionOutput<B>> for LstmAutoencoder<B> {
    fn step(&self, batch: SequenceBatch<B>) -> TrainOutput<RegressionOutput<B>> {
        let item = self.forward_regression(batch);
        TrainOutput::new(self, item.loss.backward(), item)
    }
}

impl<B: Backend> ValidStep<SequenceBatch<B>, RegressionOutput<B>> for LstmAutoencoder<B> {
    fn step(&self, batch: SequenceBatch<B>) -> RegressionOutput<B> {
        self.forward_regression(batch)
    }
}

const PROJECTION_BIAS: f32 = 0.1;

#[derive(Config, Debug)]
pub struct LstmAutoencoderConfig {
    elem_num: usize,
    hidden_num: usize,

    #[config(default = true)]
    reverse: bool,

    #[config(default = false)]
    decode_without_input: bool,

    #[config(default = false)]
    share_cell: bool,
}

impl LstmAutoencoderConfig {
    /// Config whose feature dimension is read from the first input step.
    pub fn from_inputs<B: Backend>(
        hidden_num: usize,
        inputs: &[Tensor<B, 2>],
    ) -> AutoencoderResult<Self> {
        let first = inputs.first().ok_or(AutoencoderError::EmptySequence)?;
        let [_, elem_num] = first.dims();

        let config = Self::new(elem_num, hidden_num);
        config.validate()?;

        Ok(config)
    }

    pub fn elem_num(&self) -> usize {
        self.elem_num
    }

    pub fn validate(&self) -> AutoencoderResult<()> {
        if self.elem_num == 0 {
            return Err(AutoencoderError::invalid_config("elem_num must be positive"));
        }
        if self.hidden_num == 0 {
            return Err(AutoencoderError::invalid_config("hidden_num must be positive"));
        }
        Ok(())
    }

    /// Builds the model with fresh cells: one per role, or a single shared
    /// one when `share_cell` is set.
    pub fn init<B: Backend>(&self) -> LstmAutoencoder<B> {
        let encoder_cell = self.init_cell();
        let decoder_cell = if self.share_cell {
            None
        } else {
            Some(self.init_cell())
        };

        self.assemble(encoder_cell, decoder_cell)
    }

    /// Builds the model around `cell`, used for both encoding and decoding.
    pub fn init_with_cell<B: Backend>(&self, cell: Lstm<B>) -> LstmAutoencoder<B> {
        self.assemble(cell, None)
    }

    pub fn init_with_cells<B: Backend>(
        &self,
        encoder: Lstm<B>,
        decoder: Lstm<B>,
    ) -> LstmAutoencoder<B> {
        self.assemble(encoder, Some(decoder))
    }

    fn init_cell<B: Backend>(&self) -> Lstm<B> {
        LstmConfig::new(self.elem_num, self.hidden_num, true).init()
    }

    fn init_projection<B: Backend>(&self) -> Linear<B> {
        let mut projection: Linear<B> = LinearConfig::new(self.hidden_num, self.elem_num).init();

        projection.weight = Param::from(truncated_normal([self.hidden_num, self.elem_num]));
        projection.bias = Some(Param::from(
            Tensor::ones([self.elem_num]).mul_scalar(PROJECTION_BIAS),
        ));

        projection
    }

    fn assemble<B: Backend>(
        &self,
        encoder_cell: Lstm<B>,
        decoder_cell: Option<Lstm<B>>,
    ) -> LstmAutoencoder<B> {
        let projection = self.init_projection();

        let model = LstmAutoencoder {
            elem_num: self.elem_num,
            hidden_num: self.hidden_num,
            reverse: self.reverse,
            decode_without_input: self.decode_without_input,
            encoder_cell,
            decoder_cell,
            projection,
        };

        debug!(
            elem_num = self.elem_num,
            hidden_num = self.hidden_num,
            num_params = model.num_params(),
            shared_cell = model.shares_cell(),
            policy = ?model.policy(),
            "initialised lstm autoencoder"
        );

        model
    }
}
