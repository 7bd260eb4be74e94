use burn::backend::{Autodiff, NdArray};
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::{Data, ElementConversion, Shape, Tensor};

use lstm_autoencoder::{adam_trainer, LstmAutoencoder, LstmAutoencoderConfig};

type TrainBackend = Autodiff<NdArray>;

const BATCH_NUM: usize = 4;
const ELEM_NUM: usize = 3;
const SEQ_LEN: usize = 5;
const HIDDEN_NUM: usize = 8;

/// Near-constant sequence: every value sits close to 0.5.
fn synthetic_batch<B: Backend>() -> Vec<Tensor<B, 2>> {
    (0..SEQ_LEN)
        .map(|t| {
            let values = (0..BATCH_NUM * ELEM_NUM)
                .map(|i| 0.5 + 0.01 * ((t + i) % 3) as f32)
                .collect();
            let data = Data::new(values, Shape::new([BATCH_NUM, ELEM_NUM]));
            Tensor::from_data(data.convert())
        })
        .collect()
}

#[test]
fn test_loss_is_non_negative_scalar() {
    let inputs = synthetic_batch::<NdArray>();
    let model: LstmAutoencoder<NdArray> = LstmAutoencoderConfig::from_inputs(HIDDEN_NUM, &inputs)
        .unwrap()
        .init();

    let output = model.forward(&inputs).unwrap();

    assert_eq!(output.reconstruction.dims(), [BATCH_NUM, SEQ_LEN, ELEM_NUM]);
    assert_eq!(output.loss.dims(), [1]);
    assert!(output.loss.into_scalar().elem::<f32>() >= 0.0);
}

#[test]
fn test_adam_steps_reduce_reconstruction_loss() {
    TrainBackend::seed(42);

    let inputs = synthetic_batch::<TrainBackend>();
    let config = LstmAutoencoderConfig::from_inputs(HIDDEN_NUM, &inputs)
        .unwrap()
        .with_reverse(true)
        .with_decode_without_input(false);
    let model: LstmAutoencoder<TrainBackend> = config.init();
    let num_params = model.num_params();

    let mut trainer = adam_trainer(model, 1.0e-2);
    let losses: Vec<f32> = (0..50).map(|_| trainer.step(&inputs).unwrap()).collect();

    assert!(losses.iter().all(|loss| *loss >= 0.0));

    let first: f32 = losses[..10].iter().sum::<f32>() / 10.0;
    let last: f32 = losses[40..].iter().sum::<f32>() / 10.0;
    assert!(last < first, "loss did not decrease: {first} -> {last}");

    assert_eq!(trainer.steps(), 50);
    assert_eq!(trainer.model().num_params(), num_params);
}
