use burn::tensor::{backend::Backend, Tensor};

use super::cell::RecurrentCell;

#[derive(Clone, Debug)]
pub struct Encoding<B: Backend, S> {
    /// Per-step cell outputs, `T` tensors of `[N, H]`.
    pub outputs: Vec<Tensor<B, 2>>,
    /// State after the last input step.
    pub state: S,
}

/// Feeds the whole sequence through `cell` once, starting from its zero state.
///
/// Returns `None` for an empty sequence.
pub fn encode<B: Backend, C: RecurrentCell<B>>(
    cell: &C,
    inputs: &[Tensor<B, 2>],
) -> Option<Encoding<B, C::State>> {
    let (outputs, state) = cell.advance_sequence(inputs.to_vec(), None);

    state.map(|state| Encoding { outputs, state })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{sequence, TestBackend};
    use burn::nn::{Lstm, LstmConfig};

    #[test]
    fn test_encode_keeps_every_step() {
        let lstm: Lstm<TestBackend> = LstmConfig::new(3, 8, true).init();
        let inputs = sequence::<TestBackend>(4, 5, 3);

        let encoding = encode(&lstm, &inputs).unwrap();

        assert_eq!(encoding.outputs.len(), 5);
        assert_eq!(encoding.state.hidden.dims(), [4, 8]);
        encoding.outputs[4]
            .to_data()
            .assert_approx_eq(&encoding.state.hidden.to_data(), 5);
    }

    #[test]
    fn test_encode_empty() {
        let lstm: Lstm<TestBackend> = LstmConfig::new(3, 8, true).init();
        assert!(encode(&lstm, &[]).is_none());
    }
}
