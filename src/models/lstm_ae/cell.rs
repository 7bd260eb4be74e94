use burn::nn::Lstm;
use burn::tensor::{backend::Backend, Tensor};

use crate::utils::{last_step, stack_batch_major, unstack_time};

/// A stateful unit mapping `(input, prior state)` to `(output, new state)`.
///
/// The same cell value is applied at every step it is advanced over, so any
/// weights it holds are shared across time.
pub trait RecurrentCell<B: Backend> {
    type State: Clone;

    /// Runs one step. A `None` state starts from the cell's zero state.
    fn advance(
        &self,
        input: Tensor<B, 2>,
        state: Option<Self::State>,
    ) -> (Tensor<B, 2>, Self::State);

    /// Runs `advance` over `inputs` in order, threading the state through.
    fn advance_sequence(
        &self,
        inputs: Vec<Tensor<B, 2>>,
        state: Option<Self::State>,
    ) -> (Vec<Tensor<B, 2>>, Option<Self::State>) {
        let mut state = state;
        let mut outputs = Vec::with_capacity(inputs.len());

        for input in inputs {
            let (output, next) = self.advance(input, state);
            outputs.push(output);
            state = Some(next);
        }

        (outputs, state)
    }
}

#[derive(Clone, Debug)]
pub struct LstmState<B: Backend> {
    pub cell: Tensor<B, 2>,   // [N, H]
    pub hidden: Tensor<B, 2>, // [N, H]
}

impl<B: Backend> LstmState<B> {
    fn into_pair(self) -> (Tensor<B, 2>, Tensor<B, 2>) {
        (self.cell, self.hidden)
    }
}

impl<B: Backend> RecurrentCell<B> for Lstm<B> {
    type State = LstmState<B>;

    fn advance(
        &self,
        input: Tensor<B, 2>,
        state: Option<LstmState<B>>,
    ) -> (Tensor<B, 2>, LstmState<B>) {
        let (cell_state, hidden_state) =
            self.forward(input.unsqueeze_dim(1), state.map(LstmState::into_pair));

        let hidden: Tensor<B, 2> = hidden_state.squeeze(1);
        let cell: Tensor<B, 2> = cell_state.squeeze(1);

        (hidden.clone(), LstmState { cell, hidden })
    }

    fn advance_sequence(
        &self,
        inputs: Vec<Tensor<B, 2>>,
        state: Option<LstmState<B>>,
    ) -> (Vec<Tensor<B, 2>>, Option<LstmState<B>>) {
        if inputs.is_empty() {
            return (Vec::new(), state);
        }

        let (cell_state, hidden_state) =
            self.forward(stack_batch_major(inputs), state.map(LstmState::into_pair));

        let last = LstmState {
            cell: last_step(cell_state),
            hidden: last_step(hidden_state.clone()),
        };

        (unstack_time(hidden_state), Some(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{sequence, values, TestBackend};
    use burn::nn::LstmConfig;

    #[test]
    fn test_lstm_advance_shapes() {
        let lstm: Lstm<TestBackend> = LstmConfig::new(3, 8, true).init();
        let input = sequence::<TestBackend>(4, 1, 3).remove(0);

        let (output, state) = lstm.advance(input, None);

        assert_eq!(output.dims(), [4, 8]);
        assert_eq!(state.cell.dims(), [4, 8]);
        assert_eq!(values(output), values(state.hidden));
    }

    #[test]
    fn test_fused_sequence_matches_stepping() {
        let lstm: Lstm<TestBackend> = LstmConfig::new(3, 5, true).init();
        let inputs = sequence::<TestBackend>(2, 4, 3);

        let (fused, fused_state) = lstm.advance_sequence(inputs.clone(), None);

        let mut state = None;
        let mut stepped = Vec::new();
        for input in inputs {
            let (output, next) = lstm.advance(input, state);
            stepped.push(output);
            state = Some(next);
        }

        assert_eq!(fused.len(), 4);
        for (a, b) in fused.into_iter().zip(stepped) {
            a.to_data().assert_approx_eq(&b.to_data(), 5);
        }

        let (fused_state, state) = (fused_state.unwrap(), state.unwrap());
        fused_state
            .cell
            .to_data()
            .assert_approx_eq(&state.cell.to_data(), 5);
        fused_state
            .hidden
            .to_data()
            .assert_approx_eq(&state.hidden.to_data(), 5);
    }

    #[test]
    fn test_empty_sequence_keeps_state() {
        let lstm: Lstm<TestBackend> = LstmConfig::new(3, 5, true).init();
        let (outputs, state) = lstm.advance_sequence(Vec::new(), None);

        assert!(outputs.is_empty());
        assert!(state.is_none());
    }
}
