use burn::nn::Linear;
use burn::tensor::{backend::Backend, Tensor};

use super::cell::RecurrentCell;

/// What the decoder cell is fed at each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Every step consumes a zero tensor; inputs never depend on outputs.
    ZeroInput,
    /// Step 0 consumes zeros, step `i > 0` consumes the projected output of step `i - 1`.
    Autoregressive,
}

impl DecodePolicy {
    pub fn from_flag(decode_without_input: bool) -> Self {
        if decode_without_input {
            DecodePolicy::ZeroInput
        } else {
            DecodePolicy::Autoregressive
        }
    }
}

/// Unrolls `cell` for `steps` steps from `state` and projects every raw output
/// through `projection`.
///
/// `template` fixes the `[N, D]` shape (and device) of the zero inputs. The
/// returned outputs are in decoder step order.
pub fn decode<B: Backend, C: RecurrentCell<B>>(
    cell: &C,
    projection: &Linear<B>,
    state: C::State,
    template: &Tensor<B, 2>,
    steps: usize,
    policy: DecodePolicy,
) -> Vec<Tensor<B, 2>> {
    match policy {
        DecodePolicy::ZeroInput => {
            let inputs = (0..steps).map(|_| template.zeros_like()).collect();
            let (outputs, _) = cell.advance_sequence(inputs, Some(state));

            outputs
                .into_iter()
                .map(|output| projection.forward(output))
                .collect()
        }
        DecodePolicy::Autoregressive => {
            let mut outputs = Vec::with_capacity(steps);
            let mut input = template.zeros_like();
            let mut state = state;

            for _ in 0..steps {
                let (output, next) = cell.advance(input, Some(state));
                let projected = projection.forward(output);

                outputs.push(projected.clone());
                input = projected;
                state = next;
            }

            outputs
        }
    }
}
