use burn::tensor::{backend::Backend, Tensor};

use crate::utils::{stack_batch_major, unstack_time};

#[derive(Clone, Debug)]
pub struct SequenceBatch<B: Backend> {
    pub steps: Vec<Tensor<B, 2>>, // T x [N, D]
}

impl<B: Backend> SequenceBatch<B> {
    /// Splits a `[N, T, D]` tensor into its time steps.
    pub fn from_tensor(x: Tensor<B, 3>) -> Self {
        Self {
            steps: unstack_time(x),
        }
    }

    pub fn to_tensor(&self) -> Tensor<B, 3> {
        stack_batch_major(self.steps.clone())
    }

    pub fn seq_len(&self) -> usize {
        self.steps.len()
    }

    pub fn batch_size(&self) -> usize {
        self.steps.first().map(|step| step.dims()[0]).unwrap_or(0)
    }
}
