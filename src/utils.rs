use burn::tensor::{backend::Backend, Distribution, Tensor};

const TRUNCATION: f64 = 2.0;
const TRUNCATION_REDRAWS: usize = 8;

/// Stacks `T` tensors of `[batch, d]` into `[batch, T, d]`.
pub fn stack_batch_major<B: Backend>(steps: Vec<Tensor<B, 2>>) -> Tensor<B, 3> {
    let stacked: Tensor<B, 3> = Tensor::stack(steps, 0);
    stacked.swap_dims(0, 1)
}

/// Splits `[batch, T, d]` back into `T` tensors of `[batch, d]`.
pub fn unstack_time<B: Backend>(x: Tensor<B, 3>) -> Vec<Tensor<B, 2>> {
    let [batch, seq, dim] = x.dims();

    (0..seq)
        .map(|t| x.clone().slice([0..batch, t..t + 1, 0..dim]).squeeze(1))
        .collect()
}

pub fn last_step<B: Backend>(x: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, seq, dim] = x.dims();
    x.slice([0..batch, seq - 1..seq, 0..dim]).squeeze(1)
}

pub fn mean_squared_error<B: Backend, const D: usize>(
    y_true: Tensor<B, D>,
    y_pred: Tensor<B, D>,
) -> Tensor<B, 1> {
    let residual = y_true - y_pred;
    (residual.clone() * residual).mean()
}

/// Standard normal samples cut at two standard deviations. Values outside are
/// redrawn a few times, then clamped.
pub fn truncated_normal<B: Backend, const D: usize>(shape: [usize; D]) -> Tensor<B, D> {
    let mut x: Tensor<B, D> = Tensor::random(shape, Distribution::Normal(0.0, 1.0));

    for _ in 0..TRUNCATION_REDRAWS {
        let outside = x.clone().abs().greater_elem(TRUNCATION);
        let redraw = Tensor::random(shape, Distribution::Normal(0.0, 1.0));
        x = x.mask_where(outside, redraw);
    }

    x.clamp_min(-TRUNCATION).clamp_max(TRUNCATION)
}
