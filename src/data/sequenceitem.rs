use std::path::Path;
use std::sync::{Mutex, PoisonError};

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::InMemDataset;
use burn::tensor::backend::Backend;
use burn::tensor::{Data, Shape, Tensor};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::batchitem::SequenceBatch;
use crate::error::{AutoencoderError, AutoencoderResult};
use crate::utils::unstack_time;

/// One multivariate series, stored time-major: `values[t]` holds the
/// features observed at step `t`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SequenceItem {
    pub item_id: String,
    pub values: Vec<Vec<f32>>,
}

impl SequenceItem {
    pub fn new(item_id: impl Into<String>, values: Vec<Vec<f32>>) -> Self {
        Self {
            item_id: item_id.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Verifies the item holds at least `seq_len` steps of equal width and
    /// returns that width.
    pub fn check(&self, seq_len: usize) -> AutoencoderResult<usize> {
        if self.len() < seq_len.max(1) {
            return Err(AutoencoderError::ShortSequence {
                item_id: self.item_id.clone(),
                len: self.len(),
                required: seq_len.max(1),
            });
        }

        let elem_num = self.values[0].len();
        if let Some(row) = self.values.iter().find(|row| row.len() != elem_num) {
            return Err(AutoencoderError::FeatureMismatch {
                expected: elem_num,
                got: row.len(),
            });
        }

        Ok(elem_num)
    }

    /// `[1, seq_len, D]` slice of the series starting at `pivot`.
    fn window<B: Backend>(&self, pivot: usize, seq_len: usize, elem_num: usize) -> Tensor<B, 3> {
        let data = Data::new(
            self.values[pivot..pivot + seq_len]
                .iter()
                .flatten()
                .copied()
                .collect(),
            Shape::new([1, seq_len, elem_num]),
        );

        Tensor::from_data(data.convert())
    }

    /// The full series as `T` steps of `[1, D]`.
    pub fn to_steps<B: Backend>(
        &self,
        device: &B::Device,
    ) -> AutoencoderResult<Vec<Tensor<B, 2>>> {
        let elem_num = self.check(1)?;
        let x: Tensor<B, 3> = self.window(0, self.len(), elem_num);

        Ok(unstack_time(x.to_device(device)))
    }
}

pub fn load_from_file<P: AsRef<Path>>(
    filename: P,
) -> Result<InMemDataset<SequenceItem>, std::io::Error> {
    InMemDataset::from_json_rows(filename)
}

/// Cuts a random window of `seq_len` steps out of every item.
pub struct SequenceBatcher<B: Backend> {
    device: B::Device,
    seq_len: usize,
    rng: Mutex<StdRng>,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device, seq_len: usize, seed: u64) -> Self {
        Self {
            device,
            seq_len,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }
}

impl<B: Backend> Batcher<SequenceItem, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<SequenceItem>) -> SequenceBatch<B> {
        let mut elem_num: Option<usize> = None;

        // Items that cannot yield a window, or disagree with the batch's
        // feature width, are dropped.
        let items: Vec<(SequenceItem, usize)> = items
            .into_iter()
            .filter_map(|item| match item.check(self.seq_len) {
                Ok(width) => {
                    let expected = *elem_num.get_or_insert(width);
                    if width == expected {
                        Some((item, width))
                    } else {
                        warn!(item_id = %item.item_id, width, expected, "dropping sequence item");
                        None
                    }
                }
                Err(err) => {
                    warn!(item_id = %item.item_id, %err, "dropping sequence item");
                    None
                }
            })
            .collect();

        if items.is_empty() {
            return SequenceBatch { steps: Vec::new() };
        }

        let pivots: Vec<usize> = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

            items
                .iter()
                .map(|(item, _)| rng.gen_range(0..=(item.len() - self.seq_len)))
                .collect()
        };

        let windows: Vec<Tensor<B, 3>> = items
            .iter()
            .zip(pivots)
            .map(|((item, width), pivot)| item.window(pivot, self.seq_len, *width))
            .collect();

        SequenceBatch::from_tensor(Tensor::cat(windows, 0).to_device(&self.device))
    }
}
