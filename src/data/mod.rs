pub mod batchitem;
pub mod sequenceitem;
