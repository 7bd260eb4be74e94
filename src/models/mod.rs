pub mod lstm_ae;
