//! Integration tests for the forecaster pipeline.

mod mock_provider;
mod pipeline;
mod sample_data;
