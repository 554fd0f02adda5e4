pub mod extraction_pipeline;
