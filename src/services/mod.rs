pub mod dataset_store;
pub mod explorer;
pub mod ingest;
