mod error;
mod export_writer;
