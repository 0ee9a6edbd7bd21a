mod cannibalization;
mod cascade;
mod config;
mod ctr;
mod metrics;
mod parse;
mod percentile;
mod pipeline;
mod problem;
mod quality;
mod run;
mod segment;
mod table;

pub use run::run;

pub(crate) use config::EngineConfig;
pub(crate) use pipeline::{score_records, summarize};
pub(crate) use segment::Segmenter;
pub(crate) use table::{read_table, render_table};
