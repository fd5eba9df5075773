pub mod archive;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod embed;
pub mod error;
pub mod matcher;
pub mod metadata;
pub mod utils;
pub mod verdict;

pub use archive::{MatchResult, PhotoArchive, PhotoArchiveBuilder};
pub use config::Opts;
pub use error::ArchiveError;
pub use verdict::Verdict;
