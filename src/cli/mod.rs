mod add;
mod list;
mod search;

pub use add::*;
pub use list::*;
pub use search::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> anyhow::Result<()>;
}
