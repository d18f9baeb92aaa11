mod info;
mod plan;
mod run;

pub use info::cmd_info;
pub use plan::cmd_plan;
pub use run::{RunOverrides, cmd_run};
