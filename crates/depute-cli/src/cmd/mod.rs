pub mod config;
pub mod next;
pub mod refresh;
pub mod run;
