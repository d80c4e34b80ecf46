pub mod check;
pub mod log;
pub mod run;
pub mod status;
