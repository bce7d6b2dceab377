pub mod batch;
pub mod info;
pub mod report;
pub mod run;
pub mod validate;
