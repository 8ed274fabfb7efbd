pub mod info;
pub mod resolve;
pub mod run;
