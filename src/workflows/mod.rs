pub mod notify;
pub mod opportunity;
pub mod review;
