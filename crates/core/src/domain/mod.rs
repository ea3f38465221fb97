pub mod action;
pub mod filter;
pub mod status;
pub mod tat;
pub mod terms;
pub mod timestamp;
pub mod upstream;
pub mod view;
