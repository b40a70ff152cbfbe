pub mod champion;
pub mod replay;
