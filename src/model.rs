pub mod tab;
pub mod tree;
