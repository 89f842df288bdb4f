pub mod credential;
pub mod image;
pub mod phase;
pub mod sequence;
