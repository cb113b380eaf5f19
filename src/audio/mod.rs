pub mod clip;
pub mod decoded;
pub mod output;

pub use clip::ClipInfo;
pub use decoded::DecodedOutput;
pub use output::{AudioOutput, AudioSource, OutputEvent};
