mod blend_error;
mod profile_error;

pub use blend_error::*;
pub use profile_error::*;
