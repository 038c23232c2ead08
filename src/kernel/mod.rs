//! Pure, device-free core: the shared history and the noise segmentation.

pub mod audio;
pub mod history;
pub mod time;
