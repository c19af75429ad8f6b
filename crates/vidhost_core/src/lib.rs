pub mod catalog;
pub mod media;
pub mod playback;
pub mod preferences;
pub mod profile;
pub mod storage;
pub mod upload;

pub use catalog::*;
pub use media::*;
pub use playback::*;
pub use preferences::*;
pub use profile::*;
pub use storage::*;
pub use upload::*;
