pub mod luma;
pub mod patches;
pub mod provider;

pub use luma::LumaImage;
pub use patches::{PatchPair, PatchSampler};
pub use provider::{DatasetProvider, FsDatasetProvider};
