pub mod asset;
pub mod style;

pub use asset::{AssetKind, AssetRecord, ExtraData};
pub use style::StyleConfig;
