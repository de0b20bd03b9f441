pub mod currency;
pub mod record;

pub use currency::QuoteCurrency;
pub use record::{AssetRecord, RateRecord};
