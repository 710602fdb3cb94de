//! Yarn Matcher Common Library
//!
//! 編み図の糸要件と在庫の糸を照合するための型・単位変換・要件解決（I/Oなし）

pub mod error;
pub mod parser;
pub mod resolver;
pub mod types;
pub mod units;

pub use error::{Error, Result};
pub use parser::{extract_json, parse_pattern, pattern_from_value};
pub use resolver::resolve;
pub use types::{GristSource, PatternRequirement, ResolvedRequirement, StashYarn, YarnNeed};
pub use units::{category_for_grist, combine_grist, parse_grist, WeightCategory};
