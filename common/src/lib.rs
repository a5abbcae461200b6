//! FastPack Common Library
//!
//! CLIとスキャンワークフローで共有される出荷型と純粋ロジック

pub mod types;
pub mod barcode;
pub mod analyzer;
pub mod error;

pub use types::{
    AuthResponse, Credentials, LineItem, LogisticsClass, PackedPhoto, ShipmentId, ShipmentQuery,
    ShipmentRecord, UserProfile,
};
pub use barcode::{DecodedCode, RawSymbol, Symbology, extract_value, first_valid_code, is_valid_code};
pub use analyzer::{AnalysisCounters, BucketCounts, ClassificationRules, analyze, analyze_with};
pub use error::{Error, Result};
