//! fastpack: 出荷梱包ステーション用クライアント

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod photo;
pub mod scanner;
pub mod station;
pub mod workflow;
