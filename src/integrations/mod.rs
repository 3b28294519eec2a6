//! 外部平台接入

pub mod telegram;
