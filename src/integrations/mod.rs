//! 外部集成：LINE Messaging API（需 line feature 与公网 Webhook 域名）

#[cfg(feature = "line")]
pub mod line;
