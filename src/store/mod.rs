//! 存储层：任务记录与单文件 JSON 持久化

pub mod tasks;

pub use tasks::{Task, TaskStore};
