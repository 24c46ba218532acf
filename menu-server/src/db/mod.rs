//! 数据库层
//!
//! - [`store`]: 文档数据库抽象 (集合 / 查询 / 原子批量写 / 实时订阅)
//! - [`memory`]: 进程内实现，开发和测试使用
//! - [`repository`]: 领域模型 <-> 文档映射

pub mod memory;
pub mod repository;
pub mod store;
pub mod subscription;

pub use memory::MemoryStore;
pub use store::{
    Direction, Document, DocumentStore, FieldValue, Patch, Precondition, Query, Snapshot,
    StoreError, StoreResult, WriteBatch, WriteOp,
};
pub use subscription::{QueryEvent, Subscription};
