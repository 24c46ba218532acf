//! 订单模块
//!
//! - **id**: 订单号生成 (`PED` + 时间戳后 6 位 + 3 位随机数)
//! - **money**: 金额计算 (rust_decimal, 配送费 5.00)
//! - **lifecycle**: 下单 / 完成 / 取消 / 批量完成, 库存随之扣减或回补
//!
//! ```text
//! CartManager ──submit──▶ WriteBatch [create pedido + estoque -qty]
//!                                 │
//!                      finalize ──┼── cancel [estoque +qty]
//! ```

pub mod id;
pub mod lifecycle;
pub mod money;

pub use id::{generate_order_id, next_order_id};
pub use lifecycle::{OrderError, OrderLifecycle, OrderResult, Outcome};
pub use money::DELIVERY_FEE;
