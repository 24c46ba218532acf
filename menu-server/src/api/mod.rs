//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 登录 / 退出 / 找回密码
//! - [`menu`] - 顾客菜单
//! - [`cart`] - 购物车与下单
//! - [`admin`] - 商品管理 (需登录)
//! - [`orders`] - 订单完成 / 取消 (需登录)
//! - [`sales`] - 当日销售看板与导出 (需登录)

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod menu;
pub mod orders;
pub mod sales;

use serde::Deserialize;

use crate::confirm::Preanswered;

/// The web client shows the dialog; the request carries the answer
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub confirmed: bool,
}

impl ConfirmRequest {
    pub fn provider(&self) -> Preanswered {
        Preanswered::confirmed(self.confirmed)
    }
}
