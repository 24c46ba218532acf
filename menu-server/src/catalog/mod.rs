//! 商品目录
//!
//! - **admin**: 后台商品表单校验、增删改、上下架、库存字段迁移、列表视图
//! - **menu**: 顾客菜单视图 (分类筛选 / 搜索 / 卡片)

pub mod admin;
pub mod menu;

pub use admin::{
    AdminListing, CatalogAdminView, CatalogError, CatalogResult, CatalogService, ProductForm,
    SaveOutcome, SidebarStats, StatusFilter,
};
pub use menu::{MenuCard, MenuView};
