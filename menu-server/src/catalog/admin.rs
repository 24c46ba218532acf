//! Catalog administration
//!
//! [`ProductForm`] is the raw form input, [`CatalogService`] performs the
//! writes and [`CatalogAdminView`] is the live product listing with its
//! filters and sidebar counters.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Product, ProductDraft, ProductKind, StockLevel};
use shared::util::non_blank;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::confirm::ConfirmationProvider;
use crate::db::DocumentStore;
use crate::db::repository::{ProductRepository, RepoError};
use crate::utils::format::{format_brl, relative_age, round_money};
use crate::utils::validation::parse_price;

/// Cards shown before "show all"
pub const DEFAULT_VISIBLE_CARDS: usize = 6;

/// Sidebar "low stock" bound (exclusive)
pub const LOW_STOCK_THRESHOLD: u32 = 10;

pub const MIGRATE_STOCK_CONFIRM: &str =
    "Deseja migrar produtos antigos para usar o novo campo \"quantidade\"?";

pub fn delete_confirm(name: &str) -> String {
    format!("Tem certeza que deseja excluir o produto \"{name}\"?\nEsta ação não pode ser desfeita.")
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Digite o nome do produto")]
    NameRequired,

    #[error("Preço inválido")]
    InvalidPrice,

    #[error("URL da imagem inválida")]
    InvalidImageUrl,

    #[error("Selecione pelo menos uma categoria para o adicional")]
    AddonCategoryRequired,

    #[error("{0}")]
    Invalid(String),

    #[error("Produto não encontrado")]
    NotFound(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err {
            CatalogError::NameRequired => AppError::with_message(ErrorCode::ProductNameRequired, message),
            CatalogError::InvalidPrice => AppError::with_message(ErrorCode::ProductInvalidPrice, message),
            CatalogError::InvalidImageUrl => {
                AppError::with_message(ErrorCode::ProductInvalidImageUrl, message)
            }
            CatalogError::AddonCategoryRequired => {
                AppError::with_message(ErrorCode::AddonCategoryRequired, message)
            }
            CatalogError::Invalid(_) => AppError::validation(message),
            CatalogError::NotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, message).with_detail("product_id", id)
            }
            CatalogError::Repo(RepoError::NotFound(what)) => {
                AppError::with_message(ErrorCode::ProductNotFound, "Produto não encontrado")
                    .with_detail("resource", what)
            }
            CatalogError::Repo(e) => e.into(),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// Form
// =============================================================================

fn default_true() -> bool {
    true
}

/// Product form as typed by the operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProductForm {
    #[serde(default)]
    #[validate(length(max = 200, message = "Nome muito longo"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 500, message = "Descrição muito longa"))]
    pub description: String,

    /// Raw price text (`12.50` or `12,50`)
    #[serde(default)]
    pub price: String,

    #[serde(default)]
    pub stock: Option<i64>,

    #[serde(default)]
    #[validate(length(max = 100, message = "Categoria muito longa"))]
    pub category: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub kind: ProductKind,

    #[serde(default)]
    pub addon_categories: Vec<String>,

    #[serde(default)]
    #[validate(
        url(message = "URL da imagem inválida"),
        length(max = 2048, message = "URL da imagem muito longa")
    )]
    pub image_url: Option<String>,
}

impl ProductForm {
    /// Checks the form and produces the document payload
    pub fn into_draft(mut self) -> CatalogResult<ProductDraft> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::NameRequired);
        }
        // a blank image field means "no image"
        self.image_url = non_blank(self.image_url.as_deref());
        self.validate().map_err(|e| {
            if is_url_error(&e) {
                CatalogError::InvalidImageUrl
            } else {
                CatalogError::Invalid(first_message(&e))
            }
        })?;

        let price = parse_price(&self.price).ok_or(CatalogError::InvalidPrice)?;
        let image_url = self.image_url;

        let addon_categories = match self.kind {
            ProductKind::Addon if self.addon_categories.is_empty() => {
                return Err(CatalogError::AddonCategoryRequired);
            }
            ProductKind::Addon => self.addon_categories,
            ProductKind::Normal => Vec::new(),
        };

        let category = match self.category.trim() {
            "" => "outro".to_string(),
            other => other.to_string(),
        };

        Ok(ProductDraft {
            name,
            description: self.description.trim().to_string(),
            price: round_money(price),
            stock: self
                .stock
                .map(|s| u32::try_from(s.max(0)).unwrap_or(u32::MAX))
                .unwrap_or(0),
            category,
            is_active: self.is_active,
            kind: self.kind,
            addon_categories,
            image_url,
        })
    }
}

impl From<&Product> for ProductForm {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price.to_string(),
            stock: Some(i64::from(p.stock)),
            category: p.category.clone(),
            is_active: p.is_active,
            kind: p.kind,
            addon_categories: p.addon_categories.clone(),
            image_url: p.image_url.clone(),
        }
    }
}

fn is_url_error(errors: &ValidationErrors) -> bool {
    errors
        .field_errors()
        .get("image_url")
        .is_some_and(|errs| errs.iter().any(|e| e.code == "url"))
}

fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

// =============================================================================
// Service
// =============================================================================

/// Result of a form submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub product_id: String,
    pub created: bool,
}

impl SaveOutcome {
    pub fn message(&self) -> &'static str {
        if self.created {
            "Produto cadastrado com sucesso!"
        } else {
            "Produto atualizado com sucesso!"
        }
    }
}

/// Catalog writes. Tracks which product the form is editing.
pub struct CatalogService {
    products: ProductRepository,
    editing: Mutex<Option<String>>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            products: ProductRepository::new(store),
            editing: Mutex::new(None),
        }
    }

    pub fn repository(&self) -> &ProductRepository {
        &self.products
    }

    /// Id of the product currently loaded in the form
    pub fn editing(&self) -> Option<String> {
        self.editing.lock().clone()
    }

    pub fn cancel_edit(&self) {
        self.editing.lock().take();
    }

    /// Creates a product, or updates the one being edited
    pub async fn save(&self, form: ProductForm) -> CatalogResult<SaveOutcome> {
        let draft = form.into_draft()?;

        let editing = self.editing();
        let outcome = match editing {
            Some(id) => {
                self.products.update(&id, &draft).await?;
                SaveOutcome {
                    product_id: id,
                    created: false,
                }
            }
            None => SaveOutcome {
                product_id: self.products.create(&draft).await?,
                created: true,
            },
        };

        self.cancel_edit();
        Ok(outcome)
    }

    /// Loads a product into the form and remembers it as being edited
    pub async fn load_for_edit(&self, id: &str) -> CatalogResult<ProductForm> {
        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        *self.editing.lock() = Some(id.to_string());
        Ok(ProductForm::from(&product))
    }

    /// Flips on/off; returns the new state
    pub async fn toggle_status(&self, id: &str) -> CatalogResult<bool> {
        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        let active = !product.is_active;
        self.products.set_active(id, active).await?;
        tracing::info!(product_id = %id, active, "Product status toggled");
        Ok(active)
    }

    /// Returns `false` when the operator declined
    pub async fn delete(&self, id: &str, confirm: &dyn ConfirmationProvider) -> CatalogResult<bool> {
        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        if !confirm.confirm(&delete_confirm(&product.name)) {
            return Ok(false);
        }

        self.products.delete(id).await?;

        let mut editing = self.editing.lock();
        if editing.as_deref() == Some(id) {
            editing.take();
        }
        Ok(true)
    }

    /// `None` when the operator declined
    pub async fn migrate_legacy_stock(
        &self,
        confirm: &dyn ConfirmationProvider,
    ) -> CatalogResult<Option<usize>> {
        if !confirm.confirm(MIGRATE_STOCK_CONFIRM) {
            return Ok(None);
        }
        Ok(Some(self.products.migrate_legacy_stock().await?))
    }
}

// =============================================================================
// Listing view
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    #[serde(rename = "todos")]
    All,
    #[serde(rename = "on")]
    Active,
    #[serde(rename = "off")]
    Inactive,
}

impl StatusFilter {
    fn accepts(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Active => product.is_active,
            Self::Inactive => !product.is_active,
        }
    }
}

/// Admin listing card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category_label: &'static str,
    pub price: String,
    pub stock: u32,
    pub stock_level: StockLevel,
    pub is_active: bool,
    pub status_label: &'static str,
    pub toggle_label: &'static str,
    pub is_addon: bool,
    pub image_url: Option<String>,
    /// `Agora`, `5m`, `3h`, ... since creation
    pub age: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminListing {
    pub cards: Vec<AdminCard>,
    pub total: usize,
    pub filtered: usize,
    pub has_more: bool,
    pub info: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SidebarStats {
    pub active_products: usize,
    pub low_stock: usize,
}

fn category_label(category: &str) -> &'static str {
    match category {
        "comida" => "Comida",
        "bebida" => "Bebida",
        "sobremesa" => "Sobremesa",
        _ => "Outro",
    }
}

/// Live admin listing; the whole product list is replaced on every snapshot
#[derive(Debug, Default)]
pub struct CatalogAdminView {
    products: Vec<Product>,
    filter: StatusFilter,
    search: String,
    show_all: bool,
}

impl CatalogAdminView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first; products without a creation time go last
    pub fn replace_products(&mut self, mut products: Vec<Product>) {
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.products = products;
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.show_all = false;
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_lowercase();
        self.show_all = false;
    }

    pub fn show_all(&mut self) {
        self.show_all = true;
    }

    pub fn filtered(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| self.filter.accepts(p))
            .filter(|p| {
                self.search.is_empty()
                    || p.name.to_lowercase().contains(&self.search)
                    || p.description.to_lowercase().contains(&self.search)
            })
            .collect()
    }

    pub fn listing(&self, now_millis: i64) -> AdminListing {
        let filtered = self.filtered();
        let total = self.products.len();
        let count = filtered.len();

        let visible = if self.show_all {
            count
        } else {
            count.min(DEFAULT_VISIBLE_CARDS)
        };
        let cards = filtered
            .into_iter()
            .take(visible)
            .map(|p| AdminCard {
                id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
                category_label: category_label(&p.category),
                price: format_brl(p.price),
                stock: p.stock,
                stock_level: p.stock_level(),
                is_active: p.is_active,
                status_label: if p.is_active { "ATIVO" } else { "INATIVO" },
                toggle_label: if p.is_active { "Desativar" } else { "Ativar" },
                is_addon: p.kind == ProductKind::Addon,
                image_url: p.image_url.clone(),
                age: p.created_at.map(|at| relative_age(now_millis, at)),
            })
            .collect();

        let info = if self.show_all {
            format!("Mostrando todos os {count} produtos")
        } else if count == total {
            "Mostrando todos os produtos".to_string()
        } else {
            format!("Mostrando {count} de {total} produtos")
        };

        AdminListing {
            cards,
            total,
            filtered: count,
            has_more: visible < count,
            info,
        }
    }

    pub fn sidebar_stats(&self) -> SidebarStats {
        sidebar_stats(&self.products)
    }
}

pub fn sidebar_stats(products: &[Product]) -> SidebarStats {
    SidebarStats {
        active_products: products.iter().filter(|p| p.is_active).count(),
        low_stock: products
            .iter()
            .filter(|p| p.stock > 0 && p.stock < LOW_STOCK_THRESHOLD)
            .count(),
    }
}
