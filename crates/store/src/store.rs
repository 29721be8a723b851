use async_trait::async_trait;
use common::{
    CartItem, CartItemId, Money, Order, OrderId, OrderStatusLog, Product, ProductId,
    ProductPriceHistory, ProductStatus, Review, User, UserId,
};

use crate::Result;

/// Ordering applied to product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    DateAsc,
    #[default]
    DateDesc,
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "price_asc" => Ok(ProductSort::PriceAsc),
            "price_desc" => Ok(ProductSort::PriceDesc),
            "date_asc" => Ok(ProductSort::DateAsc),
            "date_desc" | "" => Ok(ProductSort::DateDesc),
            other => Err(format!("invalid sort: {other}")),
        }
    }
}

/// Criteria for listing products.
///
/// `None` means "no constraint". Text fields holding only whitespace are
/// treated as `None`. Soft-deleted products never match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the crop name.
    pub crop_name: Option<String>,
    /// Case-insensitive equality.
    pub city: Option<String>,
    /// Case-insensitive equality.
    pub state: Option<String>,
    /// Matches the category column or a `category: <x>` tag in the description.
    pub category: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// When absent only active products match.
    pub status: Option<ProductStatus>,
    pub farmer_id: Option<UserId>,
    pub sort: ProductSort,
    pub limit: Option<usize>,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing of active products matching a crop name, newest first.
    pub fn search(crop_name: impl Into<String>, limit: usize) -> Self {
        Self {
            crop_name: Some(crop_name.into()),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn with_farmer(mut self, farmer_id: UserId) -> Self {
        self.farmer_id = Some(farmer_id);
        self
    }

    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_sort(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    /// Trims text criteria and lower-cases the category, dropping blanks.
    pub fn normalized(&self) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            crop_name: clean(&self.crop_name),
            city: clean(&self.city),
            state: clean(&self.state),
            category: clean(&self.category).map(|c| c.to_lowercase()),
            status: Some(self.status.unwrap_or(ProductStatus::Active)),
            ..self.clone()
        }
    }

    /// Evaluates the filter against one product.
    ///
    /// Expects a filter produced by [`ProductFilter::normalized`].
    pub fn matches(&self, product: &Product) -> bool {
        if product.is_deleted() {
            return false;
        }
        if let Some(status) = self.status
            && product.status != status
        {
            return false;
        }
        if let Some(farmer) = self.farmer_id
            && product.farmer_id != farmer
        {
            return false;
        }
        if let Some(ref name) = self.crop_name
            && !product
                .crop_name
                .to_lowercase()
                .contains(&name.to_lowercase())
        {
            return false;
        }
        if let Some(ref city) = self.city
            && !product.city.eq_ignore_ascii_case(city)
        {
            return false;
        }
        if let Some(ref state) = self.state
            && !product.state.eq_ignore_ascii_case(state)
        {
            return false;
        }
        if let Some(ref category) = self.category {
            let tag = format!("category: {category}");
            if product.category != *category
                && !product.description.to_lowercase().contains(&tag)
            {
                return false;
            }
        }
        if let Some(min) = self.min_price
            && product.price_per_unit < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && product.price_per_unit > max
        {
            return false;
        }
        true
    }
}

/// Read side and entry point of the marketplace persistence layer.
///
/// Reads observe committed state only. Every mutation goes through a
/// [`UnitOfWork`] obtained from [`MarketStore::begin`].
#[async_trait]
pub trait MarketStore: Send + Sync + 'static {
    type Tx: UnitOfWork;

    /// Opens a unit of work. Dropping it without calling
    /// [`UnitOfWork::commit`] discards every write made through it.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Registers an account. Fails with `UniqueViolation` on a taken email or phone.
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Returns the product even when soft-deleted.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;

    /// All non-deleted products of a farmer, any status, newest first.
    async fn list_products_by_farmer(&self, farmer_id: UserId) -> Result<Vec<Product>>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Newest first.
    async fn list_orders_by_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>>;

    /// Newest first.
    async fn list_orders_by_farmer(&self, farmer_id: UserId) -> Result<Vec<Order>>;

    /// Oldest first, in commit order.
    async fn list_status_logs(&self, order_id: OrderId) -> Result<Vec<OrderStatusLog>>;

    /// Most recently updated first.
    async fn list_cart_items(&self, buyer_id: UserId) -> Result<Vec<CartItem>>;

    async fn find_review(&self, order_id: OrderId, reviewer_id: UserId)
    -> Result<Option<Review>>;

    /// Newest first.
    async fn list_reviews_by_reviewee(&self, reviewee_id: UserId) -> Result<Vec<Review>>;

    /// Newest first.
    async fn list_reviews_by_reviewer(&self, reviewer_id: UserId) -> Result<Vec<Review>>;

    /// Newest first.
    async fn list_price_history(&self, product_id: ProductId)
    -> Result<Vec<ProductPriceHistory>>;
}

/// An atomic unit of work.
///
/// Rows returned by the `lock_*` methods stay exclusively held until the
/// unit of work commits or is dropped, so read-validate-write sequences on
/// them cannot interleave with another unit of work.
#[async_trait]
pub trait UnitOfWork: Send + Sized {
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// The buyer's cart, most recently updated first.
    async fn cart_items(&mut self, buyer_id: UserId) -> Result<Vec<CartItem>>;

    async fn cart_item(
        &mut self,
        buyer_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>>;

    async fn insert_product(&mut self, product: &Product) -> Result<()>;

    async fn update_product(&mut self, product: &Product) -> Result<()>;

    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    /// Overwrites the mutable columns. `total_price` is never rewritten.
    async fn update_order(&mut self, order: &Order) -> Result<()>;

    async fn append_status_log(&mut self, log: &OrderStatusLog) -> Result<()>;

    async fn append_price_history(&mut self, entry: &ProductPriceHistory) -> Result<()>;

    /// Inserts the item or updates its quantity if the id already exists.
    async fn save_cart_item(&mut self, item: &CartItem) -> Result<()>;

    /// Returns whether a row was removed.
    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<bool>;

    /// Removes every cart item of the buyer, returning how many were removed.
    async fn clear_cart(&mut self, buyer_id: UserId) -> Result<u64>;

    async fn insert_review(&mut self, review: &Review) -> Result<()>;

    async fn commit(self) -> Result<()>;
}

/// Sorts products in place according to `sort`.
pub fn sort_products(products: &mut [Product], sort: ProductSort) {
    match sort {
        ProductSort::PriceAsc => products.sort_by(|a, b| a.price_per_unit.cmp(&b.price_per_unit)),
        ProductSort::PriceDesc => products.sort_by(|a, b| b.price_per_unit.cmp(&a.price_per_unit)),
        ProductSort::DateAsc => products.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        ProductSort::DateDesc => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}
