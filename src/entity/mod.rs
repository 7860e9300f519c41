pub mod categories;
pub mod inventory_logs;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod seller_profiles;
pub mod users;

pub use categories::Entity as Categories;
pub use inventory_logs::Entity as InventoryLogs;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use seller_profiles::Entity as SellerProfiles;
pub use users::Entity as Users;
