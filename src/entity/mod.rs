pub mod access_tokens;
pub mod activity_images;
pub mod addresses;
pub mod audit_logs;
pub mod carts;
pub mod commodities;
pub mod commodity_images;
pub mod commodity_situations;
pub mod operation_users;
pub mod orders;
pub mod style_code_situations;
pub mod users;

pub use access_tokens::Entity as AccessTokens;
pub use activity_images::Entity as ActivityImages;
pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use carts::Entity as Carts;
pub use commodities::Entity as Commodities;
pub use commodity_images::Entity as CommodityImages;
pub use commodity_situations::Entity as CommoditySituations;
pub use operation_users::Entity as OperationUsers;
pub use orders::Entity as Orders;
pub use style_code_situations::Entity as StyleCodeSituations;
pub use users::Entity as Users;
