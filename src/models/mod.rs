//! Document types, request payloads and response views.

mod coupon;
mod customer;
mod order;
mod product;
mod store_settings;
mod user;

pub use coupon::{Coupon, CouponInput, Ineligible};
pub use customer::{Customer, CustomerInput};
pub use order::{
    CustomerRef, Order, OrderInput, OrderItem, OrderItemInput, OrderItemView, OrderStatus,
    OrderView, ProductRef, References, StatusUpdate,
};
pub use product::{Product, ProductInput};
pub use store_settings::{StoreSettings, StoreSettingsInput, STORE_SETTINGS_ID};
pub use user::{
    Claims, Identity, LoginRequest, LoginResponse, NewUser, Role, User, UserChanges, UserInput,
    UserView,
};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_true() -> bool {
    true
}
