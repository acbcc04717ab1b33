use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        access_tokens::{IpList, TokenIssued},
        activities::{ActivityImageForm, ActivityImageList},
        addresses::AddressList,
        auth::{LoginResponse, StaffAccount, StaffKind, TokenPair, WechatLoginResponse},
        cart::{BatchDeleteResult, CartItemQuantity, CartItemView, CartView, ClearCartResult},
        commodities::{
            ColorGroup, CommodityCreated, CommodityDetail, CreateCommodityForm, GoodsDemand,
            GoodsItem, ImageView, StyleFamilyView,
        },
        orders::{LogisticsSyncResult, OrderCreated, OrderList, StatusChanged},
    },
    models::{
        ActivityImage, Address, ListingStatus, LogisticsEvent, Order, OrderLine, OrderStatus,
        UserProfile, Visibility,
    },
    response::{ApiResponse, Meta},
    routes::{
        access_token, activity, address, cart, commodity, health, orders, params, staff, users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "access_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("access_token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        access_token::get_token,
        access_token::get_ips,
        users::register,
        users::verify_login,
        users::wechat_login,
        users::get_user,
        users::get_user_id,
        users::update_user,
        staff::register,
        staff::login,
        staff::change_password,
        address::add_address,
        address::delete_address,
        address::update_address,
        address::set_default,
        address::list_addresses,
        address::get_address,
        cart::add_to_cart,
        cart::delete_from_cart,
        cart::batch_delete_from_cart,
        cart::query_cart_items,
        cart::query_cart_items_json,
        cart::update_cart_item_quantity,
        cart::increase_cart_item_quantity,
        cart::decrease_cart_item_quantity,
        cart::clear_cart,
        commodity::add_goods,
        commodity::delete_goods,
        commodity::update_goods,
        commodity::detail,
        commodity::set_status,
        commodity::get_status,
        commodity::style_status,
        commodity::style_code_commodities,
        commodity::goods_query,
        commodity::categories,
        commodity::search_by_name,
        commodity::batch_by_ids,
        orders::add_order,
        orders::get_order,
        orders::update_receiver,
        orders::change_status,
        orders::update_express,
        orders::sync_logistics,
        orders::orders_query,
        orders::user_orders,
        activity::add_activity_image,
        activity::update_relations,
        activity::online,
        activity::offline,
        activity::list_activity_images
    ),
    components(
        schemas(
            UserProfile,
            Address,
            Order,
            OrderLine,
            OrderStatus,
            LogisticsEvent,
            ActivityImage,
            ListingStatus,
            Visibility,
            StaffKind,
            TokenPair,
            TokenIssued,
            IpList,
            LoginResponse,
            WechatLoginResponse,
            StaffAccount,
            AddressList,
            CartItemQuantity,
            CartItemView,
            CartView,
            BatchDeleteResult,
            ClearCartResult,
            CreateCommodityForm,
            CommodityCreated,
            CommodityDetail,
            ImageView,
            ColorGroup,
            StyleFamilyView,
            GoodsDemand,
            GoodsItem,
            OrderCreated,
            OrderList,
            StatusChanged,
            LogisticsSyncResult,
            ActivityImageForm,
            ActivityImageList,
            params::Pagination,
            params::ShopQuery,
            Meta,
            ApiResponse<CartView>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<CommodityDetail>
        )
    ),
    security(
        ("access_token" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "AccessToken", description = "IP-bound access tokens"),
        (name = "Users", description = "Customer accounts and WeChat login"),
        (name = "Staff", description = "Operations staff accounts"),
        (name = "Address", description = "Delivery addresses"),
        (name = "Cart", description = "Shopping cart endpoints"),
        (name = "Commodity", description = "Catalog management and queries"),
        (name = "Orders", description = "Orders and logistics"),
        (name = "Activity", description = "Promotional activity image slots"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
