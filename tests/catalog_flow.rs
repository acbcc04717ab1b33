mod common;

use common::{database_url, setup_state, suffix};
use rand::Rng;
use sea_orm::EntityTrait;
use youlan_api::{
    dto::{
        addresses::AddAddressRequest,
        auth::{RegisterRequest, WechatLoginRequest},
        cart::{AddToCartRequest, BatchDeleteRequest, CartItemRequest, IncreaseQuantityRequest},
        commodities::{
            CommodityStatusRequest, CommodityUploads, GoodsDemand, GoodsQuery, NewCommodity,
            OneOrMany, StyleCodeQuery, UploadedFile,
        },
        orders::{ChangeStatusRequest, CreateOrderRequest, SyncLogisticsRequest},
    },
    entity::style_code_situations::Entity as StyleSituations,
    error::AppError,
    middleware::auth::AuthUser,
    models::{OrderStatus, Visibility},
    routes::params::Pagination,
    services::{
        address_service, auth_service, cart_service, commodity_service, order_service,
    },
    storage::BlobStore,
};

fn random_mobile() -> String {
    format!("139{:08}", rand::rng().random_range(0..100_000_000u32))
}

fn upload(name: &str, body: String) -> UploadedFile {
    UploadedFile {
        filename: name.into(),
        bytes: body.into_bytes(),
    }
}

// Integration flow: customer registers, fills a cart, admin lists a style family,
// customer orders and staff ships and tracks the order.
#[tokio::test]
async fn storefront_flow() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let (state, blobs) = setup_state(&database_url).await?;
    let tag = suffix();

    // Customer accounts
    let mobile = random_mobile();
    let profile = auth_service::register_user(
        &state,
        RegisterRequest {
            mobile: mobile.clone(),
            nickname: "小明妈妈".into(),
            password: "pa55word".into(),
        },
    )
    .await?
    .data
    .expect("profile");
    let user_id = profile.user_id;

    let duplicate = auth_service::register_user(
        &state,
        RegisterRequest {
            mobile,
            nickname: "again".into(),
            password: "pa55word".into(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let login = |code: String| WechatLoginRequest {
        code,
        nickname: None,
        avatar_url: None,
    };
    let first = auth_service::wechat_login(&state, login(tag.clone())).await?.data.expect("login");
    let second = auth_service::wechat_login(&state, login(tag.clone())).await?.data.expect("login");
    assert!(first.is_new_user);
    assert!(!second.is_new_user);
    assert_eq!(first.user_id, second.user_id);
    assert!(matches!(
        auth_service::wechat_login(&state, login("bad".into())).await,
        Err(AppError::BadRequest(_))
    ));

    // Cart: add 2, +3, four single decrements, a refused one, then removal
    let code = format!("FLOW-{tag}-90");
    let item = || CartItemRequest {
        user_id,
        commodity_code: code.clone(),
    };
    let added = cart_service::add_to_cart(
        &state,
        AddToCartRequest {
            user_id,
            commodity_code: code.clone(),
            quantity: Some(2),
        },
    )
    .await?
    .data
    .expect("quantity");
    assert_eq!(added.quantity, 2);
    let increased = cart_service::increase_quantity(
        &state,
        IncreaseQuantityRequest {
            user_id,
            commodity_code: code.clone(),
            quantity: Some(3),
        },
    )
    .await?
    .data
    .expect("quantity");
    assert_eq!(increased.quantity, 5);
    for expected in [4, 3, 2, 1] {
        let decreased = cart_service::decrease_quantity(&state, item())
            .await?
            .data
            .expect("quantity");
        assert_eq!(decreased.quantity, expected);
    }
    assert!(matches!(
        cart_service::decrease_quantity(&state, item()).await,
        Err(AppError::BadRequest(_))
    ));
    let cart = cart_service::query_cart(&state, user_id).await?.data.expect("cart");
    assert_eq!(cart.total_quantity, 1);

    let removed = cart_service::batch_delete(
        &state,
        BatchDeleteRequest {
            user_id,
            commodity_codes: vec![code.clone(), "NOT-THERE".into()],
        },
    )
    .await?
    .data
    .expect("removal");
    assert_eq!(removed.deleted_codes, vec![code]);
    assert_eq!(removed.not_exist_codes, vec!["NOT-THERE".to_string()]);
    let cart = cart_service::query_cart(&state, user_id).await?.data.expect("cart");
    assert!(cart.cart_items.is_empty());
    assert!(matches!(
        cart_service::query_cart(&state, -1).await,
        Err(AppError::NotFound(_))
    ));

    // Style family with a shared main image
    let admin = AuthUser {
        subject: "100001".into(),
        role: "admin".into(),
    };
    let style = format!("FLOW{tag}");
    let category = format!("上装{tag}");
    let style_dir = format!("commodities/{style}");
    let main = upload("main.jpg", format!("main image {tag}"));
    blobs.write(&format!("{style_dir}/stray.jpg"), b"left over").await?;
    let mut ids = Vec::new();
    for (color, size) in [("红色", "90"), ("红色", "100"), ("蓝色", "90")] {
        let commodity_id = format!("{style}-{color}-{size}");
        let created = commodity_service::create_commodity(
            &state,
            &admin,
            NewCommodity {
                commodity_id: commodity_id.clone(),
                name: "小熊连帽卫衣".into(),
                style_code: style.clone(),
                category: category.clone(),
                price: 12900,
                size: size.into(),
                color: color.into(),
                ..Default::default()
            },
            CommodityUploads {
                image: Some(main.clone()),
                ..Default::default()
            },
        )
        .await?
        .data
        .expect("created");
        assert_eq!(created.image_reused, !ids.is_empty());
        commodity_service::set_commodity_status(
            &state,
            &admin,
            CommodityStatusRequest {
                commodity_id: commodity_id.clone(),
                status: Visibility::Online,
            },
        )
        .await?;
        ids.push(commodity_id);
    }

    // Only the shared main image is left in the style folder
    let stored = blobs.list_dir(&style_dir).await?;
    assert_eq!(stored.len(), 1);
    assert_ne!(stored[0], "stray.jpg");
    let situation = StyleSituations::find_by_id(style.clone())
        .one(&state.orm)
        .await?
        .expect("style situation");
    assert_eq!(situation.sync_data_count, 3);
    assert_eq!(situation.status, "online");

    let family = commodity_service::style_code_commodities(
        &state,
        StyleCodeQuery {
            shopname: "youlan_kids".into(),
            style_code: style.clone(),
        },
    )
    .await?
    .data
    .expect("family");
    let colors: Vec<&str> = family.items.iter().map(|g| g.color.as_str()).collect();
    assert_eq!(colors, vec!["红色", "蓝色"]);
    assert_eq!(family.items[0].sizes.len(), 2);

    // The style listing skips members that are offline themselves
    commodity_service::set_commodity_status(
        &state,
        &admin,
        CommodityStatusRequest {
            commodity_id: ids[2].clone(),
            status: Visibility::Offline,
        },
    )
    .await?;
    let listing = commodity_service::goods_query(
        &state,
        GoodsQuery {
            shopname: "youlan_kids".into(),
            demand: Some(GoodsDemand::StyleCode),
            style_code: None,
            category: Some(OneOrMany::One(category.clone())),
            status: None,
            pagination: Pagination::default(),
        },
    )
    .await?
    .data
    .expect("listing");
    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.items[0].commodity_id, ids[1]);

    // A failed create leaves no uploads behind
    let failed_style = format!("FAIL{tag}");
    let failed = commodity_service::create_commodity(
        &state,
        &admin,
        NewCommodity {
            commodity_id: format!("{failed_style}-90"),
            name: "连衣裙".into(),
            style_code: failed_style.clone(),
            category: category.clone(),
            price: 9900,
            spec_code: "X".repeat(200),
            ..Default::default()
        },
        CommodityUploads {
            image: Some(upload("main.jpg", format!("failed main {tag}"))),
            promo_image: Some(upload("promo.jpg", format!("failed promo {tag}"))),
            gallery: vec![upload("g1.jpg", format!("failed gallery {tag}"))],
            ..Default::default()
        },
    )
    .await;
    assert!(failed.is_err());
    assert!(
        blobs
            .paths()
            .iter()
            .all(|p| !p.starts_with(&format!("commodities/{failed_style}/")))
    );
    assert!(
        StyleSituations::find_by_id(failed_style)
            .one(&state.orm)
            .await?
            .is_none()
    );

    // Addresses keep a single default
    for name in ["张三", "李四"] {
        address_service::add_address(
            &state,
            AddAddressRequest {
                user_id,
                province: "浙江省".into(),
                city: "杭州市".into(),
                county: "西湖区".into(),
                detailed_address: "文三路 1 号".into(),
                receiver_name: name.into(),
                phone_number: "13800000000".into(),
                is_default: true,
                remark: None,
            },
        )
        .await?;
    }
    let addresses = address_service::list_addresses(&state, user_id)
        .await?
        .data
        .expect("addresses");
    assert_eq!(addresses.items.iter().filter(|a| a.is_default).count(), 1);
    assert_eq!(addresses.items[0].receiver_name, "李四");

    // Order, shipping and tracking
    let order = order_service::create_order(
        &state,
        CreateOrderRequest {
            user_id,
            receiver_name: "李四".into(),
            receiver_phone: "13800000000".into(),
            province: "浙江省".into(),
            city: "杭州市".into(),
            county: "西湖区".into(),
            detailed_address: "文三路 1 号".into(),
            order_amount: 25800,
            product_list: serde_json::json!([
                { "commodity_id": ids[0], "quantity": 2, "price": 12900 }
            ]),
            express_company: String::new(),
            express_number: String::new(),
            remarks: None,
        },
    )
    .await?
    .data
    .expect("order");
    assert!(order.order_id.starts_with('Y'));

    let early = order_service::sync_logistics(
        &state,
        SyncLogisticsRequest {
            order_id: order.order_id.clone(),
        },
    )
    .await;
    assert!(matches!(early, Err(AppError::BadRequest(_))));

    let changed = order_service::change_status(
        &state,
        &admin,
        ChangeStatusRequest {
            order_id: order.order_id.clone(),
            status: OrderStatus::Shipped,
            express_company: Some("SF".into()),
            express_number: Some("SF1234567890".into()),
            logistics_process: None,
        },
    )
    .await?
    .data
    .expect("changed");
    assert_eq!(changed.old_status, "pending");
    assert_eq!(changed.order.status, "shipped");

    let synced = order_service::sync_logistics(
        &state,
        SyncLogisticsRequest {
            order_id: order.order_id.clone(),
        },
    )
    .await?
    .data
    .expect("synced");
    assert!(synced.synced);
    assert_eq!(synced.logistics_process.len(), 1);

    // Cleanup
    for id in &ids {
        commodity_service::delete_commodity(&state, &admin, id).await?;
    }
    let situation = StyleSituations::find_by_id(style)
        .one(&state.orm)
        .await?
        .expect("style situation");
    assert_eq!(situation.sync_data_count, 0);
    assert!(blobs.list_dir(&style_dir).await?.is_empty());

    Ok(())
}
