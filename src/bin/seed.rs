use youlan_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        auth::{StaffKind, StaffRegisterRequest},
        commodities::{CommodityStatusRequest, CommodityUploads, NewCommodity},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Visibility,
    services::{commodity_service, staff_service},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let mobile = std::env::var("SEED_STAFF_MOBILE").unwrap_or_else(|_| "13800000000".into());
    let password = std::env::var("SEED_STAFF_PASSWORD").unwrap_or_else(|_| "admin123".into());
    let state = AppState::new(orm, config)?;

    let staff_id = ensure_staff(&state, &mobile, &password).await?;
    let seeder = AuthUser {
        subject: staff_id.clone(),
        role: StaffKind::Operation.role().to_string(),
    };
    let created = seed_commodities(&state, &seeder).await?;

    println!("Seed completed. Staff ID: {staff_id}, commodities created: {created}");
    Ok(())
}

async fn ensure_staff(state: &AppState, mobile: &str, password: &str) -> anyhow::Result<String> {
    let request = StaffRegisterRequest {
        kind: StaffKind::Operation,
        nickname: "运营管理员".into(),
        mobile: mobile.to_string(),
        password: password.to_string(),
        level: Some(1),
    };
    if let Some(existing) = staff_service::find_staff(state, StaffKind::Operation, mobile)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
    {
        println!("Operation staff {mobile} already exists");
        return Ok(existing.user_id);
    }
    let staff = staff_service::create_staff(state, request)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    println!("Created operation staff {mobile}");
    Ok(staff.user_id)
}

async fn seed_commodities(state: &AppState, seeder: &AuthUser) -> anyhow::Result<usize> {
    let samples = [
        ("YL24001-RED-90", "YL24001", "小熊连帽卫衣", "上装", "卫衣", 12900, "90", "红色"),
        ("YL24001-RED-100", "YL24001", "小熊连帽卫衣", "上装", "卫衣", 12900, "100", "红色"),
        ("YL24001-BLU-90", "YL24001", "小熊连帽卫衣", "上装", "卫衣", 12900, "90", "蓝色"),
        ("YL24002-GRY-110", "YL24002", "加绒运动长裤", "下装", "长裤", 9900, "110", "灰色"),
        ("YL24003-PNK-100", "YL24003", "碎花连衣裙", "裙装", "连衣裙", 15900, "100", "粉色"),
    ];

    let mut created = 0;
    for (commodity_id, style_code, name, category, detail, price, size, color) in samples {
        let new = NewCommodity {
            commodity_id: commodity_id.into(),
            name: name.into(),
            style_code: style_code.into(),
            category: category.into(),
            category_detail: detail.into(),
            price,
            size: size.into(),
            color: color.into(),
            height: format!("{size}cm"),
            ..Default::default()
        };
        match commodity_service::create_commodity(state, seeder, new, CommodityUploads::default())
            .await
        {
            Ok(_) => created += 1,
            Err(AppError::Conflict(_)) => continue,
            Err(err) => return Err(anyhow::anyhow!(err.to_string())),
        }
        commodity_service::set_commodity_status(
            state,
            seeder,
            CommodityStatusRequest {
                commodity_id: commodity_id.into(),
                status: Visibility::Online,
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    }
    Ok(created)
}
