mod common;

use chrono::Utc;
use common::{database_url, setup_state, suffix};
use sea_orm::{EntityTrait, TransactionTrait};
use youlan_api::{
    dto::commodities::{CommodityUploads, NewCommodity, StyleStatusRequest, UploadedFile},
    entity::{
        commodities::Entity as Commodities,
        commodity_situations::Entity as CommoditySituations,
        style_code_situations::Entity as StyleSituations,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Visibility,
    services::commodity_service::{
        create_commodity, delete_commodity, set_style_family_status, set_style_family_status_in,
    },
    state::AppState,
    storage::BlobStore,
};

async fn statuses(state: &AppState, ids: &[String]) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::new();
    for id in ids {
        let row = CommoditySituations::find_by_id(id.clone())
            .one(&state.orm)
            .await?
            .expect("commodity situation");
        out.push(row.status);
    }
    Ok(out)
}

#[tokio::test]
async fn style_family_status_changes_all_or_nothing() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let (state, _) = setup_state(&url).await?;
    let tag = suffix();
    let admin = AuthUser {
        subject: "100001".into(),
        role: "admin".into(),
    };
    let style = format!("FAM{tag}");

    let mut ids = Vec::new();
    for size in ["90", "100"] {
        let commodity_id = format!("{style}-{size}");
        create_commodity(
            &state,
            &admin,
            NewCommodity {
                commodity_id: commodity_id.clone(),
                name: "背带裤".into(),
                style_code: style.clone(),
                category: "下装".into(),
                price: 8900,
                size: size.into(),
                ..Default::default()
            },
            CommodityUploads::default(),
        )
        .await?;
        ids.push(commodity_id);
    }
    assert_eq!(statuses(&state, &ids).await?, vec!["pending", "pending"]);

    // A failure partway through rolls back the statuses already flipped.
    let txn = state.orm.begin().await?;
    let flipped = set_style_family_status_in(&txn, &style, Visibility::Offline, Utc::now()).await?;
    assert_eq!(flipped, 2);
    let missing =
        set_style_family_status_in(&txn, &format!("NONE{tag}"), Visibility::Offline, Utc::now())
            .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    txn.rollback().await?;

    assert_eq!(statuses(&state, &ids).await?, vec!["pending", "pending"]);
    let row = StyleSituations::find_by_id(style.clone())
        .one(&state.orm)
        .await?
        .expect("style situation");
    assert_eq!(row.status, "online");
    assert!(row.offline_time.is_none());
    assert_eq!(row.sync_data_count, 2);

    let result = set_style_family_status(
        &state,
        &admin,
        StyleStatusRequest {
            style_code: style.clone(),
            status: Visibility::Offline,
        },
    )
    .await?
    .data
    .expect("result");
    assert_eq!(result.affected_commodities, 2);
    assert_eq!(result.status, "offline");
    assert_eq!(statuses(&state, &ids).await?, vec!["offline", "offline"]);
    let row = StyleSituations::find_by_id(style.clone())
        .one(&state.orm)
        .await?
        .expect("style situation");
    assert_eq!(row.status, "offline");
    assert!(row.offline_time.is_some());

    let unknown = set_style_family_status(
        &state,
        &admin,
        StyleStatusRequest {
            style_code: format!("NONE{tag}"),
            status: Visibility::Online,
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    for id in &ids {
        delete_commodity(&state, &admin, id).await?;
    }
    Ok(())
}

#[tokio::test]
async fn concurrent_creates_share_one_surviving_main_image() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let (state, blobs) = setup_state(&url).await?;
    let tag = suffix();
    let admin = AuthUser {
        subject: "100001".into(),
        role: "admin".into(),
    };
    let style = format!("RACE{tag}");

    let create = |size: &'static str| {
        let state = &state;
        let admin = &admin;
        let style = style.clone();
        async move {
            create_commodity(
                state,
                admin,
                NewCommodity {
                    commodity_id: format!("{style}-{size}"),
                    name: "条纹T恤".into(),
                    style_code: style.clone(),
                    category: "上装".into(),
                    price: 5900,
                    size: size.into(),
                    ..Default::default()
                },
                CommodityUploads {
                    image: Some(UploadedFile {
                        filename: format!("{size}.jpg"),
                        bytes: format!("main photo for {style}-{size}").into_bytes(),
                    }),
                    ..Default::default()
                },
            )
            .await
        }
    };
    let (a, b) = tokio::join!(create("90"), create("100"));
    let (a, b) = (a?.data.expect("created"), b?.data.expect("created"));
    assert_eq!(a.image, b.image);
    assert_ne!(a.image_reused, b.image_reused);

    let ids = [format!("{style}-90"), format!("{style}-100")];
    for id in &ids {
        let row = Commodities::find_by_id(id.clone())
            .one(&state.orm)
            .await?
            .expect("commodity");
        let path = row.image.expect("main image");
        assert!(blobs.exists(&path).await?);
    }

    for id in &ids {
        delete_commodity(&state, &admin, id).await?;
    }
    Ok(())
}
