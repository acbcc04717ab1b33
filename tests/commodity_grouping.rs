use chrono::Utc;
use serde_json::json;
use youlan_api::{
    entity::commodities::Model as Commodity,
    services::commodity_service::{group_by_color, project_fields},
};

fn commodity(id: &str, color: &str, size: &str, color_image: Option<&str>) -> Commodity {
    Commodity {
        commodity_id: id.into(),
        name: "小熊连帽卫衣".into(),
        style_code: "YL24001".into(),
        category: "上装".into(),
        category_detail: "卫衣".into(),
        price: 12900,
        image: Some("commodities/YL24001/main.jpg".into()),
        promo_image: None,
        size: size.into(),
        color: color.into(),
        height: String::new(),
        spec_code: String::new(),
        color_image: color_image.map(str::to_string),
        notes: String::new(),
        created_at: Utc::now().into(),
    }
}

fn url(path: &str) -> String {
    format!("/media/{path}")
}

#[tokio::test]
async fn colors_keep_first_seen_order() {
    let family = vec![
        commodity("R-90", "红色", "90", Some("commodities/colors/red/a.png")),
        commodity("B-90", "蓝色", "90", Some("commodities/colors/blue/b.png")),
        commodity("R-100", "红色", "100", None),
    ];

    let groups = group_by_color(&family, url);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].color, "红色");
    assert_eq!(groups[1].color, "蓝色");

    let sizes: Vec<(&str, &str)> = groups[0]
        .sizes
        .iter()
        .map(|s| (s.commodity_id.as_str(), s.size.as_str()))
        .collect();
    assert_eq!(sizes, vec![("R-90", "90"), ("R-100", "100")]);
    assert_eq!(
        groups[0].color_image.as_deref(),
        Some("/media/commodities/colors/red/a.png")
    );
}

#[tokio::test]
async fn swatch_falls_back_to_main_image() {
    let mut plain = commodity("G-110", "灰色", "110", None);
    let groups = group_by_color(std::slice::from_ref(&plain), url);
    assert_eq!(
        groups[0].color_image.as_deref(),
        Some("/media/commodities/YL24001/main.jpg")
    );

    plain.image = None;
    let later = commodity("G-120", "灰色", "120", Some("commodities/colors/grey/g.png"));
    let groups = group_by_color(&[plain, later], url);
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].color_image.as_deref(),
        Some("/media/commodities/colors/grey/g.png")
    );
}

#[tokio::test]
async fn projection_keeps_requested_fields_only() {
    let value = json!({ "commodity_id": "A", "name": "n", "price": 100 });

    let all = project_fields(value.clone(), None);
    assert_eq!(all.len(), 3);

    let fields = vec!["price".to_string(), "missing".to_string()];
    let some = project_fields(value.clone(), Some(fields.as_slice()));
    assert_eq!(some.len(), 1);
    assert_eq!(some.get("price"), Some(&json!(100)));

    assert_eq!(project_fields(value, Some(&[][..])).len(), 3);
    assert!(project_fields(json!([1, 2]), None).is_empty());
}
