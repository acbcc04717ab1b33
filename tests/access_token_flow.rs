mod common;

use common::{database_url, setup_state};
use rand::Rng;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use youlan_api::{
    entity::access_tokens::{Column as TokenCol, Entity as AccessTokens},
    services::access_token_service::{bound_ip, issue_or_get},
};

fn random_ip() -> String {
    let mut rng = rand::rng();
    format!(
        "10.{}.{}.{}",
        rng.random_range(0..=255u8),
        rng.random_range(0..=255u8),
        rng.random_range(1..=254u8)
    )
}

#[tokio::test]
async fn one_token_per_ip() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let (state, _) = setup_state(&url).await?;
    let ip = random_ip();
    let other_ip = loop {
        let candidate = random_ip();
        if candidate != ip {
            break candidate;
        }
    };

    let (created, token) = issue_or_get(&state, &ip).await?;
    assert!(created);
    assert_eq!(token.len(), 32);
    assert!(state.tokens.is_cached(&token).await);

    let (created_again, same) = issue_or_get(&state, &ip).await?;
    assert!(!created_again);
    assert_eq!(same, token);
    assert_eq!(bound_ip(&state.orm, token.clone()).await?, Some(ip.clone()));

    // Concurrent first requests from one address still bind a single token.
    let (a, b) = tokio::join!(issue_or_get(&state, &other_ip), issue_or_get(&state, &other_ip));
    let (a, b) = (a?, b?);
    assert_eq!(a.1, b.1);
    assert_ne!(a.1, token);
    assert_ne!(a.0, b.0);
    let rows = AccessTokens::find()
        .filter(TokenCol::IpAddress.eq(other_ip.as_str()))
        .count(&state.orm)
        .await?;
    assert_eq!(rows, 1);

    AccessTokens::delete_many()
        .filter(TokenCol::IpAddress.is_in([ip, other_ip]))
        .exec(&state.orm)
        .await?;
    Ok(())
}
