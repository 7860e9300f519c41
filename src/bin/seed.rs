use axum_marketplace_api::{
    config::AppConfig,
    db::create_pool,
    entity::users::Role,
    middleware::auth::Claims,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin", true).await?;
    let seller_id = ensure_user(&pool, "shopkeeper", "seller@example.com", "seller", false).await?;
    let customer_id =
        ensure_user(&pool, "buyer", "customer@example.com", "customer", false).await?;

    ensure_seller_profile(&pool, seller_id, "The Corner Shop").await?;

    let category_id = ensure_category(&pool, "Electronics").await?;
    seed_products(&pool, seller_id, category_id).await?;

    println!("Seed completed.");
    let secret = &config.jwt_secret;
    println!(
        "admin token:    {}",
        dev_token(admin_id, Role::Admin, true, secret)?
    );
    println!(
        "seller token:   {}",
        dev_token(seller_id, Role::Seller, false, secret)?
    );
    println!(
        "customer token: {}",
        dev_token(customer_id, Role::Customer, false, secret)?
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    role: &str,
    is_staff: bool,
) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, role, is_staff)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, is_staff = EXCLUDED.is_staff
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(role)
    .bind(is_staff)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(row.0)
}

async fn ensure_seller_profile(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    shop_name: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO seller_profiles (id, user_id, shop_name, contact_number)
        VALUES ($1, $2, $3, '+4930123456789')
        ON CONFLICT (user_id) DO UPDATE SET shop_name = EXCLUDED.shop_name
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(shop_name)
    .execute(pool)
    .await?;
    Ok(())
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    seller_id: Uuid,
    category_id: Uuid,
) -> anyhow::Result<()> {
    let products = vec![
        ("Mechanical Keyboard", "Tenkeyless, brown switches", "89.90", 25),
        ("USB-C Dock", "Dual display, 100W passthrough", "129.00", 12),
        ("Noise-cancelling Headphones", "Over-ear, 30h battery", "199.50", 8),
        ("Webcam Cover", "Slide type, 3-pack", "4.99", 200),
    ];

    for (name, desc, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock_quantity, category_id, seller_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name, category_id, seller_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price.parse::<Decimal>()?)
        .bind(stock)
        .bind(category_id)
        .bind(seller_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

/// Mint a development bearer token, valid for 30 days. Token issuance in
/// production lives outside this service; this exists for local testing.
fn dev_token(user_id: Uuid, role: Role, is_staff: bool, secret: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        is_staff,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}
