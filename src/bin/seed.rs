use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_rental_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user_with_role(&pool, "Admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user_with_role(&pool, "Demo Customer", "user@example.com", "user123", "user").await?;
    seed_fleet(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_fleet(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let types = vec![
        ("Economy", "Small city cars, light on fuel", "45.00"),
        ("SUV", "Room for the whole family and the luggage", "85.00"),
        ("Van", "Up to nine seats for group trips", "110.00"),
        ("Luxury", "Premium sedans for special occasions", "180.00"),
    ];

    let mut type_ids = Vec::new();
    for (name, desc, price) in types {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO vehicle_types (id, name, description, base_price_per_day)
            VALUES ($1, $2, $3, $4::numeric)
            ON CONFLICT (name) DO UPDATE SET base_price_per_day = EXCLUDED.base_price_per_day
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .fetch_one(pool)
        .await?;
        type_ids.push(id);
    }

    let vehicles = vec![
        (type_ids[0], "Toyota", "Yaris", 2022, "EC-101-RA", "White", 5, "48.00"),
        (type_ids[0], "Kia", "Picanto", 2023, "EC-102-RA", "Red", 4, "45.00"),
        (type_ids[1], "Honda", "CR-V", 2021, "SU-201-RA", "Black", 5, "89.00"),
        (type_ids[2], "Ford", "Transit", 2020, "VN-301-RA", "Silver", 9, "115.00"),
        (type_ids[3], "BMW", "530i", 2023, "LX-401-RA", "Blue", 5, "185.00"),
    ];

    for (type_id, make, model, year, plate, color, seats, price) in vehicles {
        sqlx::query(
            r#"
            INSERT INTO vehicles
                (id, vehicle_type_id, make, model, year, license_plate, color, seats, price_per_day)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::numeric)
            ON CONFLICT (license_plate) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(type_id)
        .bind(make)
        .bind(model)
        .bind(year)
        .bind(plate)
        .bind(color)
        .bind(seats)
        .bind(price)
        .execute(pool)
        .await?;
    }

    println!("Seeded vehicle types and fleet");
    Ok(())
}
