use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, sea_query::OnConflict,
};
use shophub_api::{
    config::database_url_from_env,
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        product_images::{ActiveModel as ImageActive, Column as ImageCol, Entity as ProductImages},
        products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
    },
};
use uuid::Uuid;

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    price: i64,
    stock: i32,
    images: &'static [&'static str],
}

const CATALOG: &[(&str, &str, &[SeedProduct])] = &[
    (
        "Kitchen",
        "kitchen",
        &[
            SeedProduct {
                name: "Enamel Mug",
                slug: "enamel-mug",
                price: 1_250,
                stock: 40,
                images: &["/static/products/enamel-mug-1.jpg", "/static/products/enamel-mug-2.jpg"],
            },
            SeedProduct {
                name: "Pour Over Kettle",
                slug: "pour-over-kettle",
                price: 4_900,
                stock: 8,
                images: &["/static/products/pour-over-kettle.jpg"],
            },
        ],
    ),
    (
        "Outdoors",
        "outdoors",
        &[
            SeedProduct {
                name: "Canvas Backpack",
                slug: "canvas-backpack",
                price: 8_900,
                stock: 15,
                images: &["/static/products/canvas-backpack.jpg"],
            },
            SeedProduct {
                name: "Trail Headlamp",
                slug: "trail-headlamp",
                price: 2_999,
                stock: 2,
                images: &[],
            },
        ],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let orm = create_orm_conn(&database_url_from_env()?).await?;
    run_migrations(&orm).await?;

    let mut products = 0;
    for (name, slug, items) in CATALOG {
        let category_id = ensure_category(&orm, name, slug).await?;
        for item in *items {
            ensure_product(&orm, category_id, item).await?;
            products += 1;
        }
    }

    println!("Seed completed. {} categories, {products} products", CATALOG.len());
    Ok(())
}

async fn ensure_category(orm: &DatabaseConnection, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    Categories::insert(CategoryActive {
        id: Set(Uuid::now_v7()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
    })
    .on_conflict(OnConflict::column(CategoryCol::Slug).do_nothing().to_owned())
    .exec_without_returning(orm)
    .await?;

    let category = Categories::find()
        .filter(CategoryCol::Slug.eq(slug))
        .one(orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("category {slug} missing after insert"))?;
    Ok(category.id)
}

async fn ensure_product(
    orm: &DatabaseConnection,
    category_id: Uuid,
    item: &SeedProduct,
) -> anyhow::Result<()> {
    Products::insert(ProductActive {
        id: Set(Uuid::now_v7()),
        category_id: Set(category_id),
        name: Set(item.name.to_string()),
        slug: Set(item.slug.to_string()),
        price: Set(item.price),
        stock: Set(item.stock),
        image_url: Set(item.images.first().map(|url| url.to_string())),
        created_at: Set(Utc::now().into()),
    })
    .on_conflict(OnConflict::column(ProductCol::Slug).do_nothing().to_owned())
    .exec_without_returning(orm)
    .await?;

    let product = Products::find()
        .filter(ProductCol::Slug.eq(item.slug))
        .one(orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {} missing after insert", item.slug))?;

    let existing = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product.id))
        .count(orm)
        .await?;
    if existing == 0 {
        for url in item.images {
            ImageActive {
                id: Set(Uuid::now_v7()),
                product_id: Set(product.id),
                url: Set(url.to_string()),
            }
            .insert(orm)
            .await?;
        }
    }
    Ok(())
}
