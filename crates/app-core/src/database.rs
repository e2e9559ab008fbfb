//! Database engine bootstrap and startup schema creation.

use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};

pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub sqlx_logging: bool,
}

pub async fn connect(settings: DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(settings.url);
    opt.max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .sqlx_logging(settings.sqlx_logging)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;
    tracing::info!("Database connection established");

    Ok(db)
}

type TableFactory = fn(&Schema) -> TableCreateStatement;

fn table_of<E: EntityTrait>(schema: &Schema) -> TableCreateStatement {
    schema.create_table_from_entity(E::default())
}

/// The set of entities whose tables are created at startup.
#[derive(Default)]
pub struct SchemaRegistry {
    tables: Vec<TableFactory>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E: EntityTrait>(mut self) -> Self {
        self.tables.push(table_of::<E>);
        self
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Issues `CREATE TABLE IF NOT EXISTS` for every registered entity, in
    /// registration order. Existing tables are left untouched.
    pub async fn create_all<C: ConnectionTrait>(&self, db: &C) -> Result<(), DbErr> {
        let backend = db.get_database_backend();
        let schema = Schema::new(backend);

        for table in &self.tables {
            let mut stmt = table(&schema);
            stmt.if_not_exists();
            db.execute(backend.build(&stmt)).await?;
        }

        tracing::info!("Schema ensured for {} table(s)", self.tables.len());
        Ok(())
    }
}
