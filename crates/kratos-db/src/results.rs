use sqlx::FromRow;

pub use kratos_data::QueryError;

#[derive(Debug, Clone, FromRow)]
pub struct Id<T> {
    pub id: T,
}
