use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

use crate::domain::{DataAccessError, Entity, Person, PersonId, PersonRepository, Version};

#[derive(Clone, Debug)]
pub struct SqlitePersonRepository {
    pool: SqlitePool,
}

impl SqlitePersonRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PersonRow {
    id: i64,
    version: i64,
    name: String,
    email: String,
}

impl From<PersonRow> for Person {
    fn from(value: PersonRow) -> Self {
        Person::new(
            PersonId::from(value.id),
            Version::from(value.version),
            value.name,
            value.email,
        )
    }
}

#[async_trait]
impl PersonRepository for SqlitePersonRepository {
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>, DataAccessError> {
        let row = sqlx::query_as::<_, PersonRow>(
            "SELECT id, version, name, email FROM person WHERE id = ?",
        )
        .bind(*id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Person::from))
    }

    async fn find_by_identity(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<Person>, DataAccessError> {
        let row = sqlx::query_as::<_, PersonRow>(
            "SELECT id, version, name, email FROM person \
             WHERE name = ? AND email = ? ORDER BY id LIMIT 1",
        )
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Person::from))
    }

    async fn update(&self, entity: &mut Person) -> Result<(), DataAccessError> {
        let result = sqlx::query(
            "UPDATE person SET name = ?, email = ?, version = version + 1 \
             WHERE id = ? AND version = ?",
        )
        .bind(entity.name())
        .bind(entity.email())
        .bind(*entity.id())
        .bind(*entity.version())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DataAccessError::Conflict {
                entity: Person::ENTITY_NAME,
                id: *entity.id(),
                expected: entity.version(),
            });
        }
        entity.advance_version();
        Ok(())
    }
}
