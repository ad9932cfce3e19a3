//! Master roster store
//!
//! The roster is the source of stable student identities independent of
//! scanning. It feeds the roster-driven attendance path and the card
//! printer.

use crate::error::{Error, Result};
use crate::identity::Gender;
use crate::record::MasterStudent;
use sqlx::SqlitePool;

/// Insert or update a roster entry by its stable id
pub async fn upsert_student(pool: &SqlitePool, student: &MasterStudent) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO master_students (id, name, class, gender)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            class = excluded.class,
            gender = excluded.gender
        "#,
    )
    .bind(&student.id)
    .bind(&student.name)
    .bind(&student.class)
    .bind(student.gender.as_letter())
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up one roster entry
pub async fn get_student(pool: &SqlitePool, id: &str) -> Result<Option<MasterStudent>> {
    let row: Option<(String, String, String, String)> =
        sqlx::query_as("SELECT id, name, class, gender FROM master_students WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    row.map(row_to_student).transpose()
}

/// All roster entries, ordered by class then name
pub async fn list_students(pool: &SqlitePool) -> Result<Vec<MasterStudent>> {
    let rows: Vec<(String, String, String, String)> = sqlx::query_as(
        "SELECT id, name, class, gender FROM master_students ORDER BY class ASC, name ASC",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_student).collect()
}

fn row_to_student(row: (String, String, String, String)) -> Result<MasterStudent> {
    let (id, name, class, gender) = row;
    let gender = Gender::from_letter(&gender)
        .ok_or_else(|| Error::Internal(format!("corrupt gender in roster: {}", gender)))?;
    Ok(MasterStudent {
        id,
        name,
        class,
        gender,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_tables;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_upsert_and_get_student() {
        let pool = setup_pool().await;
        let student = MasterStudent {
            id: "ahmad_x1".to_string(),
            name: "Ahmad".to_string(),
            class: "X.1".to_string(),
            gender: Gender::Male,
        };
        upsert_student(&pool, &student).await.unwrap();

        let found = get_student(&pool, "ahmad_x1").await.unwrap().unwrap();
        assert_eq!(found, student);

        assert!(get_student(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let pool = setup_pool().await;
        let mut student = MasterStudent {
            id: "ahmad_x1".to_string(),
            name: "Ahmad".to_string(),
            class: "X.1".to_string(),
            gender: Gender::Male,
        };
        upsert_student(&pool, &student).await.unwrap();

        student.class = "XI.1".to_string();
        upsert_student(&pool, &student).await.unwrap();

        let all = list_students(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].class, "XI.1");
    }

    #[tokio::test]
    async fn test_list_ordered_by_class_then_name() {
        let pool = setup_pool().await;
        for (id, name, class) in [
            ("c", "Citra", "XI.2"),
            ("a", "Budi", "X.1"),
            ("b", "Ahmad", "X.1"),
        ] {
            upsert_student(
                &pool,
                &MasterStudent {
                    id: id.to_string(),
                    name: name.to_string(),
                    class: class.to_string(),
                    gender: Gender::Female,
                },
            )
            .await
            .unwrap();
        }

        let names: Vec<String> = list_students(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Ahmad", "Budi", "Citra"]);
    }
}
