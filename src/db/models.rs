use crate::db::schema::{Model, SchemaRegistry, TableDef};
use crate::db::session::Session;
use crate::error::DbError;
use chrono::{DateTime, Utc};
use libsql::{Row, Value};
use serde::{Deserialize, Serialize};

pub const TEXT_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS text (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR NOT NULL,
    content VARCHAR NOT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    teacher_id INTEGER NULL
);
"#;

pub const TEXT_CHUNK_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS textchunk (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text_id INTEGER NOT NULL REFERENCES text(id),
    content VARCHAR NOT NULL,
    sequence_number INTEGER NOT NULL,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_textchunk_text_id ON textchunk(text_id);
"#;

pub const USER_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username VARCHAR NOT NULL UNIQUE,
    email VARCHAR NOT NULL UNIQUE,
    full_name VARCHAR NOT NULL,
    is_teacher INTEGER NOT NULL DEFAULT 0,
    hashed_password VARCHAR NULL
);
"#;

pub const ADMIN_PRIVILEGE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS adminprivilege (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES user(id),
    granted_by_id INTEGER NULL REFERENCES user(id),
    granted_at TEXT NOT NULL, -- RFC3339
    grant_reason VARCHAR NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_adminprivilege_user_id ON adminprivilege(user_id);
"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub is_teacher: bool,
    pub hashed_password: Option<String>,
}

impl Model for User {
    const TABLE: TableDef = TableDef {
        name: "user",
        ddl: USER_DDL,
    };
}

impl User {
    pub async fn insert(&self, session: &Session) -> Result<i64, DbError> {
        let mut rows = session
            .query(
                "INSERT INTO user (username, email, full_name, is_teacher, hashed_password) VALUES (?, ?, ?, ?, ?) RETURNING id",
                vec![
                    Value::Text(self.username.clone()),
                    Value::Text(self.email.clone()),
                    Value::Text(self.full_name.clone()),
                    Value::Integer(i64::from(self.is_teacher)),
                    self.hashed_password.clone().map_or(Value::Null, Value::Text),
                ],
            )
            .await?;
        returned_id(&mut rows).await
    }

    pub async fn find_by_email(session: &Session, email: &str) -> Result<Option<Self>, DbError> {
        let mut rows = session
            .query(
                r#"SELECT id, username, email, full_name, is_teacher, hashed_password
                   FROM user WHERE email = ?"#,
                vec![Value::Text(email.to_string())],
            )
            .await?;
        rows.next().await?.map(|row| Self::from_row(&row)).transpose()
    }

    pub fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: Some(row.get::<i64>(0)?),
            username: row.get::<String>(1)?,
            email: row.get::<String>(2)?,
            full_name: row.get::<String>(3)?,
            is_teacher: row.get::<i64>(4)? != 0,
            hashed_password: optional_text(row.get_value(5)?)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminPrivilege {
    pub id: Option<i64>,
    pub user_id: i64,
    pub granted_by_id: Option<i64>,
    pub granted_at: DateTime<Utc>,
    pub grant_reason: String,
    pub is_active: bool,
}

impl Model for AdminPrivilege {
    const TABLE: TableDef = TableDef {
        name: "adminprivilege",
        ddl: ADMIN_PRIVILEGE_DDL,
    };
}

impl AdminPrivilege {
    pub async fn insert(&self, session: &Session) -> Result<i64, DbError> {
        let mut rows = session
            .query(
                r#"INSERT INTO adminprivilege (user_id, granted_by_id, granted_at, grant_reason, is_active)
                   VALUES (?, ?, ?, ?, ?) RETURNING id"#,
                vec![
                    Value::Integer(self.user_id),
                    self.granted_by_id.map_or(Value::Null, Value::Integer),
                    Value::Text(self.granted_at.to_rfc3339()),
                    Value::Text(self.grant_reason.clone()),
                    Value::Integer(i64::from(self.is_active)),
                ],
            )
            .await?;
        returned_id(&mut rows).await
    }

    /// True once any privilege row exists, active or not.
    pub async fn any_exists(session: &Session) -> Result<bool, DbError> {
        let mut rows = session
            .query("SELECT 1 FROM adminprivilege LIMIT 1", ())
            .await?;
        Ok(rows.next().await?.is_some())
    }

    pub async fn list_active(session: &Session) -> Result<Vec<Self>, DbError> {
        let mut rows = session
            .query(
                r#"SELECT id, user_id, granted_by_id, granted_at, grant_reason, is_active
                   FROM adminprivilege WHERE is_active = 1 ORDER BY id"#,
                (),
            )
            .await?;
        let mut admins = Vec::new();
        while let Some(row) = rows.next().await? {
            admins.push(Self::from_row(&row)?);
        }
        Ok(admins)
    }

    pub fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: Some(row.get::<i64>(0)?),
            user_id: row.get::<i64>(1)?,
            granted_by_id: optional_integer(row.get_value(2)?)?,
            granted_at: parse_timestamp(&row.get::<String>(3)?)?,
            grant_reason: row.get::<String>(4)?,
            is_active: row.get::<i64>(5)? != 0,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Text {
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub teacher_id: Option<i64>,
}

impl Model for Text {
    const TABLE: TableDef = TableDef {
        name: "text",
        ddl: TEXT_DDL,
    };
}

impl Text {
    /// Insert and return the assigned id.
    pub async fn insert(&self, session: &Session) -> Result<i64, DbError> {
        let mut rows = session
            .query(
                "INSERT INTO text (title, content, created_at, teacher_id) VALUES (?, ?, ?, ?) RETURNING id",
                vec![
                    Value::Text(self.title.clone()),
                    Value::Text(self.content.clone()),
                    Value::Text(self.created_at.to_rfc3339()),
                    self.teacher_id.map_or(Value::Null, Value::Integer),
                ],
            )
            .await?;
        returned_id(&mut rows).await
    }

    pub async fn get(session: &Session, id: i64) -> Result<Option<Self>, DbError> {
        let mut rows = session
            .query(
                "SELECT id, title, content, created_at, teacher_id FROM text WHERE id = ?",
                vec![Value::Integer(id)],
            )
            .await?;
        rows.next().await?.map(|row| Self::from_row(&row)).transpose()
    }

    pub fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: Some(row.get::<i64>(0)?),
            title: row.get::<String>(1)?,
            content: row.get::<String>(2)?,
            created_at: parse_timestamp(&row.get::<String>(3)?)?,
            teacher_id: optional_integer(row.get_value(4)?)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextChunk {
    pub id: Option<i64>,
    pub text_id: i64,
    pub content: String,
    pub sequence_number: i64,
    pub created_at: DateTime<Utc>,
}

impl Model for TextChunk {
    const TABLE: TableDef = TableDef {
        name: "textchunk",
        ddl: TEXT_CHUNK_DDL,
    };
}

impl TextChunk {
    pub async fn insert(&self, session: &Session) -> Result<i64, DbError> {
        let mut rows = session
            .query(
                "INSERT INTO textchunk (text_id, content, sequence_number, created_at) VALUES (?, ?, ?, ?) RETURNING id",
                vec![
                    Value::Integer(self.text_id),
                    Value::Text(self.content.clone()),
                    Value::Integer(self.sequence_number),
                    Value::Text(self.created_at.to_rfc3339()),
                ],
            )
            .await?;
        returned_id(&mut rows).await
    }

    /// Chunks of one text in reading order.
    pub async fn list_for_text(session: &Session, text_id: i64) -> Result<Vec<Self>, DbError> {
        let mut rows = session
            .query(
                r#"SELECT id, text_id, content, sequence_number, created_at
                   FROM textchunk WHERE text_id = ? ORDER BY sequence_number"#,
                vec![Value::Integer(text_id)],
            )
            .await?;
        let mut chunks = Vec::new();
        while let Some(row) = rows.next().await? {
            chunks.push(Self::from_row(&row)?);
        }
        Ok(chunks)
    }

    pub fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: Some(row.get::<i64>(0)?),
            text_id: row.get::<i64>(1)?,
            content: row.get::<String>(2)?,
            sequence_number: row.get::<i64>(3)?,
            created_at: parse_timestamp(&row.get::<String>(4)?)?,
        })
    }
}

/// Registry holding every entity this application persists.
pub fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .register::<User>()
        .register::<AdminPrivilege>()
        .register::<Text>()
        .register::<TextChunk>();
    registry
}

async fn returned_id(rows: &mut libsql::Rows) -> Result<i64, DbError> {
    let row = rows
        .next()
        .await?
        .ok_or_else(|| DbError::Decode("insert returned no id".to_string()))?;
    Ok(row.get::<i64>(0)?)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Decode(format!("bad timestamp {s:?}: {e}")))
}

fn optional_integer(value: Value) -> Result<Option<i64>, DbError> {
    match value {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(i)),
        other => Err(DbError::Decode(format!("expected integer, got {other:?}"))),
    }
}

fn optional_text(value: Value) -> Result<Option<String>, DbError> {
    match value {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(DbError::Decode(format!("expected text, got {other:?}"))),
    }
}
