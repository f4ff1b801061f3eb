// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (SQLite via sqlx) with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, placeholder members, refresh-token storage)
//! - Family graph (directed owner->member edges)
//! - Medical documents (+ attached medicines)
//! - Health data samples
//! - Chat history
//!
//! Every operation is scoped by the owning user id where the data model
//! requires it; a scoped lookup that matches nothing surfaces as
//! `AppError::NotFound`. Multi-write operations run inside a single
//! transaction so a mid-operation failure leaves the store unchanged.

use crate::error::AppError;
use crate::models::{
    ChatMessage, DocumentRecord, FamilyEdge, HealthData, Medicine, User, SELF_EDGE_ID,
    SELF_RELATION,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// New user row, password already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password_hash: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

/// Partial profile update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

/// Family edge update; edge label and member profile fields together.
#[derive(Debug, Clone, Default)]
pub struct EdgeUpdate {
    pub relation: Option<String>,
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

/// New document metadata, locator already built by the caller.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: i64,
    pub family_member_id: i64,
    pub document_name: String,
    pub document_type: String,
    pub document_date: NaiveDate,
    pub description: Option<String>,
    pub file_path: String,
    pub file_size: i64,
}

/// Medicine line item attached to a document at registration time.
#[derive(Debug, Clone)]
pub struct NewMedicine {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
}

/// New health metric sample.
#[derive(Debug, Clone)]
pub struct NewHealthData {
    pub user_id: i64,
    pub family_member_id: i64,
    pub data_type: String,
    pub value: f64,
    pub unit: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub source: Option<String>,
}

/// Database client.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Connect to the database and run pending migrations.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Database(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect: {}", e)))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// In-memory database for tests. A single connection keeps the
    /// `:memory:` store alive and shared for the life of the pool.
    pub async fn connect_in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Database(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect: {}", e)))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))?;

        Ok(Self { pool })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by id.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Find a user by phone number.
    pub async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone_number = ?")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Insert a new user. Uniqueness of phone/email/username is enforced by
    /// the schema and surfaces as `Conflict`.
    pub async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users \
             (full_name, phone_number, email, username, password_hash, \
              date_of_birth, gender, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?) \
             RETURNING *",
        )
        .bind(&new.full_name)
        .bind(&new.phone_number)
        .bind(&new.email)
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(new.date_of_birth)
        .bind(&new.gender)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Update profile fields; absent fields keep their current value.
    pub async fn update_user_profile(
        &self,
        user_id: i64,
        upd: ProfileUpdate,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET \
             full_name = COALESCE(?, full_name), \
             email = COALESCE(?, email), \
             username = COALESCE(?, username), \
             date_of_birth = COALESCE(?, date_of_birth), \
             gender = COALESCE(?, gender), \
             updated_at = ? \
             WHERE id = ? \
             RETURNING *",
        )
        .bind(&upd.full_name)
        .bind(&upd.email)
        .bind(&upd.username)
        .bind(upd.date_of_birth)
        .bind(&upd.gender)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        Ok(user)
    }

    /// Overwrite the stored refresh token. The previous value becomes
    /// unverifiable against the store, which is the whole revocation model.
    pub async fn set_refresh_token(
        &self,
        user_id: i64,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ?")
            .bind(token)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    // ─── Family Graph ────────────────────────────────────────────

    /// List the owner's family edges: the synthetic self edge (id 0,
    /// relation "self") first, then real edges in creation order.
    pub async fn list_family(&self, owner_id: i64) -> Result<Vec<FamilyEdge>, AppError> {
        let owner = self
            .get_user(owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", owner_id)))?;

        let mut edges = vec![FamilyEdge {
            id: SELF_EDGE_ID,
            user_id: owner.id,
            member_id: owner.id,
            relation: SELF_RELATION.to_string(),
            member_name: owner.full_name,
            member_phone: owner.phone_number,
            member_date_of_birth: owner.date_of_birth,
            member_gender: owner.gender,
            created_at: owner.created_at,
        }];

        let real = sqlx::query_as::<_, FamilyEdge>(
            "SELECT f.id, f.user_id, f.member_id, f.relation, \
                    u.full_name AS member_name, u.phone_number AS member_phone, \
                    u.date_of_birth AS member_date_of_birth, u.gender AS member_gender, \
                    f.created_at \
             FROM family_members f JOIN users u ON u.id = f.member_id \
             WHERE f.user_id = ? \
             ORDER BY f.id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        edges.extend(real);
        Ok(edges)
    }

    /// Get a single owned edge (joined with member profile).
    pub async fn get_family_edge(
        &self,
        owner_id: i64,
        edge_id: i64,
    ) -> Result<Option<FamilyEdge>, AppError> {
        let edge = sqlx::query_as::<_, FamilyEdge>(
            "SELECT f.id, f.user_id, f.member_id, f.relation, \
                    u.full_name AS member_name, u.phone_number AS member_phone, \
                    u.date_of_birth AS member_date_of_birth, u.gender AS member_gender, \
                    f.created_at \
             FROM family_members f JOIN users u ON u.id = f.member_id \
             WHERE f.id = ? AND f.user_id = ?",
        )
        .bind(edge_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(edge)
    }

    /// Resolve an edge id on behalf of a caller, including the synthetic
    /// self edge. This is the single authorization rule: the edge must be
    /// owned by the caller, and a miss is `NotFound`, never "forbidden".
    pub async fn resolve_edge(&self, owner_id: i64, edge_id: i64) -> Result<(), AppError> {
        if edge_id == SELF_EDGE_ID {
            return Ok(());
        }
        self.get_family_edge(owner_id, edge_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Family member not found".to_string()))
    }

    /// Add a family member edge.
    ///
    /// If `member.phone_number` matches an existing user, that user is
    /// reused as the member, and a duplicate `(owner, member)` edge is a
    /// conflict; only this path can collide. Otherwise a placeholder user
    /// is created to anchor the member's records. Both writes happen in one
    /// transaction.
    pub async fn add_family_member(
        &self,
        owner_id: i64,
        member: NewUser,
        relation: &str,
    ) -> Result<FamilyEdge, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let existing: Option<User> = match member.phone_number.as_deref() {
            Some(phone) => {
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone_number = ?")
                    .bind(phone)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => None,
        };

        let member_id = match existing {
            Some(user) => {
                if user.id == owner_id {
                    return Err(AppError::BadRequest(
                        "Cannot add yourself as a family member".to_string(),
                    ));
                }
                let duplicate =
                    sqlx::query("SELECT 1 FROM family_members WHERE user_id = ? AND member_id = ?")
                        .bind(owner_id)
                        .bind(user.id)
                        .fetch_optional(&mut *tx)
                        .await?;
                if duplicate.is_some() {
                    return Err(AppError::Conflict(
                        "Family member already added".to_string(),
                    ));
                }
                user.id
            }
            None => {
                let row: (i64,) = sqlx::query_as(
                    "INSERT INTO users \
                     (full_name, phone_number, email, username, password_hash, \
                      date_of_birth, gender, is_active, created_at, updated_at) \
                     VALUES (?, ?, NULL, NULL, ?, ?, ?, 1, ?, ?) \
                     RETURNING id",
                )
                .bind(&member.full_name)
                .bind(&member.phone_number)
                .bind(&member.password_hash)
                .bind(member.date_of_birth)
                .bind(&member.gender)
                .bind(now)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;
                row.0
            }
        };

        let (edge_id,): (i64,) = sqlx::query_as(
            "INSERT INTO family_members (user_id, member_id, relation, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(owner_id)
        .bind(member_id)
        .bind(relation)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let edge = sqlx::query_as::<_, FamilyEdge>(
            "SELECT f.id, f.user_id, f.member_id, f.relation, \
                    u.full_name AS member_name, u.phone_number AS member_phone, \
                    u.date_of_birth AS member_date_of_birth, u.gender AS member_gender, \
                    f.created_at \
             FROM family_members f JOIN users u ON u.id = f.member_id \
             WHERE f.id = ?",
        )
        .bind(edge_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(edge)
    }

    /// Update an owned edge: relationship label and member profile fields
    /// in the same operation. The synthetic self edge is virtual and never
    /// matches.
    pub async fn update_family_edge(
        &self,
        owner_id: i64,
        edge_id: i64,
        upd: EdgeUpdate,
    ) -> Result<FamilyEdge, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let member_id: Option<(i64,)> =
            sqlx::query_as("SELECT member_id FROM family_members WHERE id = ? AND user_id = ?")
                .bind(edge_id)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await?;
        let member_id = member_id
            .ok_or_else(|| AppError::NotFound("Family member not found".to_string()))?
            .0;

        sqlx::query(
            "UPDATE family_members SET relation = COALESCE(?, relation), updated_at = ? \
             WHERE id = ?",
        )
        .bind(&upd.relation)
        .bind(now)
        .bind(edge_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users SET \
             full_name = COALESCE(?, full_name), \
             date_of_birth = COALESCE(?, date_of_birth), \
             gender = COALESCE(?, gender), \
             updated_at = ? \
             WHERE id = ?",
        )
        .bind(&upd.full_name)
        .bind(upd.date_of_birth)
        .bind(&upd.gender)
        .bind(now)
        .bind(member_id)
        .execute(&mut *tx)
        .await?;

        let edge = sqlx::query_as::<_, FamilyEdge>(
            "SELECT f.id, f.user_id, f.member_id, f.relation, \
                    u.full_name AS member_name, u.phone_number AS member_phone, \
                    u.date_of_birth AS member_date_of_birth, u.gender AS member_gender, \
                    f.created_at \
             FROM family_members f JOIN users u ON u.id = f.member_id \
             WHERE f.id = ?",
        )
        .bind(edge_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(edge)
    }

    /// Delete an owned edge. The member user and any documents anchored to
    /// the edge are deliberately left in place (no cascade).
    pub async fn delete_family_edge(&self, owner_id: i64, edge_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM family_members WHERE id = ? AND user_id = ?")
            .bind(edge_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Family member not found".to_string()));
        }
        Ok(())
    }

    // ─── Medical Documents ───────────────────────────────────────

    /// Register document metadata, with any medicine line items, in one
    /// transaction.
    pub async fn insert_document(
        &self,
        doc: NewDocument,
        medicines: &[NewMedicine],
    ) -> Result<DocumentRecord, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, DocumentRecord>(
            "INSERT INTO medical_documents \
             (user_id, family_member_id, document_name, document_type, document_date, \
              description, file_path, file_size, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING *",
        )
        .bind(doc.user_id)
        .bind(doc.family_member_id)
        .bind(&doc.document_name)
        .bind(&doc.document_type)
        .bind(doc.document_date)
        .bind(&doc.description)
        .bind(&doc.file_path)
        .bind(doc.file_size)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for medicine in medicines {
            sqlx::query(
                "INSERT INTO medicines (document_id, name, dosage, frequency, duration, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(record.id)
            .bind(&medicine.name)
            .bind(&medicine.dosage)
            .bind(&medicine.frequency)
            .bind(&medicine.duration)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(record)
    }

    /// List documents for an owned edge, newest document date first.
    pub async fn list_documents(
        &self,
        owner_id: i64,
        edge_id: i64,
    ) -> Result<Vec<DocumentRecord>, AppError> {
        let docs = sqlx::query_as::<_, DocumentRecord>(
            "SELECT * FROM medical_documents \
             WHERE user_id = ? AND family_member_id = ? \
             ORDER BY document_date DESC",
        )
        .bind(owner_id)
        .bind(edge_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    /// Get a single owned document.
    pub async fn get_document(
        &self,
        owner_id: i64,
        document_id: i64,
    ) -> Result<Option<DocumentRecord>, AppError> {
        let doc = sqlx::query_as::<_, DocumentRecord>(
            "SELECT * FROM medical_documents WHERE id = ? AND user_id = ?",
        )
        .bind(document_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    /// Medicines attached to a document.
    pub async fn list_medicines(&self, document_id: i64) -> Result<Vec<Medicine>, AppError> {
        let medicines =
            sqlx::query_as::<_, Medicine>("SELECT * FROM medicines WHERE document_id = ?")
                .bind(document_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(medicines)
    }

    /// Delete an owned document and its medicines in one transaction. The
    /// storage object is not touched.
    pub async fn delete_document(&self, owner_id: i64, document_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM medical_documents WHERE id = ? AND user_id = ?")
                .bind(document_id)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Err(AppError::NotFound("Document not found".to_string()));
        }

        sqlx::query("DELETE FROM medicines WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM medical_documents WHERE id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // ─── Health Data ─────────────────────────────────────────────

    /// Record a health metric sample.
    pub async fn insert_health_data(&self, new: NewHealthData) -> Result<HealthData, AppError> {
        let sample = sqlx::query_as::<_, HealthData>(
            "INSERT INTO health_data \
             (user_id, family_member_id, data_type, value, unit, recorded_at, source, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING *",
        )
        .bind(new.user_id)
        .bind(new.family_member_id)
        .bind(&new.data_type)
        .bind(new.value)
        .bind(&new.unit)
        .bind(new.recorded_at)
        .bind(&new.source)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(sample)
    }

    /// List health samples for an owner, newest first, optionally filtered
    /// by edge and data type.
    pub async fn list_health_data(
        &self,
        owner_id: i64,
        edge_id: Option<i64>,
        data_type: Option<&str>,
    ) -> Result<Vec<HealthData>, AppError> {
        let mut sql = String::from("SELECT * FROM health_data WHERE user_id = ?");
        if edge_id.is_some() {
            sql.push_str(" AND family_member_id = ?");
        }
        if data_type.is_some() {
            sql.push_str(" AND data_type = ?");
        }
        sql.push_str(" ORDER BY recorded_at DESC");

        let mut query = sqlx::query_as::<_, HealthData>(&sql).bind(owner_id);
        if let Some(edge) = edge_id {
            query = query.bind(edge);
        }
        if let Some(kind) = data_type {
            query = query.bind(kind.to_string());
        }

        let samples = query.fetch_all(&self.pool).await?;
        Ok(samples)
    }

    // ─── Chat History ────────────────────────────────────────────

    /// Persist one completed chat exchange.
    pub async fn insert_chat_message(
        &self,
        owner_id: i64,
        edge_id: i64,
        user_message: &str,
        bot_response: &str,
    ) -> Result<ChatMessage, AppError> {
        let message = sqlx::query_as::<_, ChatMessage>(
            "INSERT INTO chat_messages \
             (user_id, family_member_id, user_message, bot_response, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING *",
        )
        .bind(owner_id)
        .bind(edge_id)
        .bind(user_message)
        .bind(bot_response)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    /// Stored chat turns for `(owner, edge)` in conversation order.
    pub async fn list_chat_history(
        &self,
        owner_id: i64,
        edge_id: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let history = sqlx::query_as::<_, ChatMessage>(
            "SELECT * FROM chat_messages \
             WHERE user_id = ? AND family_member_id = ? \
             ORDER BY created_at, id",
        )
        .bind(owner_id)
        .bind(edge_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(history)
    }
}
