//! Marketplace Storage
//! Mission: Parameterized SQL for items, lost & found posts and messages

use crate::db::{Database, StoreError};
use crate::marketplace::models::{
    InboxMessage, Item, ItemDetail, ItemFilter, ItemListing, LostFoundListing, LostFoundPost,
    Message, NewItem, NewLostFound, NewMessage, PostKind, ITEM_AVAILABLE, POST_OPEN,
};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};
use tracing::debug;

const ITEM_COLUMNS: &str = "i.id, i.user_id, i.title, i.description, i.price, i.category, \
                            i.image_url, i.status, i.created_at";
const POST_COLUMNS: &str = "p.id, p.user_id, p.type, p.title, p.description, p.location, \
                            p.date_lost_found, p.image_url, p.status, p.contact_info, p.created_at";

#[derive(Clone)]
pub struct MarketStore {
    db: Database,
}

impl MarketStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ===== Items =====

    pub fn create_item(&self, user_id: i64, item: &NewItem) -> Result<i64, StoreError> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO items (user_id, title, description, price, category, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                item.title.trim(),
                item.description,
                item.price,
                item.category,
                ITEM_AVAILABLE,
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )
        .map_err(StoreError::from_sqlite)?;

        let id = conn.last_insert_rowid();
        debug!("Item {} listed by user {}", id, user_id);
        Ok(id)
    }

    /// Available items, newest first
    pub fn list_items(&self, filter: &ItemFilter) -> Result<Vec<ItemListing>, StoreError> {
        let mut sql = format!(
            "SELECT {ITEM_COLUMNS}, u.name FROM items i
             JOIN users u ON i.user_id = u.id
             WHERE i.status = ?"
        );
        let mut args: Vec<Value> = vec![Value::Text(ITEM_AVAILABLE.to_string())];

        if let Some(category) = filter
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "All")
        {
            sql.push_str(" AND i.category = ?");
            args.push(Value::Text(category.to_string()));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            sql.push_str(" AND (i.title LIKE ? OR i.description LIKE ?)");
            let pattern = format!("%{search}%");
            args.push(Value::Text(pattern.clone()));
            args.push(Value::Text(pattern));
        }
        if let Some(max_price) = filter.max_price {
            sql.push_str(" AND i.price <= ?");
            args.push(Value::Real(max_price));
        }
        sql.push_str(" ORDER BY i.created_at DESC, i.id DESC");

        let conn = self.db.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args), |row| {
                Ok(ItemListing {
                    item: item_from_row(row)?,
                    seller_name: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_item(&self, id: i64) -> Result<Option<ItemDetail>, StoreError> {
        let conn = self.db.conn();
        let detail = conn
            .query_row(
                &format!(
                    "SELECT {ITEM_COLUMNS}, u.name, u.email FROM items i
                     JOIN users u ON i.user_id = u.id
                     WHERE i.id = ?1"
                ),
                params![id],
                |row| {
                    Ok(ItemDetail {
                        item: item_from_row(row)?,
                        seller_name: row.get(9)?,
                        seller_email: row.get(10)?,
                    })
                },
            )
            .optional()?;
        Ok(detail)
    }

    /// Every item the user listed, any status
    pub fn items_for_user(&self, user_id: i64) -> Result<Vec<Item>, StoreError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items i
             WHERE i.user_id = ?1
             ORDER BY i.created_at DESC, i.id DESC"
        ))?;
        let items = stmt
            .query_map(params![user_id], item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    // ===== Lost & Found =====

    pub fn create_lost_found(&self, user_id: i64, post: &NewLostFound) -> Result<i64, StoreError> {
        let date = post.date_lost_found.as_deref().filter(|d| !d.is_empty());

        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO lost_found
                (user_id, type, title, description, location, date_lost_found,
                 status, contact_info, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user_id,
                post.kind.as_str(),
                post.title.trim(),
                post.description,
                post.location,
                date,
                POST_OPEN,
                post.contact_info,
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )
        .map_err(StoreError::from_sqlite)?;

        Ok(conn.last_insert_rowid())
    }

    /// Open posts, newest first, optionally only one kind
    pub fn list_lost_found(
        &self,
        kind: Option<PostKind>,
    ) -> Result<Vec<LostFoundListing>, StoreError> {
        let mut sql = format!(
            "SELECT {POST_COLUMNS}, u.name FROM lost_found p
             JOIN users u ON p.user_id = u.id
             WHERE p.status = ?"
        );
        let mut args: Vec<Value> = vec![Value::Text(POST_OPEN.to_string())];
        if let Some(kind) = kind {
            sql.push_str(" AND p.type = ?");
            args.push(Value::Text(kind.as_str().to_string()));
        }
        sql.push_str(" ORDER BY p.created_at DESC, p.id DESC");

        let conn = self.db.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args), |row| {
                Ok(LostFoundListing {
                    post: post_from_row(row)?,
                    user_name: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ===== Messages =====

    /// `sender_id` comes from the verified token, never from the body.
    /// Unknown receiver or item fails with `StoreError::Constraint`.
    pub fn send_message(&self, sender_id: i64, message: &NewMessage) -> Result<i64, StoreError> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO messages (sender_id, receiver_id, item_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                sender_id,
                message.receiver_id,
                message.item_id,
                message.content,
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )
        .map_err(StoreError::from_sqlite)?;

        let id = conn.last_insert_rowid();
        debug!("Message {} from {} to {}", id, sender_id, message.receiver_id);
        Ok(id)
    }

    /// Messages received by the user, newest first
    pub fn inbox(&self, user_id: i64) -> Result<Vec<InboxMessage>, StoreError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT m.id, m.sender_id, m.receiver_id, m.item_id, m.content, m.created_at,
                    u.name, i.title
             FROM messages m
             JOIN users u ON m.sender_id = u.id
             LEFT JOIN items i ON m.item_id = i.id
             WHERE m.receiver_id = ?1
             ORDER BY m.created_at DESC, m.id DESC",
        )?;
        let messages = stmt
            .query_map(params![user_id], |row| {
                Ok(InboxMessage {
                    message: Message {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        receiver_id: row.get(2)?,
                        item_id: row.get(3)?,
                        content: row.get(4)?,
                        created_at: row.get(5)?,
                    },
                    sender_name: row.get(6)?,
                    item_title: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        category: row.get(5)?,
        image_url: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<LostFoundPost> {
    let raw: String = row.get(2)?;
    let kind = PostKind::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown lost_found type {raw:?}").into(),
        )
    })?;
    Ok(LostFoundPost {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        title: row.get(3)?,
        description: row.get(4)?,
        location: row.get(5)?,
        date_lost_found: row.get(6)?,
        image_url: row.get(7)?,
        status: row.get(8)?,
        contact_info: row.get(9)?,
        created_at: row.get(10)?,
    })
}
