//! Marketplace, lost & found, and messaging records

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ITEM_AVAILABLE: &str = "Available";
pub const POST_OPEN: &str = "Open";

/// Listing for sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: String,
}

/// Item in the public listing, with seller name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemListing {
    #[serde(flatten)]
    pub item: Item,
    pub seller_name: String,
}

/// Single item with seller contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub seller_name: String,
    pub seller_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewItem {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required.".to_string());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("Price must be a non-negative number.".to_string());
        }
        Ok(())
    }
}

/// Query string for `GET /api/items`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "maxPrice", default, deserialize_with = "empty_as_none")]
    pub max_price: Option<f64>,
}

/// Query params arrive as `?maxPrice=` from an untouched form field; empty means unset
fn empty_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(de)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostKind {
    Lost,
    Found,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Lost => "Lost",
            PostKind::Found => "Found",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Lost" => Some(PostKind::Lost),
            "Found" => Some(PostKind::Found),
            _ => None,
        }
    }
}

impl FromStr for PostKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostKind::parse(s).ok_or_else(|| format!("type must be Lost or Found, got {s:?}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostFoundPost {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date_lost_found: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub contact_info: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostFoundListing {
    #[serde(flatten)]
    pub post: LostFoundPost,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLostFound {
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Calendar date, `YYYY-MM-DD`
    #[serde(default)]
    pub date_lost_found: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
}

impl NewLostFound {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required.".to_string());
        }
        if let Some(date) = self.date_lost_found.as_deref().filter(|d| !d.is_empty()) {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| "date_lost_found must be YYYY-MM-DD.".to_string())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LostFoundFilter {
    #[serde(rename = "type", default, deserialize_with = "empty_as_none")]
    pub kind: Option<PostKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub item_id: Option<i64>,
    pub content: String,
    pub created_at: String,
}

/// Received message with sender name and the item it is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxMessage {
    #[serde(flatten)]
    pub message: Message,
    pub sender_name: String,
    pub item_title: Option<String>,
}

/// Body of `POST /api/messages`. There is no sender field: the sender is
/// always the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub receiver_id: i64,
    #[serde(default)]
    pub item_id: Option<i64>,
    pub content: String,
}

impl NewMessage {
    pub fn validate(&self) -> Result<(), String> {
        if self.content.trim().is_empty() {
            return Err("Message content is required.".to_string());
        }
        Ok(())
    }
}

/// Response for created records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Created {
    pub id: i64,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_validation() {
        let mut item = NewItem {
            title: "Calculus textbook".to_string(),
            description: None,
            price: 450.0,
            category: Some("Books".to_string()),
        };
        assert!(item.validate().is_ok());

        item.price = -1.0;
        assert!(item.validate().is_err());
        item.price = f64::NAN;
        assert!(item.validate().is_err());

        item.price = 0.0;
        item.title = "  ".to_string();
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_lost_found_date_validation() {
        let mut post = NewLostFound {
            kind: PostKind::Lost,
            title: "Blue umbrella".to_string(),
            description: None,
            location: Some("Block 9".to_string()),
            date_lost_found: Some("2025-03-14".to_string()),
            contact_info: None,
        };
        assert!(post.validate().is_ok());

        post.date_lost_found = Some("14/03/2025".to_string());
        assert!(post.validate().is_err());

        post.date_lost_found = None;
        assert!(post.validate().is_ok());
    }

    #[test]
    fn test_post_kind_wire_format() {
        let json = r#"{"type":"Found","title":"Keys"}"#;
        let post: NewLostFound = serde_json::from_str(json).unwrap();
        assert_eq!(post.kind, PostKind::Found);
        assert_eq!(PostKind::parse("Lost"), Some(PostKind::Lost));
        assert_eq!(PostKind::parse("lost"), None);
    }

    #[test]
    fn test_empty_query_values_mean_unset() {
        let filter: ItemFilter =
            serde_json::from_str(r#"{"category":"","search":"","maxPrice":""}"#).unwrap();
        assert_eq!(filter.max_price, None);

        let filter: ItemFilter = serde_json::from_str(r#"{"maxPrice":"250.5"}"#).unwrap();
        assert_eq!(filter.max_price, Some(250.5));

        let filter: ItemFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.max_price, None);

        assert!(serde_json::from_str::<ItemFilter>(r#"{"maxPrice":"cheap"}"#).is_err());

        let filter: LostFoundFilter = serde_json::from_str(r#"{"type":""}"#).unwrap();
        assert_eq!(filter.kind, None);
        let filter: LostFoundFilter = serde_json::from_str(r#"{"type":"Found"}"#).unwrap();
        assert_eq!(filter.kind, Some(PostKind::Found));
    }

    #[test]
    fn test_item_listing_flattens() {
        let listing = ItemListing {
            item: Item {
                id: 1,
                user_id: 2,
                title: "Lamp".to_string(),
                description: None,
                price: 10.0,
                category: None,
                image_url: None,
                status: ITEM_AVAILABLE.to_string(),
                created_at: "2025-01-01T00:00:00Z".to_string(),
            },
            seller_name: "Hari".to_string(),
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["title"], "Lamp");
        assert_eq!(json["seller_name"], "Hari");
    }
}
