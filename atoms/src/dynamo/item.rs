use std::collections::HashMap;
use std::str::FromStr;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};

use super::keys;
use crate::categories::model::Category;
use crate::photos::model::{FeedCursor, Photo};

pub(crate) type Item = HashMap<String, AttributeValue>;

pub(crate) fn get_s(item: &Item, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
}

pub(crate) fn get_n<T: FromStr>(item: &Item, key: &str) -> Option<T> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
}

pub(crate) fn get_bool(item: &Item, key: &str) -> Option<bool> {
    item.get(key).and_then(|v| v.as_bool().ok()).copied()
}

/// Fixed-width RFC 3339 so that string order equals time order.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn feed_sort_key(photo: &Photo) -> String {
    format!("{}#{}", format_ts(&photo.created_at), photo.id)
}

/// Upper bound for `feed_sk < :before`. A bare timestamp sorts below every
/// `"{ts}#{id}"` sharing it, which keeps the strict `created_at <` meaning.
pub(crate) fn cursor_sort_key(cursor: &FeedCursor) -> String {
    match &cursor.id {
        Some(id) => format!("{}#{}", format_ts(&cursor.created_at), id),
        None => format_ts(&cursor.created_at),
    }
}

pub(crate) fn key(pk: &str, sk: &str) -> Item {
    let mut key = HashMap::new();
    key.insert("PK".to_string(), AttributeValue::S(pk.to_string()));
    key.insert("SK".to_string(), AttributeValue::S(sk.to_string()));
    key
}

pub(crate) fn photo_to_item(photo: &Photo) -> Item {
    let pk = keys::photo(&photo.id);
    let mut item = key(&pk, &pk);
    let mut put = |k: &str, v: AttributeValue| {
        item.insert(k.to_string(), v);
    };

    put("id", AttributeValue::S(photo.id.clone()));
    put("owner_id", AttributeValue::S(photo.owner_id.clone()));
    put("title", AttributeValue::S(photo.title.clone()));
    put("storage_path", AttributeValue::S(photo.storage_path.clone()));
    put("public_url", AttributeValue::S(photo.public_url.clone()));
    put("is_public", AttributeValue::Bool(photo.is_public));
    put("created_at", AttributeValue::S(format_ts(&photo.created_at)));
    put("owner_pk", AttributeValue::S(keys::owner(&photo.owner_id)));
    put("feed_sk", AttributeValue::S(feed_sort_key(photo)));

    // Sparse index: only public photos carry the feed partition key
    if photo.is_public {
        put("feed_pk", AttributeValue::S(keys::FEED_PUBLIC.to_string()));
    }
    if let Some(description) = &photo.description {
        put("description", AttributeValue::S(description.clone()));
    }
    if let Some(width) = photo.width {
        put("width", AttributeValue::N(width.to_string()));
    }
    if let Some(height) = photo.height {
        put("height", AttributeValue::N(height.to_string()));
    }
    if let Some(byte_size) = photo.byte_size {
        put("byte_size", AttributeValue::N(byte_size.to_string()));
    }
    item
}

pub(crate) fn photo_from_item(item: &Item) -> Option<Photo> {
    let created_at = DateTime::parse_from_rfc3339(&get_s(item, "created_at")?)
        .ok()?
        .with_timezone(&Utc);

    Some(Photo {
        id: get_s(item, "id")?,
        owner_id: get_s(item, "owner_id").unwrap_or_default(),
        title: get_s(item, "title").unwrap_or_default(),
        description: get_s(item, "description"),
        storage_path: get_s(item, "storage_path").unwrap_or_default(),
        public_url: get_s(item, "public_url").unwrap_or_default(),
        width: get_n(item, "width"),
        height: get_n(item, "height"),
        byte_size: get_n(item, "byte_size"),
        is_public: get_bool(item, "is_public").unwrap_or(false),
        created_at,
    })
}

pub(crate) fn category_from_item(item: &Item) -> Option<Category> {
    Some(Category {
        id: get_n(item, "id")?,
        name: get_s(item, "name")?,
        description: get_s(item, "description"),
        sort_order: get_n(item, "sort_order").unwrap_or(0),
    })
}

pub(crate) fn category_to_item(category: &Category) -> Item {
    let mut item = key(keys::CATEGORY_PARTITION, &keys::category(category.id));
    item.insert("id".to_string(), AttributeValue::N(category.id.to_string()));
    item.insert("name".to_string(), AttributeValue::S(category.name.clone()));
    item.insert(
        "sort_order".to_string(),
        AttributeValue::N(category.sort_order.to_string()),
    );
    if let Some(description) = &category.description {
        item.insert(
            "description".to_string(),
            AttributeValue::S(description.clone()),
        );
    }
    item
}
