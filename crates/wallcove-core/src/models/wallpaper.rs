use serde::{Deserialize, Serialize};

/// A wallpaper as the server describes it.
///
/// Boolean-ish flags (`is_premium`, `is_favorited`, `is_liked`) come over
/// the wire as 0/1 integers; use the accessor methods instead of comparing
/// the raw fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Wallpaper {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub downloads: i64,
    /// 0/1 wire flag.
    #[serde(default)]
    pub is_premium: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// 0/1 wire flag; only meaningful on endpoints that know the caller.
    #[serde(default)]
    pub is_favorited: i64,
    /// 0/1 wire flag; only meaningful on endpoints that know the caller.
    #[serde(default)]
    pub is_liked: i64,
    #[serde(default)]
    pub likes_count: i64,
}

impl Wallpaper {
    pub fn premium(&self) -> bool {
        self.is_premium != 0
    }

    pub fn favorited(&self) -> bool {
        self.is_favorited != 0
    }

    pub fn liked(&self) -> bool {
        self.is_liked != 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Pagination {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// Whether another page can be requested.
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// One page of a wallpaper feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct WallpaperPage {
    pub wallpapers: Vec<Wallpaper>,
    pub pagination: Pagination,
}

/// A comment left on a wallpaper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub wallpaper_id: Option<i64>,
    /// Author id; compare against the session user id to decide whether the
    /// delete action applies.
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Minimal status/message envelope returned by mutation endpoints
/// (favorites, likes, comments, account updates). Returned to the caller
/// as-is so the shell can show the server's own wording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Ack {
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_flags_decode_as_bools() {
        let json = r#"{
            "id": 12,
            "title": "Mountain Dusk",
            "description": "Alpine ridge at golden hour",
            "image_url": "https://cdn.wallcove.app/w/12.jpg",
            "category_id": 3,
            "user_id": null,
            "views": 4210,
            "downloads": 385,
            "is_premium": 1,
            "created_at": "2025-11-02T09:14:00Z",
            "updated_at": "2025-11-20T16:02:00Z",
            "is_favorited": 1,
            "is_liked": 0,
            "likes_count": 118
        }"#;

        let wallpaper: Wallpaper = serde_json::from_str(json).expect("parse wallpaper");
        assert!(wallpaper.premium());
        assert!(wallpaper.favorited());
        assert!(!wallpaper.liked());
        assert_eq!(wallpaper.user_id, None);
        assert_eq!(wallpaper.likes_count, 118);
    }

    #[test]
    fn test_sparse_wallpaper_still_parses() {
        // List endpoints omit caller flags when no one is logged in.
        let json = r#"{"id": 4, "title": "Neon Alley", "image_url": "https://cdn.wallcove.app/w/4.jpg"}"#;
        let wallpaper: Wallpaper = serde_json::from_str(json).expect("parse sparse wallpaper");
        assert!(!wallpaper.favorited());
        assert!(!wallpaper.liked());
        assert_eq!(wallpaper.views, 0);
    }

    #[test]
    fn test_pagination_has_more() {
        let pagination = Pagination {
            current_page: 1,
            per_page: 10,
            total: 142,
            total_pages: 15,
        };
        assert!(pagination.has_more());

        let last = Pagination {
            current_page: 15,
            per_page: 10,
            total: 142,
            total_pages: 15,
        };
        assert!(!last.has_more());
    }
}
