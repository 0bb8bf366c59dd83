use serde::{Deserialize, Serialize};

/// A wallpaper category.
///
/// Unlike the wallpaper endpoints, the category endpoints use camelCase
/// field names, so this struct carries per-field renames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "wallpaperCount", default)]
    pub wallpaper_count: Option<i64>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_fields() {
        let json = r#"{
            "id": 3,
            "name": "Nature",
            "description": "Forests, peaks, and coastlines",
            "imageUrl": "https://cdn.wallcove.app/c/3.jpg",
            "icon": "leaf",
            "wallpaperCount": 58,
            "createdAt": "2025-06-14T08:00:00Z",
            "updatedAt": "2025-12-01T10:30:00Z"
        }"#;

        let category: Category = serde_json::from_str(json).expect("parse category");
        assert_eq!(category.name, "Nature");
        assert_eq!(category.image_url.as_deref(), Some("https://cdn.wallcove.app/c/3.jpg"));
        assert_eq!(category.wallpaper_count, Some(58));
    }

    #[test]
    fn test_parse_minimal_category() {
        let json = r#"{"id": 9, "name": "Abstract", "icon": "shapes"}"#;
        let category: Category = serde_json::from_str(json).expect("parse minimal category");
        assert_eq!(category.wallpaper_count, None);
        assert_eq!(category.image_url, None);
    }
}
