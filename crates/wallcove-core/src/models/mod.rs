//! Data models for wallcove entities.
//!
//! This module contains the wire types shared by the client and the shells:
//!
//! - `Wallpaper`, `WallpaperPage`, `Pagination`: feed content and paging
//! - `Comment`: per-wallpaper comments
//! - `Category`: browse taxonomy (camelCase wire fields)
//! - `UserProfile`, `UpdateUserRequest`, `LoginResponse`: account data
//! - `Ack`: the status/message envelope mutation endpoints reply with
//!
//! With the `ts` feature enabled, display models derive `ts_rs::TS` so the
//! TypeScript shells consume the same shapes.

pub mod category;
pub mod user;
pub mod wallpaper;

pub use category::Category;
pub use user::{LoginResponse, UpdateUserRequest, UserProfile};
pub use wallpaper::{Ack, Comment, Pagination, Wallpaper, WallpaperPage};
