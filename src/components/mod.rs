pub mod app_router;
pub mod component;
pub mod help_page;
pub mod uploader_page;
pub mod widgets;
