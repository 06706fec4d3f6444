mod common;
mod post;
mod rider;
mod timeline;
