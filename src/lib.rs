//! The library code for the `statik` static site generator. A build is
//! three steps:
//!
//! 1. Loading global data: hashing assets ([`crate::assets`]), loading
//!    stylesheets ([`crate::data`]) and parsing posts ([`crate::parser`])
//!    into a [`crate::data::SiteData`]
//! 2. Rendering every page template ([`crate::pages`]) against that data
//!    into a tree of [`crate::node::Node`]s, then into HTML
//!    ([`crate::render`])
//! 3. Writing the pages to the output directory ([`crate::write`])
//!
//! [`crate::build::build_site`] runs all three. Templates are plain Rust
//! types implementing [`crate::template::Template`], registered in
//! [`crate::pages::registry`]; the building blocks they share live in
//! [`crate::components`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod assets;
pub mod build;
pub mod components;
pub mod config;
pub mod data;
pub mod dates;
pub mod feed;
pub mod hash;
pub mod markdown;
pub mod node;
pub mod pages;
pub mod parser;
pub mod post;
pub mod related;
pub mod render;
pub mod serve;
pub mod tag;
pub mod template;
pub mod write;
