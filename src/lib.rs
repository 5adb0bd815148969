pub mod archive;
pub mod catalog;
pub mod closure;
pub mod commands;
pub mod download;
pub mod error;
pub mod html;
pub mod http;
pub mod install;
pub mod manifest;
pub mod runtime;
