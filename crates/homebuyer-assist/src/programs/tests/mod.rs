mod catalog;
mod common;
mod search;
