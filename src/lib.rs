//! Cache-aside catalogue of news articles, topics and tags.
//!
//! The relational store is the source of truth. [`application::coordinator::Coordinator`]
//! keeps a field-mapped cache in step with it: reads are answered from the cache and
//! rebuilt from the store on a miss, writes evict or invalidate what they touch.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
