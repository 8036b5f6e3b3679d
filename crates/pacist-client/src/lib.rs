// lib.rs -- the pacist client: connect, play, receive, render

pub mod cl_input;
pub mod cl_main;
pub mod cl_parse;
pub mod cl_scrn;
pub mod client;

pub use client::ClientSession;
