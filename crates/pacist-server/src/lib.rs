// lib.rs -- the pacist session server
//
// The server accepts connection requests on a well-known registration FIFO,
// admits up to max_games concurrent sessions through a slot-gated queue, and
// runs each session on a dedicated worker with its own authoritative world.

pub mod server;
pub mod sv_game;
pub mod sv_init;
pub mod sv_main;
pub mod sv_queue;
pub mod sv_report;
pub mod sv_send;
pub mod sv_session;
pub mod sv_user;
