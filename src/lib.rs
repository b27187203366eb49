pub mod classify;
pub mod config;
pub mod documents;
pub mod feed;
pub mod gender;
pub mod group;
pub mod http_client;
pub mod leaderboard;
pub mod participant;
pub mod podium;
pub mod provider;
pub mod publish;
pub mod rank;
pub mod state;
