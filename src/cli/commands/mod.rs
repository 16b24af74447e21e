pub mod db;
pub mod tokens;
pub mod users;
