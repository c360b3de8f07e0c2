// Configuration modules

pub mod special_users;

pub use special_users::{parse_email_list, SpecialUsersConfig};
