pub mod avatar;
pub mod photo;
pub mod profile;

pub use avatar::AvatarSize;
pub use photo::{Photo, PhotoSize};
pub use profile::Profile;
