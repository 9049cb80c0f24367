pub mod book;
pub mod pagination;
pub mod review;
pub mod user;

pub use book::{Book, BookChanges, BookView, Genre, NewBook};
pub use pagination::{PageInfo, Paginated};
pub use review::{NewReview, Review, ReviewChanges, ReviewView};
pub use user::{NewUser, User, UserRef};
