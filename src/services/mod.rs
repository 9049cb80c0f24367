pub mod books;
pub mod rating;
pub mod reviews;
pub mod users;

pub use books::BookService;
pub use rating::RatingAggregator;
pub use reviews::ReviewService;
pub use users::UserService;
