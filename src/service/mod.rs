//! Business logic services.

pub mod cart;
pub mod face;
pub mod jwt;
pub mod payment;
pub mod photo;
pub mod storage;
pub mod transaction;
pub mod user;

pub use cart::CartService;
pub use face::FaceService;
pub use jwt::JwtService;
pub use payment::PaymentGateway;
pub use photo::PhotoService;
pub use storage::StorageService;
pub use transaction::TransactionService;
pub use user::UserService;
