//! Data models and request/response structures.

pub mod auth;
pub mod cart;
pub mod face;
pub mod photo;
pub mod transaction;
pub mod user;

pub use auth::{AccessTokenClaims, AuthSession, RefreshTokenClaims, TokenPair, UserContext};
pub use cart::{AddCartItemRequest, Cart, CartItem};
pub use face::{FaceDescriptor, FaceMatch, MatchRequest, MatchResponse, RegisterDescriptorRequest};
pub use photo::{CreatePhotoRequest, ListPhotosQuery, Photo, PhotoPage, SellStatus, UpdatePhotoRequest};
pub use transaction::{
    CreateTransactionRequest, ListTransactionsQuery, PaymentNotification, Transaction,
    TransactionPage, TransactionRole, TransactionStatus,
};
pub use user::{
    AddAccountRequest, BankAccount, ChangePasswordRequest, LoginRequest, LogoutRequest,
    PublicProfile, RefreshTokenRequest, RegisterRequest, UpdateAccountRequest,
    UpdateProfileRequest, UserProfile, WithdrawalRequest, WithdrawalResponse,
};
